//! Order creation and inventory reservation engine.
//!
//! This crate is the transactional core of the parts order backend:
//! - [`validator::validate_lines`] normalizes an incoming line-item list
//! - [`OrderService::place_order`] locks the referenced inventory rows,
//!   validates stock, prices the order from the locked rows, writes the
//!   order and its lines, and decrements stock as one atomic unit
//! - [`OrderError`] is the closed failure taxonomy the boundary maps to
//!   transport-level outcomes

pub mod error;
pub mod service;
pub mod types;
pub mod validator;

pub use error::{OrderError, ValidationError};
pub use service::{DEFAULT_LOCK_TIMEOUT, OrderService};
pub use types::{LineRequest, OrderLine, PlaceOrder, PlacedOrder, RealizedLine};
pub use validator::{MAX_QUANTITY_PER_LINE, validate_lines};
