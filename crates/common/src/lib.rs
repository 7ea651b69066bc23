//! Shared types for the parts order backend.

pub mod types;

pub use types::{ItemId, OrderId, OrderStatus, UserId};
