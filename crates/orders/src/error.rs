//! Order placement error taxonomy.
//!
//! A closed set of variants so callers branch exhaustively instead of
//! inspecting status codes at runtime. Only [`OrderError::LockTimeout`]
//! is worth retrying; the client errors reflect stale or invalid input
//! and the persistence variant is fatal for the request.

use common::ItemId;
use store::StoreError;
use thiserror::Error;

/// Structural failures in an incoming line-item list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The request contained no lines at all.
    #[error("an order must include at least one item")]
    EmptyLines,

    /// An item id was zero or negative.
    #[error("line {index}: item id must be a positive integer (got {item_id})")]
    InvalidItemId { index: usize, item_id: i64 },

    /// A quantity was zero or negative.
    #[error("line {index}: quantity must be a positive integer (got {quantity})")]
    InvalidQuantity { index: usize, quantity: i64 },

    /// A quantity exceeded the per-line cap.
    #[error("line {index}: quantity {quantity} exceeds the per-line maximum of {max}")]
    QuantityAboveCap { index: usize, quantity: i64, max: i64 },
}

/// Errors that can occur while placing an order.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The request was malformed before any transaction opened.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A referenced item no longer exists in the catalog.
    #[error("one or more items are no longer available")]
    ItemsUnavailable,

    /// A line asked for more units than the locked row holds.
    #[error("not enough stock for {name}; available: {available}")]
    InsufficientStock {
        item_id: ItemId,
        name: String,
        requested: u32,
        available: i64,
    },

    /// Transient lock contention; safe to retry with backoff.
    #[error("timed out waiting for an inventory lock")]
    LockTimeout,

    /// Unexpected storage failure after all checks passed.
    #[error("storage failure while placing the order: {0}")]
    Persistence(StoreError),
}

impl From<StoreError> for OrderError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::LockTimeout => OrderError::LockTimeout,
            other => OrderError::Persistence(other),
        }
    }
}
