//! Storage error types.

use thiserror::Error;

/// Errors that can occur in the storage layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A row lock could not be acquired within the configured wait,
    /// or the transaction was chosen as a deadlock victim. Retryable.
    #[error("timed out waiting for an inventory row lock")]
    LockTimeout,

    /// Any other database failure.
    #[error("database error: {0}")]
    Database(sqlx::Error),

    /// A stored row held data the application cannot interpret.
    #[error("invalid row data: {0}")]
    InvalidRow(String),

    /// Running the embedded migrations failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

// Postgres reports an exceeded `lock_timeout` as 55P03 (lock_not_available)
// and a deadlock victim as 40P01 (deadlock_detected). Both are transient
// contention, so both surface as `LockTimeout`.
impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && let Some(code) = db_err.code()
            && (code == "55P03" || code == "40P01")
        {
            return StoreError::LockTimeout;
        }
        StoreError::Database(e)
    }
}

/// Convenience result alias for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;
