//! Scoped transactions.
//!
//! Every order placement runs inside one of these: acquire a connection
//! from the pool, begin, bound the lock wait, and guarantee rollback on
//! any exit path that did not reach [`sqlx::Transaction::commit`].
//! Dropping the transaction rolls it back.

use std::time::Duration;

use sqlx::{PgPool, Postgres, Transaction};

use crate::error::Result;

/// A transaction scoped to one order placement.
pub type PgTx = Transaction<'static, Postgres>;

/// Begins a transaction with a bounded lock wait.
///
/// `SET LOCAL` scopes the timeout to this transaction only, so lock waits
/// on `SELECT ... FOR UPDATE` surface as a typed, retryable error instead
/// of blocking indefinitely. The value is interpolated because Postgres
/// does not accept bind parameters in `SET`; it comes from typed
/// configuration, never from request input.
pub async fn begin_with_lock_timeout(pool: &PgPool, lock_timeout: Duration) -> Result<PgTx> {
    let mut tx = pool.begin().await?;

    sqlx::query(&format!(
        "SET LOCAL lock_timeout = '{}ms'",
        lock_timeout.as_millis()
    ))
    .execute(&mut *tx)
    .await?;

    Ok(tx)
}
