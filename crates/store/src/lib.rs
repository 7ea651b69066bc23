//! PostgreSQL data access for the parts order backend.
//!
//! Exposes the two tables the order engine touches, inventory rows with
//! row-level locking and the append-style order ledger, plus the scoped
//! transaction both are mutated under.

pub mod error;
pub mod items;
pub mod orders;
pub mod tx;

use std::time::Duration;

use sqlx::PgPool;

pub use error::{Result, StoreError};
pub use items::{ItemRow, NewItem};
pub use orders::{NewOrder, NewOrderLine, OrderLineRow, OrderRow};
pub use tx::PgTx;

/// Handle to the backing database.
#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    /// Creates a store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Begins a scoped transaction with the given lock-wait bound.
    pub async fn begin(&self, lock_timeout: Duration) -> Result<PgTx> {
        tx::begin_with_lock_timeout(&self.pool, lock_timeout).await
    }
}
