//! The reservation transaction coordinator.
//!
//! `place_order` runs the whole lock-validate-price-write-decrement
//! sequence as one transaction. Concurrent orders for the same item
//! serialize on the row lock, so the second buyer always observes the
//! first buyer's decrement. Every failure path drops the transaction,
//! which rolls it back; nothing partial is ever visible outside.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use store::{NewOrder, NewOrderLine, Store, items, orders};

use crate::error::{OrderError, ValidationError};
use crate::types::{PlaceOrder, PlacedOrder, RealizedLine};

/// Default bound on how long a placement waits for contended item rows.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Service that places orders against the catalog and the order ledger.
///
/// Stateless between calls; each invocation is an independent
/// transaction. Cloning shares the underlying pool.
#[derive(Clone)]
pub struct OrderService {
    store: Store,
    lock_timeout: Duration,
}

impl OrderService {
    /// Creates an order service with the default lock-wait bound.
    pub fn new(store: Store) -> Self {
        Self::with_lock_timeout(store, DEFAULT_LOCK_TIMEOUT)
    }

    /// Creates an order service with an explicit lock-wait bound.
    pub fn with_lock_timeout(store: Store, lock_timeout: Duration) -> Self {
        Self {
            store,
            lock_timeout,
        }
    }

    /// Atomically reserves inventory and commits an order.
    ///
    /// On success each referenced item's stock has decreased by exactly
    /// the requested quantity and the order total is the exact sum of
    /// captured unit price × quantity. On any error the transaction is
    /// rolled back in full and a typed variant propagates; the caller
    /// decides whether to retry ([`OrderError::LockTimeout`]) or surface
    /// the failure.
    #[tracing::instrument(
        skip(self, cmd),
        fields(user_id = %cmd.user_id, line_count = cmd.lines.len())
    )]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<PlacedOrder, OrderError> {
        let started = Instant::now();

        let result = self.run_placement(cmd).await;
        match &result {
            Ok(placed) => {
                metrics::counter!("orders_placed_total").increment(1);
                metrics::histogram!("order_placement_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                tracing::info!(
                    order_id = %placed.order.id,
                    total = %placed.order.total_amount,
                    "order committed"
                );
            }
            Err(err) => {
                metrics::counter!("orders_failed_total").increment(1);
                tracing::warn!(error = %err, "order placement failed");
            }
        }

        result
    }

    async fn run_placement(&self, cmd: PlaceOrder) -> Result<PlacedOrder, OrderError> {
        let PlaceOrder {
            user_id,
            customer_name,
            customer_email,
            notes,
            lines,
        } = cmd;

        // Defense in depth: the validator already rejects this, but an
        // empty order must never open a transaction.
        if lines.is_empty() {
            return Err(ValidationError::EmptyLines.into());
        }

        let mut tx = self.store.begin(self.lock_timeout).await?;

        // Lock each distinct row exactly once, in ascending id order, so
        // overlapping orders contend in the same sequence.
        let mut distinct_ids: Vec<_> = lines.iter().map(|l| l.item_id).collect();
        distinct_ids.sort_unstable();
        distinct_ids.dedup();

        let rows = items::lock_for_update(&mut tx, &distinct_ids).await?;

        // Existence invariant: every distinct requested id produced a
        // locked row. A shorter result means something was deleted.
        if rows.len() != distinct_ids.len() {
            return Err(OrderError::ItemsUnavailable);
        }

        let rows_by_id: HashMap<_, _> = rows.iter().map(|row| (row.id, row)).collect();

        // Stock and price are read only now, under the lock; a pre-lock
        // read would be stale under concurrency. Lines keep their request
        // order, duplicates stay independent.
        let mut realized = Vec::with_capacity(lines.len());
        for line in &lines {
            let row = rows_by_id
                .get(&line.item_id)
                .ok_or(OrderError::ItemsUnavailable)?;

            if row.stock < i64::from(line.quantity) {
                return Err(OrderError::InsufficientStock {
                    item_id: row.id,
                    name: row.name.clone(),
                    requested: line.quantity,
                    available: row.stock,
                });
            }

            let unit_price = match row.price {
                Some(price) => price,
                None => {
                    tracing::debug!(item_id = %row.id, "ordering unpriced item at zero cost");
                    Decimal::ZERO
                }
            };

            realized.push(RealizedLine {
                item_id: row.id,
                name: row.name.clone(),
                quantity: line.quantity,
                unit_price,
            });
        }

        let total_amount = order_total(&realized);

        let order = orders::insert_order(
            &mut tx,
            &NewOrder {
                user_id: Some(user_id),
                customer_name,
                customer_email,
                notes,
                total_amount,
            },
        )
        .await?;

        for line in &realized {
            orders::insert_line(
                &mut tx,
                order.id,
                &NewOrderLine {
                    item_id: line.item_id,
                    quantity: line.quantity as i32,
                    unit_price: line.unit_price,
                },
            )
            .await?;

            items::decrement_stock(&mut tx, line.item_id, line.quantity as i32).await?;
        }

        tx.commit().await.map_err(store::StoreError::from)?;

        Ok(PlacedOrder {
            order,
            lines: realized,
        })
    }
}

/// Exact sum of unit price × quantity over the realized lines.
fn order_total(lines: &[RealizedLine]) -> Decimal {
    lines
        .iter()
        .map(|line| line.unit_price * Decimal::from(line.quantity))
        .sum()
}
