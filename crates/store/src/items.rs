//! Inventory row operations.
//!
//! The order engine touches the `items` table in exactly two ways: a
//! locked read of the rows an order references, and a stock decrement on
//! rows it already holds locks for. Catalog writes beyond that belong to
//! the catalog service; `insert` exists for seeding and tests.

use common::ItemId;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};

use crate::error::Result;

/// An inventory row as seen by the order engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRow {
    pub id: ItemId,
    pub name: String,
    /// `None` means the catalog has not priced the item yet.
    pub price: Option<Decimal>,
    pub stock: i64,
}

/// A new catalog item, used when seeding inventory.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: i64,
    pub category_id: Option<i64>,
}

fn row_to_item(row: PgRow) -> Result<ItemRow> {
    Ok(ItemRow {
        id: ItemId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        price: row.try_get("price")?,
        stock: row.try_get("stock")?,
    })
}

/// Fetches the rows for the given item ids, acquiring an exclusive row
/// lock on each.
///
/// Rows are locked in ascending id order so that two orders with
/// overlapping item sets always contend in the same sequence instead of
/// deadlocking. Ids that do not exist are simply absent from the result;
/// the caller compares counts to detect them.
pub async fn lock_for_update(conn: &mut PgConnection, ids: &[ItemId]) -> Result<Vec<ItemRow>> {
    let raw_ids: Vec<i64> = ids.iter().map(|id| id.as_i64()).collect();
    tracing::debug!(count = raw_ids.len(), "locking inventory rows");

    let rows = sqlx::query(
        r#"
        SELECT id, name, price, stock
        FROM items
        WHERE id = ANY($1)
        ORDER BY id
        FOR UPDATE
        "#,
    )
    .bind(&raw_ids)
    .fetch_all(conn)
    .await?;

    rows.into_iter().map(row_to_item).collect()
}

/// Decrements an item's stock by `quantity`.
///
/// Must only be called on a row the current transaction has locked via
/// [`lock_for_update`]; the table's non-negative stock constraint is a
/// backstop, not a control path.
pub async fn decrement_stock(conn: &mut PgConnection, id: ItemId, quantity: i32) -> Result<()> {
    sqlx::query("UPDATE items SET stock = stock - $1, updated_at = NOW() WHERE id = $2")
        .bind(i64::from(quantity))
        .bind(id.as_i64())
        .execute(conn)
        .await?;

    Ok(())
}

/// Inserts a catalog item and returns the stored row.
pub async fn insert(conn: &mut PgConnection, item: &NewItem) -> Result<ItemRow> {
    let row = sqlx::query(
        r#"
        INSERT INTO items (name, description, price, stock, category_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, name, price, stock
        "#,
    )
    .bind(&item.name)
    .bind(&item.description)
    .bind(item.price)
    .bind(item.stock)
    .bind(item.category_id)
    .fetch_one(conn)
    .await?;

    row_to_item(row)
}

/// Fetches a single item row without locking it.
pub async fn get(conn: &mut PgConnection, id: ItemId) -> Result<Option<ItemRow>> {
    let row = sqlx::query("SELECT id, name, price, stock FROM items WHERE id = $1")
        .bind(id.as_i64())
        .fetch_optional(conn)
        .await?;

    row.map(row_to_item).transpose()
}
