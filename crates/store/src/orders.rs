//! Order ledger operations.
//!
//! Orders and their lines are written exactly once, inside the placement
//! transaction. Nothing here updates a committed row; status transitions
//! are owned by fulfillment and out of scope for the order engine.

use chrono::{DateTime, Utc};
use common::{ItemId, OrderId, OrderStatus, UserId};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};

use crate::error::{Result, StoreError};

/// A committed order row.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRow {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub customer_name: Option<String>,
    pub customer_email: String,
    pub notes: Option<String>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Fields of an order about to be written.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<UserId>,
    pub customer_name: Option<String>,
    pub customer_email: String,
    pub notes: Option<String>,
    pub total_amount: Decimal,
}

/// A line item to persist alongside its parent order.
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub item_id: ItemId,
    pub quantity: i32,
    /// Unit price captured at order time, decoupled from later catalog
    /// price changes.
    pub unit_price: Decimal,
}

/// A persisted order line.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLineRow {
    pub order_id: OrderId,
    pub item_id: ItemId,
    pub quantity: i32,
    pub unit_price: Decimal,
}

fn row_to_order(row: PgRow) -> Result<OrderRow> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<OrderStatus>()
        .map_err(|e| StoreError::InvalidRow(e.to_string()))?;

    Ok(OrderRow {
        id: OrderId::new(row.try_get("id")?),
        user_id: row.try_get::<Option<i64>, _>("user_id")?.map(UserId::new),
        customer_name: row.try_get("customer_name")?,
        customer_email: row.try_get("customer_email")?,
        notes: row.try_get("notes")?,
        total_amount: row.try_get("total_amount")?,
        status,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_line(row: PgRow) -> Result<OrderLineRow> {
    Ok(OrderLineRow {
        order_id: OrderId::new(row.try_get("order_id")?),
        item_id: ItemId::new(row.try_get("item_id")?),
        quantity: row.try_get("quantity")?,
        unit_price: row.try_get("unit_price")?,
    })
}

/// Inserts the order row with status `pending` and returns it with its
/// generated id.
pub async fn insert_order(conn: &mut PgConnection, order: &NewOrder) -> Result<OrderRow> {
    let row = sqlx::query(
        r#"
        INSERT INTO orders (user_id, customer_name, customer_email, notes, total_amount, status)
        VALUES ($1, $2, $3, $4, $5, 'pending')
        RETURNING id, user_id, customer_name, customer_email, notes, total_amount, status, created_at
        "#,
    )
    .bind(order.user_id.map(i64::from))
    .bind(&order.customer_name)
    .bind(&order.customer_email)
    .bind(&order.notes)
    .bind(order.total_amount)
    .fetch_one(conn)
    .await?;

    row_to_order(row)
}

/// Inserts one line item under an existing order.
pub async fn insert_line(
    conn: &mut PgConnection,
    order_id: OrderId,
    line: &NewOrderLine,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO order_items (order_id, item_id, quantity, unit_price)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(order_id.as_i64())
    .bind(line.item_id.as_i64())
    .bind(line.quantity)
    .bind(line.unit_price)
    .execute(conn)
    .await?;

    Ok(())
}

/// Fetches a committed order by id.
pub async fn get_order(conn: &mut PgConnection, id: OrderId) -> Result<Option<OrderRow>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, customer_name, customer_email, notes, total_amount, status, created_at
        FROM orders
        WHERE id = $1
        "#,
    )
    .bind(id.as_i64())
    .fetch_optional(conn)
    .await?;

    row.map(row_to_order).transpose()
}

/// Fetches the lines of a committed order in insertion order.
pub async fn lines_for_order(conn: &mut PgConnection, id: OrderId) -> Result<Vec<OrderLineRow>> {
    let rows = sqlx::query(
        r#"
        SELECT order_id, item_id, quantity, unit_price
        FROM order_items
        WHERE order_id = $1
        ORDER BY id
        "#,
    )
    .bind(id.as_i64())
    .fetch_all(conn)
    .await?;

    rows.into_iter().map(row_to_line).collect()
}
