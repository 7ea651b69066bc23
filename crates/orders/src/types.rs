//! Request and result types for order placement.

use common::{ItemId, UserId};
use rust_decimal::Decimal;
use serde::Deserialize;
use store::OrderRow;

/// One raw (item, quantity) pair as received from the boundary.
///
/// Fields are wide integers on purpose: the validator, not the
/// deserializer, decides what is out of range.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRequest {
    pub item_id: i64,
    pub quantity: i64,
}

/// A validated, normalized order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLine {
    pub item_id: ItemId,
    pub quantity: u32,
}

/// Everything needed to place an order for an authenticated buyer.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub user_id: UserId,
    pub customer_name: Option<String>,
    /// Already lower-cased by the boundary.
    pub customer_email: String,
    pub notes: Option<String>,
    pub lines: Vec<OrderLine>,
}

/// A line as actually committed: quantity plus the snapshot price and
/// the item name for downstream formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct RealizedLine {
    pub item_id: ItemId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// The committed order and its realized lines.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: OrderRow,
    pub lines: Vec<RealizedLine>,
}
