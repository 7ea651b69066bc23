//! Structural validation of incoming line-item lists.
//!
//! Pure; runs before any transaction opens so malformed requests never
//! touch the database.

use common::ItemId;

use crate::error::ValidationError;
use crate::types::{LineRequest, OrderLine};

/// Maximum quantity a single line may request.
pub const MAX_QUANTITY_PER_LINE: i64 = 99;

/// Validates a raw line-item list and normalizes it.
///
/// Fails when the list is empty, any item id is not positive, or any
/// quantity is outside `1..=`[`MAX_QUANTITY_PER_LINE`]. Line order is
/// preserved and duplicate item ids are left as independent lines.
pub fn validate_lines(lines: &[LineRequest]) -> Result<Vec<OrderLine>, ValidationError> {
    if lines.is_empty() {
        return Err(ValidationError::EmptyLines);
    }

    lines
        .iter()
        .enumerate()
        .map(|(index, line)| {
            if line.item_id <= 0 {
                return Err(ValidationError::InvalidItemId {
                    index,
                    item_id: line.item_id,
                });
            }
            if line.quantity <= 0 {
                return Err(ValidationError::InvalidQuantity {
                    index,
                    quantity: line.quantity,
                });
            }
            if line.quantity > MAX_QUANTITY_PER_LINE {
                return Err(ValidationError::QuantityAboveCap {
                    index,
                    quantity: line.quantity,
                    max: MAX_QUANTITY_PER_LINE,
                });
            }

            Ok(OrderLine {
                item_id: ItemId::new(line.item_id),
                quantity: line.quantity as u32,
            })
        })
        .collect()
}
