//! Plain-text rendering of order confirmations.

use common::OrderId;
use rust_decimal::Decimal;

use crate::OrderConfirmation;

/// Subject line for a confirmation message.
pub fn subject(order_id: OrderId) -> String {
    format!("Parts order confirmation (#{order_id})")
}

/// Renders the confirmation body.
///
/// Contains everything the customer needs: one line per item with the
/// snapshot unit price, the total, and any notes they attached.
pub fn body(confirmation: &OrderConfirmation) -> String {
    let greeting = match &confirmation.customer_name {
        Some(name) => format!("Hi {name},"),
        None => "Hello,".to_string(),
    };

    let lines = confirmation
        .lines
        .iter()
        .map(|line| {
            format!(
                "- {} x{} @ {}",
                line.name,
                line.quantity,
                currency(line.unit_price)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let notes = match &confirmation.notes {
        Some(notes) => format!("\nNotes: {notes}\n"),
        None => String::new(),
    };

    format!(
        "{greeting}\n\n\
         Thank you for your order. Here are the details:\n\n\
         {lines}\n\n\
         Total: {total}\n\
         {notes}\n\
         We will contact you shortly to confirm fulfillment details.\n\n\
         The Parts Team",
        total = currency(confirmation.total_amount),
    )
}

fn currency(value: Decimal) -> String {
    format!("${value:.2}")
}
