//! Order placement endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{ItemId, OrderStatus};
use notify::{ConfirmationLine, ConfirmationSender, Dispatcher, OrderConfirmation};
use orders::{LineRequest, OrderError, OrderService, PlaceOrder, PlacedOrder};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use store::Store;

use crate::auth::Identity;
use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S> {
    pub store: Store,
    pub order_service: OrderService,
    pub dispatcher: Dispatcher<S>,
}

// Customer-field bounds, matching what the storefront promises.
const MIN_NAME_CHARS: usize = 2;
const MAX_NAME_CHARS: usize = 120;
const MAX_NOTES_CHARS: usize = 1000;

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub lines: Vec<LineRequest>,
}

// -- Response types --

#[derive(Serialize)]
pub struct CreateOrderResponse {
    pub order: OrderBody,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBody {
    pub id: i64,
    pub customer_name: Option<String>,
    pub customer_email: String,
    pub notes: Option<String>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<LineBody>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineBody {
    pub item_id: ItemId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl OrderBody {
    fn from_placed(placed: &PlacedOrder) -> Self {
        Self {
            id: placed.order.id.as_i64(),
            customer_name: placed.order.customer_name.clone(),
            customer_email: placed.order.customer_email.clone(),
            notes: placed.order.notes.clone(),
            total_amount: placed.order.total_amount,
            status: placed.order.status,
            created_at: placed.order.created_at,
            lines: placed
                .lines
                .iter()
                .map(|line| LineBody {
                    item_id: line.item_id,
                    name: line.name.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                })
                .collect(),
        }
    }
}

// -- Handlers --

/// POST /orders — place an order for the authenticated customer.
#[tracing::instrument(skip(state, identity, req), fields(user_id = %identity.user_id))]
pub async fn create<S: ConfirmationSender + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), ApiError> {
    let customer_name = normalize_name(req.customer_name)?;
    let notes = normalize_notes(req.notes)?;
    let customer_email = normalize_email(req.customer_email, &identity.email)?;

    let lines = orders::validate_lines(&req.lines)
        .map_err(|e| ApiError::from(OrderError::from(e)))?;

    let placed = state
        .order_service
        .place_order(PlaceOrder {
            user_id: identity.user_id,
            customer_name,
            customer_email,
            notes,
            lines,
        })
        .await?;

    // Post-commit and best-effort: the dispatcher absorbs any delivery
    // failure, so a committed order never reports as failed here.
    state.dispatcher.dispatch(&confirmation_of(&placed)).await;

    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            order: OrderBody::from_placed(&placed),
        }),
    ))
}

fn confirmation_of(placed: &PlacedOrder) -> OrderConfirmation {
    OrderConfirmation {
        order_id: placed.order.id,
        customer_name: placed.order.customer_name.clone(),
        customer_email: placed.order.customer_email.clone(),
        notes: placed.order.notes.clone(),
        total_amount: placed.order.total_amount,
        lines: placed
            .lines
            .iter()
            .map(|line| ConfirmationLine {
                name: line.name.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
            })
            .collect(),
    }
}

// -- Field normalization --

fn normalize_name(raw: Option<String>) -> Result<Option<String>, ApiError> {
    match raw {
        None => Ok(None),
        Some(name) => {
            let name = name.trim();
            let chars = name.chars().count();
            if chars < MIN_NAME_CHARS || chars > MAX_NAME_CHARS {
                return Err(ApiError::BadRequest(format!(
                    "customerName must be between {MIN_NAME_CHARS} and {MAX_NAME_CHARS} characters"
                )));
            }
            Ok(Some(name.to_string()))
        }
    }
}

fn normalize_notes(raw: Option<String>) -> Result<Option<String>, ApiError> {
    match raw {
        None => Ok(None),
        Some(notes) => {
            let notes = notes.trim();
            if notes.chars().count() > MAX_NOTES_CHARS {
                return Err(ApiError::BadRequest(format!(
                    "notes must be at most {MAX_NOTES_CHARS} characters"
                )));
            }
            if notes.is_empty() {
                return Ok(None);
            }
            Ok(Some(notes.to_string()))
        }
    }
}

/// The effective address is the request override when given, otherwise
/// the verified identity's email; either way it is persisted lower-cased.
fn normalize_email(raw: Option<String>, identity_email: &str) -> Result<String, ApiError> {
    let email = match &raw {
        Some(email) => email.trim(),
        None => identity_email.trim(),
    };

    if !is_plausible_email(email) {
        return Err(ApiError::BadRequest(
            "customerEmail must be a valid email address".to_string(),
        ));
    }

    Ok(email.to_lowercase())
}

fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain.contains('.')
        && !email.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_trimmed_and_bounded() {
        assert_eq!(
            normalize_name(Some("  Dana Fixit  ".to_string())).unwrap(),
            Some("Dana Fixit".to_string())
        );
        assert!(normalize_name(Some("D".to_string())).is_err());
        assert!(normalize_name(Some("x".repeat(121))).is_err());
        assert_eq!(normalize_name(None).unwrap(), None);
    }

    #[test]
    fn notes_collapse_to_none_when_blank() {
        assert_eq!(normalize_notes(Some("   ".to_string())).unwrap(), None);
        assert!(normalize_notes(Some("x".repeat(1001))).is_err());
    }

    #[test]
    fn email_falls_back_to_identity_and_lowercases() {
        let email = normalize_email(None, "Dana@Example.COM").unwrap();
        assert_eq!(email, "dana@example.com");

        let overridden =
            normalize_email(Some("Billing@Shop.example".to_string()), "dana@example.com").unwrap();
        assert_eq!(overridden, "billing@shop.example");
    }

    #[test]
    fn implausible_emails_are_rejected() {
        for bad in ["", "nope", "@example.com", "a@", "a@nodot", "a b@example.com"] {
            assert!(
                normalize_email(Some(bad.to_string()), "dana@example.com").is_err(),
                "accepted {bad:?}"
            );
        }
    }
}
