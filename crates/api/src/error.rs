//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use orders::OrderError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// No verified identity accompanied the request.
    Unauthorized(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Failure from the order engine.
    Order(OrderError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Order(err) => order_error_to_response(err),
        };

        let body = serde_json::json!({ "message": message });
        (status, axum::Json(body)).into_response()
    }
}

fn order_error_to_response(err: OrderError) -> (StatusCode, String) {
    match &err {
        OrderError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        OrderError::ItemsUnavailable => (StatusCode::NOT_FOUND, err.to_string()),
        OrderError::InsufficientStock { .. } => (StatusCode::CONFLICT, err.to_string()),
        // Transient contention: the client may retry with backoff.
        OrderError::LockTimeout => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
        OrderError::Persistence(inner) => {
            tracing::error!(error = %inner, "order placement hit a storage failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Unable to create order at this time.".to_string(),
            )
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        ApiError::Order(err)
    }
}
