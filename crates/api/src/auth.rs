//! Verified identity consumed from the upstream authenticator.
//!
//! Token issuance and validation live in front of this service; by the
//! time a request arrives here the gateway has already verified it and
//! attached the identity as trusted headers. The order engine never
//! re-verifies; it only requires that an identity is present.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::UserId;

use crate::error::ApiError;

/// The identity attached to an authenticated request.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: UserId,
    pub email: String,
    pub role: String,
}

const USER_ID_HEADER: &str = "x-user-id";
const EMAIL_HEADER: &str = "x-user-email";
const ROLE_HEADER: &str = "x-user-role";

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|value| value.to_str().ok())
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header(parts, USER_ID_HEADER)
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|id| *id > 0)
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

        let email = header(parts, EMAIL_HEADER)
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

        let role = header(parts, ROLE_HEADER).unwrap_or("customer");

        Ok(Identity {
            user_id: UserId::new(user_id),
            email: email.to_string(),
            role: role.to_string(),
        })
    }
}
