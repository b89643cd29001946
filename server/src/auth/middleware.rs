//! Authentication extractor.
//!
//! Every cart route needs a Bearer token. The token is issued by the hosted
//! identity service and is used here as the opaque owner key of the cart.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::AppError;
use crate::AppState;

/// Authenticated cart owner extracted from the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Cart owner key
    pub owner: String,
}

/// Parse an `Authorization` header value into the bearer token.
pub fn bearer_token(header: Option<&str>) -> Result<String, AppError> {
    let header = header.ok_or(AppError::Unauthorized)?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized)?
        .trim();

    if token.is_empty() {
        return Err(AppError::Unauthorized);
    }

    Ok(token.to_string())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let owner = bearer_token(header).inspect_err(|_| {
            tracing::debug!(path = %parts.uri.path(), "rejected request without valid bearer token");
        })?;

        Ok(AuthUser { owner })
    }
}
