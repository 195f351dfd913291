//! Bearer token authentication middleware.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::sync::Arc;

use crate::web::error::ApiError;
use crate::OzimaError;

/// Shared secret every protected request must present.
#[derive(Clone)]
pub struct TokenState {
    token: String,
}

impl TokenState {
    /// Create a token state from the configured API token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Check a presented token against the configured one.
    pub fn verify(&self, presented: &str) -> bool {
        validate_token(presented, &self.token)
    }
}

impl std::fmt::Debug for TokenState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenState").finish_non_exhaustive()
    }
}

/// Compare two tokens in constant time with respect to their content.
pub fn validate_token(received: &str, expected: &str) -> bool {
    if received.len() != expected.len() {
        return false;
    }
    let mut diff = 0u8;
    for (a, b) in received.bytes().zip(expected.bytes()) {
        diff |= a ^ b;
    }
    diff == 0
}

/// Middleware rejecting requests without the configured bearer token.
///
/// Runs before any handler, so a rejected request never reaches the
/// filesystem.
pub async fn require_token(
    State(state): State<Arc<TokenState>>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        tracing::warn!(
            method = %request.method(),
            path = %request.uri().path(),
            "Request without bearer token"
        );
        return Err(OzimaError::Auth("Missing authorization".to_string()).into());
    };

    if !state.verify(bearer.token()) {
        tracing::warn!(
            method = %request.method(),
            path = %request.uri().path(),
            "Invalid token attempt"
        );
        return Err(OzimaError::Auth("Invalid authentication token".to_string()).into());
    }

    Ok(next.run(request).await)
}
