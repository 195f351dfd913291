//! Middleware for Web API.

pub mod auth;
pub mod request_log;

pub use auth::{require_token, validate_token, TokenState};
pub use request_log::log_requests;
