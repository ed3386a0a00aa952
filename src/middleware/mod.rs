//! Middleware for the ledger API
//!
//! This module provides middleware for request tracing, rate limiting,
//! security headers, and the admin session extractor.

pub mod auth;
mod rate_limiter;
mod security;
mod tracing;

use axum::extract::Request;

pub use auth::AdminSession;
pub use rate_limiter::{rate_limit, RateLimiter};
pub use security::security_headers;
pub use tracing::request_tracing;

/// Client address from proxy headers, if any
pub(crate) fn client_ip(request: &Request) -> Option<String> {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    forwarded.or_else(|| {
        request
            .headers()
            .get("x-real-ip")
            .and_then(|h| h.to_str().ok())
            .map(|s| s.trim().to_string())
    })
}
