//! Microfinance Loan Ledger
//!
//! Records customers, loans and repayments for a small lending business and
//! derives balances, schedules, overdue status and portfolio figures from
//! them on demand.

pub mod auth;
pub mod config;
pub mod customer;
pub mod db;
pub mod error;
pub mod handlers;
pub mod loan;
pub mod middleware;
pub mod models;
pub mod payment;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

use axum::http::{header, HeaderValue, Method};
use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use config::Config;
use middleware::RateLimiter;
use state::AppState;

/// Assemble the full HTTP application with its middleware stack
pub fn build_router(state: AppState, config: &Config, rate_limiter: RateLimiter) -> Router {
    let mut app = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .merge(routes::auth_routes())
        .merge(routes::customer_routes())
        .merge(routes::loan_routes())
        .merge(routes::payment_routes())
        .merge(routes::dashboard_routes())
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::security_headers))
        // Balances change with every payment
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ));

    // Production sits behind TLS
    if config.environment.is_production() {
        app = app.layer(SetResponseHeaderLayer::overriding(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        ));
    }

    app.layer(axum::middleware::from_fn(middleware::request_tracing))
        .layer(axum::middleware::from_fn_with_state(
            rate_limiter,
            middleware::rate_limit,
        ))
        .layer(configure_cors(config.cors_allowed_origins.as_deref()))
}

fn configure_cors(allowed_origins: Option<&str>) -> CorsLayer {
    let allowed_origins = allowed_origins.unwrap_or_default();

    if allowed_origins.trim().is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}
