use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::models::HealthResponse;
use crate::store::LedgerStore;

/// GET /
pub async fn root() -> &'static str {
    "Microfinance Ledger API"
}

/// GET /health - store reachability
pub async fn health_check(
    State(store): State<Arc<dyn LedgerStore>>,
) -> (StatusCode, Json<HealthResponse>) {
    let (status, database) = match store.health_check().await {
        Ok(()) => (StatusCode::OK, "connected".to_string()),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, format!("error: {}", e)),
    };

    let body = HealthResponse {
        status: if status.is_success() { "healthy" } else { "unhealthy" }.to_string(),
        database,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (status, Json(body))
}
