//! Dashboard route definitions

use axum::{routing::get, Router};

use crate::handlers::*;
use crate::state::AppState;

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/dashboard/today-collection", get(get_today_collection))
        .route("/api/dashboard/overdue", get(get_overdue_loans))
}
