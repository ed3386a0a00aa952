//! Loan route definitions

use axum::{routing::get, Router};

use crate::handlers::*;
use crate::state::AppState;

pub fn loan_routes() -> Router<AppState> {
    Router::new()
        .route("/api/loans", get(list_loans).post(create_loan))
        .route("/api/loans/:id", get(get_loan))
        .route("/api/loans/:id/summary", get(get_loan_summary))
}
