//! Customer route definitions

use axum::{routing::get, Router};

use crate::handlers::*;
use crate::state::AppState;

pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/api/customers", get(list_customers).post(create_customer))
        .route(
            "/api/customers/:id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route("/api/customers/:id/loans", get(get_customer_loans))
        .route("/api/customers/:id/ledger", get(get_customer_ledger))
}
