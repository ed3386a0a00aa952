//! Loan HTTP handlers

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::AdminSession;
use crate::error::ApiResult;
use crate::loan::{CreateLoanRequest, ListLoansQuery, Loan, LoanService};
use crate::models::{page_bounds, AsOfQuery};
use crate::services::{LedgerService, LoanOverview};

/// POST /api/loans
pub async fn create_loan(
    _session: AdminSession,
    State(service): State<Arc<LoanService>>,
    payload: Result<Json<CreateLoanRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Loan>)> {
    let Json(request) = payload?;
    let loan = service.create_loan(request).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// GET /api/loans
pub async fn list_loans(
    _session: AdminSession,
    State(service): State<Arc<LoanService>>,
    Query(query): Query<ListLoansQuery>,
) -> ApiResult<Json<Vec<Loan>>> {
    let (skip, limit) = page_bounds(query.skip, query.limit);
    Ok(Json(service.list_loans(query.customer_id, skip, limit).await?))
}

/// GET /api/loans/:id
pub async fn get_loan(
    _session: AdminSession,
    State(service): State<Arc<LoanService>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Loan>> {
    Ok(Json(service.get_loan(id).await?))
}

/// GET /api/loans/:id/summary
pub async fn get_loan_summary(
    _session: AdminSession,
    State(ledger): State<Arc<LedgerService>>,
    Path(id): Path<Uuid>,
    Query(query): Query<AsOfQuery>,
) -> ApiResult<Json<LoanOverview>> {
    Ok(Json(ledger.loan_summary(id, query.as_of).await?))
}
