//! Customer HTTP handlers

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::AdminSession;
use crate::customer::{
    CreateCustomerRequest, Customer, CustomerService, ListCustomersQuery, UpdateCustomerRequest,
};
use crate::error::ApiResult;
use crate::models::{page_bounds, AsOfQuery};
use crate::services::ledger_engine::{CustomerLedgerResponse, LoanSummary};
use crate::services::LedgerService;

/// POST /api/customers
pub async fn create_customer(
    _session: AdminSession,
    State(service): State<Arc<CustomerService>>,
    payload: Result<Json<CreateCustomerRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    let Json(request) = payload?;
    let customer = service.create_customer(request).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// GET /api/customers
pub async fn list_customers(
    _session: AdminSession,
    State(service): State<Arc<CustomerService>>,
    Query(query): Query<ListCustomersQuery>,
) -> ApiResult<Json<Vec<Customer>>> {
    let (skip, limit) = page_bounds(query.skip, query.limit);
    Ok(Json(service.list_customers(skip, limit).await?))
}

/// GET /api/customers/:id
pub async fn get_customer(
    _session: AdminSession,
    State(service): State<Arc<CustomerService>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Customer>> {
    Ok(Json(service.get_customer(id).await?))
}

/// PUT /api/customers/:id
pub async fn update_customer(
    _session: AdminSession,
    State(service): State<Arc<CustomerService>>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateCustomerRequest>, JsonRejection>,
) -> ApiResult<Json<Customer>> {
    let Json(request) = payload?;
    Ok(Json(service.update_customer(id, request).await?))
}

/// DELETE /api/customers/:id
pub async fn delete_customer(
    _session: AdminSession,
    State(service): State<Arc<CustomerService>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    service.delete_customer(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/customers/:id/loans
pub async fn get_customer_loans(
    _session: AdminSession,
    State(ledger): State<Arc<LedgerService>>,
    Path(id): Path<Uuid>,
    Query(query): Query<AsOfQuery>,
) -> ApiResult<Json<Vec<LoanSummary>>> {
    Ok(Json(ledger.customer_loans(id, query.as_of).await?))
}

/// GET /api/customers/:id/ledger
pub async fn get_customer_ledger(
    _session: AdminSession,
    State(ledger): State<Arc<LedgerService>>,
    Path(id): Path<Uuid>,
    Query(query): Query<AsOfQuery>,
) -> ApiResult<Json<CustomerLedgerResponse>> {
    Ok(Json(ledger.customer_ledger(id, query.as_of).await?))
}
