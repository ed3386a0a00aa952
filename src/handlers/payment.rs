use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::AdminSession;
use crate::error::ApiResult;
use crate::payment::{ListPaymentsQuery, Payment, PaymentService, RecordPaymentRequest};

/// POST /api/payments
pub async fn record_payment(
    session: AdminSession,
    State(service): State<Arc<PaymentService>>,
    payload: Result<Json<RecordPaymentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Payment>)> {
    let Json(request) = payload?;
    tracing::debug!(admin = %session.username(), loan_id = %request.loan_id, "Recording payment");
    let payment = service.record_payment(request).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// GET /api/payments
pub async fn list_payments(
    _session: AdminSession,
    State(service): State<Arc<PaymentService>>,
    Query(query): Query<ListPaymentsQuery>,
) -> ApiResult<Json<Vec<Payment>>> {
    Ok(Json(service.list_payments(query.loan_id).await?))
}
