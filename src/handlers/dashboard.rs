//! Portfolio dashboard handlers

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use super::AdminSession;
use crate::error::ApiResult;
use crate::models::AsOfQuery;
use crate::services::ledger_engine::DashboardSummary;
use crate::services::{LedgerService, LoanOverview, TodayCollectionReport};

/// GET /api/dashboard
pub async fn get_dashboard(
    _session: AdminSession,
    State(ledger): State<Arc<LedgerService>>,
    Query(query): Query<AsOfQuery>,
) -> ApiResult<Json<DashboardSummary>> {
    Ok(Json(ledger.dashboard_summary(query.as_of).await?))
}

/// GET /api/dashboard/today-collection
pub async fn get_today_collection(
    _session: AdminSession,
    State(ledger): State<Arc<LedgerService>>,
    Query(query): Query<AsOfQuery>,
) -> ApiResult<Json<TodayCollectionReport>> {
    Ok(Json(ledger.today_collections(query.as_of).await?))
}

/// GET /api/dashboard/overdue
pub async fn get_overdue_loans(
    _session: AdminSession,
    State(ledger): State<Arc<LedgerService>>,
    Query(query): Query<AsOfQuery>,
) -> ApiResult<Json<Vec<LoanOverview>>> {
    Ok(Json(ledger.overdue_loans(query.as_of).await?))
}
