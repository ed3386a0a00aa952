//! Authentication HTTP handlers
//!
//! Endpoints for the admin session.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use super::AdminSession;
use crate::auth::{AuthError, AuthService};
use crate::error::ApiError;
use crate::models::{LoginRequest, SessionInfo, SessionTokenResponse};

/// POST /api/auth/login - Exchange admin credentials for a session token
pub async fn login(
    State(auth_service): State<Arc<AuthService>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<SessionTokenResponse>, ApiError> {
    let Json(req) = payload?;
    req.validate()?;

    let session = auth_service
        .login(&req.username, &req.password)
        .await
        .map_err(|e| match e {
            AuthError::InvalidCredentials => ApiError::Unauthorized(e.to_string()),
            _ => ApiError::InternalError(e.to_string()),
        })?;

    Ok(Json(session))
}

/// GET /api/auth/session - Describe the current session
pub async fn get_session(
    session: AdminSession,
    State(auth_service): State<Arc<AuthService>>,
) -> Json<SessionInfo> {
    Json(auth_service.session_info(&session.claims))
}

/// POST /api/auth/logout - Revoke the current session
pub async fn logout(
    session: AdminSession,
    State(auth_service): State<Arc<AuthService>>,
) -> StatusCode {
    auth_service.logout(&session.claims).await;
    StatusCode::NO_CONTENT
}
