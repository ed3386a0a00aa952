//! Session extractor guarding ledger routes

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Serialize;
use std::sync::Arc;

use crate::auth::{AuthError, AuthService, Claims, ADMIN_ROLE};

/// A verified, unrevoked admin session
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub claims: Claims,
}

impl AdminSession {
    pub fn username(&self) -> &str {
        &self.claims.sub
    }
}

/// Error response for authentication failures
#[derive(Debug, Serialize)]
struct SessionRejection {
    error: SessionRejectionDetails,
}

#[derive(Debug, Serialize)]
struct SessionRejectionDetails {
    code: String,
    message: String,
}

impl SessionRejection {
    fn new(code: &str, message: &str) -> Self {
        Self {
            error: SessionRejectionDetails {
                code: code.to_string(),
                message: message.to_string(),
            },
        }
    }
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(self)).into_response()
    }
}

/// Extractor for admin sessions
///
/// Verifies the bearer token from the Authorization header and checks it
/// against the revocation list.
///
/// ```rust,ignore
/// async fn protected_handler(session: AdminSession) -> impl IntoResponse {
///     format!("Hello, {}", session.username())
/// }
/// ```
#[async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    SessionRejection::new(
                        "MISSING_TOKEN",
                        "Authorization header with Bearer token required",
                    )
                    .into_response()
                })?;

        let auth_service = Arc::<AuthService>::from_ref(state);

        let claims = auth_service.verify(bearer.token()).await.map_err(|e| {
            let (code, message) = match e {
                AuthError::TokenExpired => ("TOKEN_EXPIRED", "Session has expired"),
                AuthError::SessionRevoked => ("SESSION_REVOKED", "Session has been revoked"),
                _ => ("INVALID_TOKEN", "Invalid token"),
            };
            SessionRejection::new(code, message).into_response()
        })?;

        if claims.role != ADMIN_ROLE {
            return Err(SessionRejection::new("INVALID_TOKEN", "Invalid role in token").into_response());
        }

        Ok(AdminSession { claims })
    }
}
