//! Centralized API error handling for the ledger service
//!
//! Every failure reaching the HTTP layer becomes an [`ApiError`], which maps
//! to a status code and a JSON error body.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::services::ledger_engine::LedgerError;
use crate::store::StoreError;

/// API error type with HTTP status code mapping
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Too many requests")]
    TooManyRequests,

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A referenced parent record does not exist
    #[error("Referential error: {0}")]
    ReferentialError(String),

    #[error("Validation error: {field}: {message}")]
    ValidationError { field: String, message: String },
}

/// JSON error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

/// Error details in the response
#[derive(Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Get the error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::TooManyRequests => "TOO_MANY_REQUESTS",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::ReferentialError(_) => "REFERENTIAL_ERROR",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ReferentialError(_) => StatusCode::NOT_FOUND,
            ApiError::ValidationError { .. } => StatusCode::BAD_REQUEST,
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            ApiError::ValidationError { field, .. } => Some(field.clone()),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        // Log server errors
        match &self {
            ApiError::InternalError(_) | ApiError::DatabaseError(_) => {
                tracing::error!(error = %message, code = %error_code, "Server error occurred");
            }
            _ => {
                tracing::debug!(error = %message, code = %error_code, "Client error occurred");
            }
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code: error_code.to_string(),
                details: self.details(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

// Convenience conversions from common error types

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Validation { field, message } => ApiError::ValidationError { field, message },
            LedgerError::Referential { .. } => ApiError::ReferentialError(err.to_string()),
            // Stored records disagree with each other; never the caller's fault
            LedgerError::PaymentLoanMismatch { .. } => ApiError::InternalError(err.to_string()),
            LedgerError::DateOutOfRange { field } => {
                ApiError::validation(field, "date is outside the supported range")
            }
            LedgerError::AmountOverflow { .. } => ApiError::InternalError(err.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            StoreError::Referential { .. } => ApiError::ReferentialError(err.to_string()),
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::Database(msg) => ApiError::DatabaseError(msg),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        // Report the first offending field, alphabetically, so responses are stable
        let mut fields: Vec<_> = err.field_errors().into_iter().collect();
        fields.sort_by_key(|(field, _)| *field);

        match fields.first() {
            Some((field, errors)) => {
                let message = errors
                    .first()
                    .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                    .or_else(|| errors.first().map(|e| e.code.to_string()))
                    .unwrap_or_else(|| "is invalid".to_string());
                ApiError::validation(field.to_string(), message)
            }
            None => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        match err {
            // Well-formed JSON that does not fit the request type
            JsonRejection::JsonDataError(e) => {
                let text = e.body_text();
                let field = missing_field(&text).unwrap_or("body").to_string();
                ApiError::ValidationError {
                    field,
                    message: text,
                }
            }
            other => ApiError::BadRequest(format!("Invalid JSON: {}", other.body_text())),
        }
    }
}

/// Field name from serde's "missing field `x`" message
fn missing_field(text: &str) -> Option<&str> {
    let rest = &text[text.find("missing field `")? + "missing field `".len()..];
    rest.split('`').next()
}

/// Result type alias using ApiError
pub type ApiResult<T> = Result<T, ApiError>;
