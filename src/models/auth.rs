//! Authentication models for the admin session

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// Admin login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 128))]
    pub username: String,
    #[validate(length(min = 1, max = 256))]
    pub password: String,
}

/// Issued session token
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

/// Current session details
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionInfo {
    pub username: String,
    pub role: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
