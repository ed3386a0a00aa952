//! Authentication service
//!
//! Checks the administrator's credentials, issues session tokens and keeps
//! the set of revoked token ids until they would have expired anyway.

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::Config;
use crate::models::{SessionInfo, SessionTokenResponse};

use super::jwt::{generate_session_token, verify_token, Claims, JwtError};

/// Auth service errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Session has been revoked")]
    SessionRevoked,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Password hashing failed: {0}")]
    HashError(String),
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        match e {
            JwtError::TokenExpired => AuthError::TokenExpired,
            other => AuthError::TokenError(other.to_string()),
        }
    }
}

impl From<bcrypt::BcryptError> for AuthError {
    fn from(e: bcrypt::BcryptError) -> Self {
        AuthError::HashError(e.to_string())
    }
}

/// Authentication service
pub struct AuthService {
    jwt_secret: String,
    session_ttl_seconds: i64,
    admin_username: String,
    admin_password_hash: String,
    /// Revoked jti -> token expiry (Unix timestamp)
    revoked: RwLock<HashMap<String, i64>>,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(
        jwt_secret: String,
        session_ttl_seconds: i64,
        admin_username: String,
        admin_password_hash: String,
    ) -> Self {
        Self {
            jwt_secret,
            session_ttl_seconds,
            admin_username,
            admin_password_hash,
            revoked: RwLock::new(HashMap::new()),
        }
    }

    /// Build from configuration; development runs without a configured
    /// password hash fall back to the password `admin`
    pub fn from_config(config: &Config) -> Result<Self, AuthError> {
        let hash = match &config.admin_password_hash {
            Some(hash) => hash.clone(),
            None => {
                tracing::warn!(
                    username = %config.admin_username,
                    "ADMIN_PASSWORD_HASH not set; using the development password"
                );
                bcrypt::hash("admin", bcrypt::DEFAULT_COST)?
            }
        };

        Ok(Self::new(
            config.jwt_secret.clone(),
            config.session_ttl_seconds,
            config.admin_username.clone(),
            hash,
        ))
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    /// Exchange admin credentials for a session token
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SessionTokenResponse, AuthError> {
        let hash = self.admin_password_hash.clone();
        let password = password.to_string();
        // bcrypt is CPU bound
        let password_ok = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AuthError::HashError(e.to_string()))??;

        if !password_ok || username != self.admin_username {
            tracing::warn!(username = %username, "Failed admin login");
            return Err(AuthError::InvalidCredentials);
        }

        let jti = Uuid::new_v4().to_string();
        let (access_token, claims) = generate_session_token(
            &self.admin_username,
            &jti,
            &self.jwt_secret,
            self.session_ttl_seconds,
        )?;

        tracing::info!(username = %claims.sub, jti = %claims.jti, "Admin session started");

        Ok(SessionTokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_at: timestamp(claims.exp),
        })
    }

    /// Validate a bearer token and make sure it has not been revoked
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = verify_token(token, &self.jwt_secret)?;

        if self.revoked.read().await.contains_key(&claims.jti) {
            return Err(AuthError::SessionRevoked);
        }

        Ok(claims)
    }

    /// Revoke a session for the rest of its lifetime
    pub async fn logout(&self, claims: &Claims) {
        self.revoked
            .write()
            .await
            .insert(claims.jti.clone(), claims.exp);
        tracing::info!(username = %claims.sub, jti = %claims.jti, "Admin session revoked");
    }

    pub fn session_info(&self, claims: &Claims) -> SessionInfo {
        SessionInfo {
            username: claims.sub.clone(),
            role: claims.role.clone(),
            issued_at: timestamp(claims.iat),
            expires_at: timestamp(claims.exp),
        }
    }

    /// Forget revocations whose tokens have expired
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now().timestamp();
        let mut revoked = self.revoked.write().await;
        let before = revoked.len();
        revoked.retain(|_, exp| *exp > now);
        before - revoked.len()
    }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        let hash = bcrypt::hash("s3cret", 4).unwrap();
        AuthService::new("test-secret".to_string(), 3600, "admin".to_string(), hash)
    }

    #[tokio::test]
    async fn test_login_and_verify() {
        let auth = service();
        let session = auth.login("admin", "s3cret").await.unwrap();
        assert_eq!(session.token_type, "Bearer");

        let claims = auth.verify(&session.access_token).await.unwrap();
        assert_eq!(claims.sub, "admin");
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let auth = service();
        assert!(matches!(
            auth.login("admin", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("root", "s3cret").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_logout_revokes_token() {
        let auth = service();
        let session = auth.login("admin", "s3cret").await.unwrap();
        let claims = auth.verify(&session.access_token).await.unwrap();

        auth.logout(&claims).await;
        assert!(matches!(
            auth.verify(&session.access_token).await,
            Err(AuthError::SessionRevoked)
        ));

        // Still within its lifetime, so the revocation is kept
        assert_eq!(auth.purge_expired().await, 0);
    }
}
