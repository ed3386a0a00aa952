//! Authentication module for the ledger service
//!
//! A single administrator signs in with a username and bcrypt-checked
//! password and receives a short-lived JWT session token.
//! - HS256 tokens carrying `sub`, `role`, `jti`, `iat`, `exp`
//! - Logout revokes the token id until it expires

mod jwt;
mod service;

pub use jwt::{generate_session_token, verify_token, Claims, JwtError, ADMIN_ROLE};
pub use service::{AuthError, AuthService};
