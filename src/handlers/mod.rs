//! API handlers for the ledger service

pub mod auth;
pub mod customer;
pub mod dashboard;
pub mod health;
pub mod loan;
pub mod payment;

pub use customer::*;
pub use dashboard::*;
pub use health::*;
pub use loan::*;
pub use payment::*;

// Re-export the session extractor for handler use
pub use crate::middleware::auth::AdminSession;
