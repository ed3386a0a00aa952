//! Route definitions for the ledger API

mod auth;
mod customer;
mod dashboard;
mod loan;
mod payment;

pub use auth::auth_routes;
pub use customer::customer_routes;
pub use dashboard::dashboard_routes;
pub use loan::loan_routes;
pub use payment::payment_routes;
