//! Persistence for customers, loans and payments
//!
//! Services talk to a [`LedgerStore`]; `PgStore` backs production and
//! `MemoryStore` backs development runs and tests. Both serialize payment
//! writes per loan and hand out consistent snapshots for reads.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::customer::Customer;
use crate::loan::Loan;
use crate::payment::Payment;

/// Store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("{entity} {id} does not exist")]
    Referential { entity: &'static str, id: Uuid },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// Everything needed to compute portfolio views, read at one point in time
#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    pub customers: Vec<Customer>,
    pub loans: Vec<Loan>,
    pub payments: Vec<Payment>,
}

/// One customer with their loans and the payments on those loans
#[derive(Debug, Clone)]
pub struct CustomerSnapshot {
    pub customer: Customer,
    pub loans: Vec<Loan>,
    pub payments: Vec<Payment>,
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn insert_customer(&self, customer: Customer) -> Result<Customer, StoreError>;

    async fn get_customer(&self, id: Uuid) -> Result<Option<Customer>, StoreError>;

    /// Customers in creation order
    async fn list_customers(&self, skip: i64, limit: i64) -> Result<Vec<Customer>, StoreError>;

    async fn update_customer(&self, customer: Customer) -> Result<Customer, StoreError>;

    /// Fails with `Conflict` while the customer still owns loans
    async fn delete_customer(&self, id: Uuid) -> Result<(), StoreError>;

    /// Fails with `Referential` when the customer does not exist
    async fn insert_loan(&self, loan: Loan) -> Result<Loan, StoreError>;

    async fn get_loan(&self, id: Uuid) -> Result<Option<Loan>, StoreError>;

    /// Loans newest first, optionally for one customer
    async fn list_loans(
        &self,
        customer_id: Option<Uuid>,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Loan>, StoreError>;

    /// Appends a payment. Writes against the same loan are serialized and the
    /// returned record carries its insertion sequence. Fails with
    /// `Referential` when the loan does not exist.
    async fn insert_payment(&self, payment: Payment) -> Result<Payment, StoreError>;

    /// Payments in insertion order, optionally for one loan
    async fn list_payments(&self, loan_id: Option<Uuid>) -> Result<Vec<Payment>, StoreError>;

    /// A loan and its payments, read consistently
    async fn loan_snapshot(&self, loan_id: Uuid)
        -> Result<Option<(Loan, Vec<Payment>)>, StoreError>;

    async fn customer_snapshot(
        &self,
        customer_id: Uuid,
    ) -> Result<Option<CustomerSnapshot>, StoreError>;

    async fn snapshot(&self) -> Result<LedgerSnapshot, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
