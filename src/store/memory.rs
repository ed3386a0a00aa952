//! In-process store
//!
//! All records live behind one `RwLock`; writers take the write half, which
//! also serializes payments against the same loan.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CustomerSnapshot, LedgerSnapshot, LedgerStore, StoreError};
use crate::customer::Customer;
use crate::loan::Loan;
use crate::payment::Payment;

#[derive(Default)]
struct Tables {
    customers: Vec<Customer>,
    loans: Vec<Loan>,
    payments: Vec<Payment>,
    next_seq: i64,
}

/// Memory-backed ledger store
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn page<T: Clone>(items: impl Iterator<Item = T>, skip: i64, limit: i64) -> Vec<T> {
    items
        .skip(skip.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn insert_customer(&self, customer: Customer) -> Result<Customer, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.customers.iter().any(|c| c.id == customer.id) {
            return Err(StoreError::Conflict(format!(
                "customer {} already exists",
                customer.id
            )));
        }
        tables.customers.push(customer.clone());
        Ok(customer)
    }

    async fn get_customer(&self, id: Uuid) -> Result<Option<Customer>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.customers.iter().find(|c| c.id == id).cloned())
    }

    async fn list_customers(&self, skip: i64, limit: i64) -> Result<Vec<Customer>, StoreError> {
        let tables = self.tables.read().await;
        Ok(page(tables.customers.iter().cloned(), skip, limit))
    }

    async fn update_customer(&self, customer: Customer) -> Result<Customer, StoreError> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .customers
            .iter_mut()
            .find(|c| c.id == customer.id)
            .ok_or(StoreError::NotFound {
                entity: "customer",
                id: customer.id,
            })?;
        *slot = customer.clone();
        Ok(customer)
    }

    async fn delete_customer(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.customers.iter().any(|c| c.id == id) {
            return Err(StoreError::NotFound {
                entity: "customer",
                id,
            });
        }
        if tables.loans.iter().any(|l| l.customer_id == id) {
            return Err(StoreError::Conflict(format!(
                "customer {} still has loans on the ledger",
                id
            )));
        }
        tables.customers.retain(|c| c.id != id);
        Ok(())
    }

    async fn insert_loan(&self, loan: Loan) -> Result<Loan, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.customers.iter().any(|c| c.id == loan.customer_id) {
            return Err(StoreError::Referential {
                entity: "customer",
                id: loan.customer_id,
            });
        }
        tables.loans.push(loan.clone());
        Ok(loan)
    }

    async fn get_loan(&self, id: Uuid) -> Result<Option<Loan>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.loans.iter().find(|l| l.id == id).cloned())
    }

    async fn list_loans(
        &self,
        customer_id: Option<Uuid>,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Loan>, StoreError> {
        let tables = self.tables.read().await;
        let loans = tables
            .loans
            .iter()
            .rev()
            .filter(|l| customer_id.map_or(true, |id| l.customer_id == id))
            .cloned();
        Ok(page(loans, skip, limit))
    }

    async fn insert_payment(&self, mut payment: Payment) -> Result<Payment, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.loans.iter().any(|l| l.id == payment.loan_id) {
            return Err(StoreError::Referential {
                entity: "loan",
                id: payment.loan_id,
            });
        }
        tables.next_seq += 1;
        payment.seq = tables.next_seq;
        tables.payments.push(payment.clone());
        Ok(payment)
    }

    async fn list_payments(&self, loan_id: Option<Uuid>) -> Result<Vec<Payment>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .payments
            .iter()
            .filter(|p| loan_id.map_or(true, |id| p.loan_id == id))
            .cloned()
            .collect())
    }

    async fn loan_snapshot(
        &self,
        loan_id: Uuid,
    ) -> Result<Option<(Loan, Vec<Payment>)>, StoreError> {
        let tables = self.tables.read().await;
        let Some(loan) = tables.loans.iter().find(|l| l.id == loan_id).cloned() else {
            return Ok(None);
        };
        let payments = tables
            .payments
            .iter()
            .filter(|p| p.loan_id == loan_id)
            .cloned()
            .collect();
        Ok(Some((loan, payments)))
    }

    async fn customer_snapshot(
        &self,
        customer_id: Uuid,
    ) -> Result<Option<CustomerSnapshot>, StoreError> {
        let tables = self.tables.read().await;
        let Some(customer) = tables.customers.iter().find(|c| c.id == customer_id).cloned()
        else {
            return Ok(None);
        };
        let loans: Vec<Loan> = tables
            .loans
            .iter()
            .filter(|l| l.customer_id == customer_id)
            .cloned()
            .collect();
        let payments = tables
            .payments
            .iter()
            .filter(|p| loans.iter().any(|l| l.id == p.loan_id))
            .cloned()
            .collect();
        Ok(Some(CustomerSnapshot {
            customer,
            loans,
            payments,
        }))
    }

    async fn snapshot(&self) -> Result<LedgerSnapshot, StoreError> {
        let tables = self.tables.read().await;
        Ok(LedgerSnapshot {
            customers: tables.customers.clone(),
            loans: tables.loans.clone(),
            payments: tables.payments.clone(),
        })
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
