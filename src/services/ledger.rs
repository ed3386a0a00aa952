//! Read-side ledger service
//!
//! Loads a consistent snapshot from the store, resolves "today" in the
//! business timezone and hands both to the ledger engine.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::customer::Customer;
use crate::error::ApiError;
use crate::payment::Payment;
use crate::services::calendar::BusinessCalendar;
use crate::services::ledger_engine::{
    self, CollectionItem, CustomerLedgerResponse, DashboardSummary, LedgerError, LoanSummary,
};
use crate::services::money::sum_money;
use crate::store::LedgerStore;

/// Loan summary together with the borrower's contact details
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LoanOverview {
    pub customer_name: String,
    pub customer_phone: String,
    #[serde(flatten)]
    pub summary: LoanSummary,
}

/// Payments collected on one business day
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TodayCollectionReport {
    pub date: NaiveDate,
    pub total_collections: i64,
    pub total_amount: Decimal,
    pub payments: Vec<CollectionItem>,
}

#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
    calendar: BusinessCalendar,
}

impl LedgerService {
    pub fn new(store: Arc<dyn LedgerStore>, calendar: BusinessCalendar) -> Self {
        Self { store, calendar }
    }

    pub fn calendar(&self) -> &BusinessCalendar {
        &self.calendar
    }

    pub async fn loan_summary(
        &self,
        loan_id: Uuid,
        as_of: Option<NaiveDate>,
    ) -> Result<LoanOverview, ApiError> {
        let today = self.calendar.resolve(as_of);
        let (loan, payments) = self
            .store
            .loan_snapshot(loan_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Loan {} not found", loan_id)))?;

        let customer = self
            .store
            .get_customer(loan.customer_id)
            .await?
            .ok_or(ledger_engine::LedgerError::Referential {
                entity: "customer",
                id: loan.customer_id,
            })?;

        let summary = ledger_engine::compute_loan_summary(&loan, &payments, today)?;
        Ok(overview(&customer, summary))
    }

    /// Summaries of every loan a customer holds, oldest first
    pub async fn customer_loans(
        &self,
        customer_id: Uuid,
        as_of: Option<NaiveDate>,
    ) -> Result<Vec<LoanSummary>, ApiError> {
        let today = self.calendar.resolve(as_of);
        let snapshot = self
            .store
            .customer_snapshot(customer_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Customer {} not found", customer_id)))?;

        Ok(ledger_engine::compute_loan_summaries(
            &snapshot.loans,
            &snapshot.payments,
            today,
        )?)
    }

    pub async fn customer_ledger(
        &self,
        customer_id: Uuid,
        as_of: Option<NaiveDate>,
    ) -> Result<CustomerLedgerResponse, ApiError> {
        let today = self.calendar.resolve(as_of);
        let snapshot = self
            .store
            .customer_snapshot(customer_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Customer {} not found", customer_id)))?;

        let mut payments_by_loan: HashMap<Uuid, Vec<Payment>> = HashMap::new();
        for payment in snapshot.payments {
            payments_by_loan
                .entry(payment.loan_id)
                .or_default()
                .push(payment);
        }

        Ok(ledger_engine::compute_customer_ledger(
            &snapshot.customer,
            &snapshot.loans,
            &payments_by_loan,
            today,
        )?)
    }

    pub async fn dashboard_summary(
        &self,
        as_of: Option<NaiveDate>,
    ) -> Result<DashboardSummary, ApiError> {
        let today = self.calendar.resolve(as_of);
        let snapshot = self.store.snapshot().await?;

        let summary = ledger_engine::compute_dashboard_summary(
            &snapshot.customers,
            &snapshot.loans,
            &snapshot.payments,
            today,
        )?;
        tracing::debug!(
            as_of = %today,
            total_loans = summary.total_loans,
            overdue = summary.overdue,
            "Dashboard summary computed"
        );

        Ok(summary)
    }

    pub async fn today_collections(
        &self,
        as_of: Option<NaiveDate>,
    ) -> Result<TodayCollectionReport, ApiError> {
        let today = self.calendar.resolve(as_of);
        let snapshot = self.store.snapshot().await?;

        let payments = ledger_engine::collections_on(
            &snapshot.customers,
            &snapshot.loans,
            &snapshot.payments,
            today,
        )?;

        Ok(TodayCollectionReport {
            date: today,
            total_collections: payments.len() as i64,
            total_amount: sum_money(payments.iter().map(|p| p.amount)).ok_or(
                LedgerError::AmountOverflow {
                    field: "total_amount",
                },
            )?,
            payments,
        })
    }

    /// Overdue loans, most overdue first
    pub async fn overdue_loans(
        &self,
        as_of: Option<NaiveDate>,
    ) -> Result<Vec<LoanOverview>, ApiError> {
        let today = self.calendar.resolve(as_of);
        let snapshot = self.store.snapshot().await?;

        let customers: HashMap<Uuid, &Customer> =
            snapshot.customers.iter().map(|c| (c.id, c)).collect();

        ledger_engine::overdue_loans(&snapshot.loans, &snapshot.payments, today)?
            .into_iter()
            .map(|summary| -> Result<LoanOverview, ApiError> {
                let customer = customers.get(&summary.customer_id).ok_or(
                    ledger_engine::LedgerError::Referential {
                        entity: "customer",
                        id: summary.customer_id,
                    },
                )?;
                Ok(overview(customer, summary))
            })
            .collect()
    }
}

fn overview(customer: &Customer, summary: LoanSummary) -> LoanOverview {
    LoanOverview {
        customer_name: customer.name.clone(),
        customer_phone: customer.phone.clone(),
        summary,
    }
}
