//! Payment service layer - recording and listing repayments

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::payment::model::{Payment, RecordPaymentRequest};
use crate::services::ledger_engine::{check_amount, sort_payments};
use crate::services::money::round_money;
use crate::store::LedgerStore;

#[derive(Clone)]
pub struct PaymentService {
    store: Arc<dyn LedgerStore>,
}

impl PaymentService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Record a payment against an existing loan.
    ///
    /// Payments beyond the outstanding balance are accepted; the loan summary
    /// reports them as excess.
    pub async fn record_payment(&self, request: RecordPaymentRequest) -> Result<Payment, ApiError> {
        request.validate()?;

        let paid_amount = round_money(request.paid_amount);
        if paid_amount <= Decimal::ZERO {
            return Err(ApiError::validation("paid_amount", "must be greater than 0"));
        }
        check_amount("paid_amount", paid_amount)?;

        let payment = Payment {
            id: Uuid::new_v4(),
            loan_id: request.loan_id,
            paid_amount,
            payment_date: request.payment_date,
            collector_id: request.collector_id,
            notes: request.notes.filter(|n| !n.trim().is_empty()),
            created_at: Utc::now(),
            seq: 0,
        };

        let payment = self.store.insert_payment(payment).await?;
        tracing::info!(
            payment_id = %payment.id,
            loan_id = %payment.loan_id,
            amount = %payment.paid_amount,
            payment_date = %payment.payment_date,
            "Payment recorded"
        );

        Ok(payment)
    }

    /// Payments in ledger order, optionally restricted to one loan
    pub async fn list_payments(&self, loan_id: Option<Uuid>) -> Result<Vec<Payment>, ApiError> {
        if let Some(id) = loan_id {
            if self.store.get_loan(id).await?.is_none() {
                return Err(ApiError::NotFound(format!("Loan {} not found", id)));
            }
        }

        let payments = self.store.list_payments(loan_id).await?;
        let mut ordered: Vec<&Payment> = payments.iter().collect();
        sort_payments(&mut ordered);

        Ok(ordered.into_iter().cloned().collect())
    }
}
