//! Loan service layer - issuing and looking up loans

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::loan::model::{CreateLoanRequest, Loan, RepaymentFrequency};
use crate::services::ledger_engine::{plan_loan, LedgerError, LoanApplication};
use crate::services::money::round_money;
use crate::store::LedgerStore;

/// Loan service for issuing loans
#[derive(Clone)]
pub struct LoanService {
    store: Arc<dyn LedgerStore>,
}

impl LoanService {
    /// Create a new loan service instance
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Issue a new loan.
    ///
    /// Amounts are rounded to ledger precision before the terms are derived,
    /// so the stored total always equals principal plus interest.
    pub async fn create_loan(&self, request: CreateLoanRequest) -> Result<Loan, ApiError> {
        request.validate()?;

        let repayment_frequency = request
            .repayment_frequency
            .parse::<RepaymentFrequency>()
            .map_err(|msg| LedgerError::validation("repayment_frequency", msg))?;

        let application = LoanApplication {
            customer_id: request.customer_id,
            principal_amount: round_money(request.principal_amount),
            interest_amount: round_money(request.interest_amount),
            installment_amount: round_money(request.installment_amount),
            repayment_frequency,
            start_date: request.start_date,
            notes: request.notes.filter(|n| !n.trim().is_empty()),
        };
        let terms = plan_loan(&application)?;

        let loan = Loan {
            id: Uuid::new_v4(),
            customer_id: application.customer_id,
            principal_amount: application.principal_amount,
            interest_amount: application.interest_amount,
            total_amount: terms.total_amount,
            installment_amount: application.installment_amount,
            number_of_installments: terms.number_of_installments,
            loan_duration_days: terms.loan_duration_days,
            repayment_frequency: application.repayment_frequency,
            start_date: application.start_date,
            end_date: terms.end_date,
            notes: application.notes,
            created_at: Utc::now(),
        };

        let loan = self.store.insert_loan(loan).await?;
        tracing::info!(
            loan_id = %loan.id,
            customer_id = %loan.customer_id,
            amount = %loan.total_amount,
            installments = loan.number_of_installments,
            frequency = %loan.repayment_frequency,
            "Loan issued"
        );

        Ok(loan)
    }

    pub async fn get_loan(&self, id: Uuid) -> Result<Loan, ApiError> {
        self.store
            .get_loan(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Loan {} not found", id)))
    }

    /// Loans newest first
    pub async fn list_loans(
        &self,
        customer_id: Option<Uuid>,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Loan>, ApiError> {
        Ok(self.store.list_loans(customer_id, skip, limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customer::{Customer, CustomerStatus};
    use crate::store::MemoryStore;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    async fn setup() -> (LoanService, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let customer = store
            .insert_customer(Customer {
                id: Uuid::new_v4(),
                name: "Asha".to_string(),
                phone: "9000000001".to_string(),
                address: "12 Market Road".to_string(),
                id_proof_url: None,
                status: CustomerStatus::Active,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        (LoanService::new(store), customer.id)
    }

    fn request(customer_id: Uuid, frequency: &str) -> CreateLoanRequest {
        CreateLoanRequest {
            customer_id,
            principal_amount: dec!(10000),
            interest_amount: dec!(2000),
            installment_amount: dec!(1000),
            repayment_frequency: frequency.to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_loan_derives_terms() {
        let (service, customer_id) = setup().await;
        let loan = service.create_loan(request(customer_id, "monthly")).await.unwrap();

        assert_eq!(loan.total_amount, dec!(12000));
        assert_eq!(loan.number_of_installments, 12);
        assert_eq!(loan.end_date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(loan.loan_duration_days, 366);
    }

    #[tokio::test]
    async fn test_unknown_frequency_is_field_error() {
        let (service, customer_id) = setup().await;
        let err = service
            .create_loan(request(customer_id, "fortnightly"))
            .await
            .unwrap_err();
        assert!(
            matches!(err, ApiError::ValidationError { ref field, .. } if field == "repayment_frequency")
        );
    }

    #[tokio::test]
    async fn test_unknown_customer_is_referential() {
        let (service, _) = setup().await;
        let err = service
            .create_loan(request(Uuid::new_v4(), "daily"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ReferentialError(_)));
    }

    #[tokio::test]
    async fn test_amounts_rounded_half_even() {
        let (service, customer_id) = setup().await;
        let mut req = request(customer_id, "weekly");
        req.principal_amount = dec!(100.005);
        req.interest_amount = dec!(0.015);
        req.installment_amount = dec!(10);

        let loan = service.create_loan(req).await.unwrap();
        assert_eq!(loan.principal_amount, dec!(100.00));
        assert_eq!(loan.interest_amount, dec!(0.02));
        assert_eq!(loan.total_amount, dec!(100.02));
        assert_eq!(loan.number_of_installments, 11);
    }

    #[tokio::test]
    async fn test_amounts_beyond_money_range_rejected() {
        let (service, customer_id) = setup().await;

        let mut req = request(customer_id, "monthly");
        req.principal_amount = dec!(50000000000000000000000000000);
        req.interest_amount = dec!(50000000000000000000000000000);
        let err = service.create_loan(req).await.unwrap_err();
        assert!(
            matches!(err, ApiError::ValidationError { ref field, .. } if field == "principal_amount")
        );

        // Each part fits, the total does not
        let mut req = request(customer_id, "monthly");
        req.principal_amount = dec!(600000000000);
        req.interest_amount = dec!(600000000000);
        let err = service.create_loan(req).await.unwrap_err();
        assert!(
            matches!(err, ApiError::ValidationError { ref field, .. } if field == "interest_amount")
        );

        let loans = service.list_loans(Some(customer_id), 0, 100).await.unwrap();
        assert!(loans.is_empty());
    }
}
