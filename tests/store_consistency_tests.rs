//! Consistency tests for the PostgreSQL ledger store

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;
    use sqlx::PgPool;
    use uuid::Uuid;

    use microfinance_ledger::customer::{Customer, CustomerStatus};
    use microfinance_ledger::db;
    use microfinance_ledger::loan::{Loan, RepaymentFrequency};
    use microfinance_ledger::payment::Payment;
    use microfinance_ledger::store::{LedgerStore, PgStore, StoreError};

    /// Helper to create a migrated test database pool
    async fn setup_test_db() -> PgPool {
        let database_url = std::env::var("TEST_DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/microfinance_test".to_string());

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(4)
            .connect(&database_url)
            .await
            .expect("Failed to connect to test database");
        db::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        pool
    }

    fn test_customer() -> Customer {
        Customer {
            id: Uuid::new_v4(),
            name: "Asha".to_string(),
            phone: "9000000001".to_string(),
            address: "12 Market Road".to_string(),
            id_proof_url: None,
            status: CustomerStatus::Active,
            created_at: Utc::now(),
        }
    }

    fn test_loan(customer_id: Uuid) -> Loan {
        Loan {
            id: Uuid::new_v4(),
            customer_id,
            principal_amount: dec!(10000),
            interest_amount: dec!(2000),
            total_amount: dec!(12000),
            installment_amount: dec!(1000),
            number_of_installments: 12,
            loan_duration_days: 366,
            repayment_frequency: RepaymentFrequency::Monthly,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            notes: None,
            created_at: Utc::now(),
        }
    }

    fn test_payment(loan_id: Uuid) -> Payment {
        Payment {
            id: Uuid::new_v4(),
            loan_id,
            paid_amount: dec!(250),
            payment_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            collector_id: None,
            notes: None,
            created_at: Utc::now(),
            seq: 0,
        }
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_health_check_sees_ledger_schema() {
        let pool = setup_test_db().await;
        db::check_health(&pool).await.unwrap();
        PgStore::new(pool).health_check().await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_loan_requires_existing_customer() {
        let store = PgStore::new(setup_test_db().await);

        let err = store
            .insert_loan(test_loan(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Referential { entity: "customer", .. }));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_customer_with_loans_is_not_deleted() {
        let store = PgStore::new(setup_test_db().await);
        let customer = store.insert_customer(test_customer()).await.unwrap();
        store.insert_loan(test_loan(customer.id)).await.unwrap();

        let err = store.delete_customer(customer.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert!(store.get_customer(customer.id).await.unwrap().is_some());
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_concurrent_payments_are_all_recorded() {
        let store: Arc<dyn LedgerStore> = Arc::new(PgStore::new(setup_test_db().await));
        let customer = store.insert_customer(test_customer()).await.unwrap();
        let loan = store.insert_loan(test_loan(customer.id)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let loan_id = loan.id;
            handles.push(tokio::spawn(async move {
                store.insert_payment(test_payment(loan_id)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let (stored, payments) = store.loan_snapshot(loan.id).await.unwrap().unwrap();
        assert_eq!(stored.id, loan.id);
        assert_eq!(payments.len(), 8);

        let total: rust_decimal::Decimal = payments.iter().map(|p| p.paid_amount).sum();
        assert_eq!(total, dec!(2000));

        // Insertion sequence is unique and strictly increasing
        assert!(payments.windows(2).all(|w| w[0].seq < w[1].seq));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_customer_snapshot_is_complete() {
        let store = PgStore::new(setup_test_db().await);
        let customer = store.insert_customer(test_customer()).await.unwrap();
        let loan = store.insert_loan(test_loan(customer.id)).await.unwrap();
        store.insert_payment(test_payment(loan.id)).await.unwrap();

        let snapshot = store.customer_snapshot(customer.id).await.unwrap().unwrap();
        assert_eq!(snapshot.customer.id, customer.id);
        assert_eq!(snapshot.loans.len(), 1);
        assert_eq!(snapshot.payments.len(), 1);
        assert_eq!(snapshot.payments[0].loan_id, loan.id);
    }
}
