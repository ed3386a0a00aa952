//! PostgreSQL store

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{CustomerSnapshot, LedgerSnapshot, LedgerStore, StoreError};
use crate::customer::Customer;
use crate::loan::Loan;
use crate::payment::Payment;

/// PostgreSQL-backed ledger store
#[derive(Clone)]
pub struct PgStore {
    db_pool: PgPool,
}

impl PgStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Start a read-only transaction that sees a single snapshot
    async fn begin_snapshot(&self) -> Result<Transaction<'_, Postgres>, StoreError> {
        let mut tx = self.db_pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn insert_customer(&self, customer: Customer) -> Result<Customer, StoreError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (id, name, phone, address, id_proof_url, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(&customer.id_proof_url)
        .bind(customer.status)
        .bind(customer.created_at)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(customer)
    }

    async fn get_customer(&self, id: Uuid) -> Result<Option<Customer>, StoreError> {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?;
        Ok(customer)
    }

    async fn list_customers(&self, skip: i64, limit: i64) -> Result<Vec<Customer>, StoreError> {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers ORDER BY created_at ASC, id ASC OFFSET $1 LIMIT $2",
        )
        .bind(skip.max(0))
        .bind(limit.max(0))
        .fetch_all(&self.db_pool)
        .await?;
        Ok(customers)
    }

    async fn update_customer(&self, customer: Customer) -> Result<Customer, StoreError> {
        let id = customer.id;
        sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET name = $2, phone = $3, address = $4, id_proof_url = $5, status = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(&customer.id_proof_url)
        .bind(customer.status)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or(StoreError::NotFound {
            entity: "customer",
            id,
        })
    }

    async fn delete_customer(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tx = self.db_pool.begin().await?;

        let exists = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM customers WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        if exists.is_none() {
            return Err(StoreError::NotFound {
                entity: "customer",
                id,
            });
        }

        let loan_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE customer_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if loan_count > 0 {
            return Err(StoreError::Conflict(format!(
                "customer {} still has loans on the ledger",
                id
            )));
        }

        sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn insert_loan(&self, loan: Loan) -> Result<Loan, StoreError> {
        let mut tx = self.db_pool.begin().await?;

        // Lock the customer so a concurrent delete cannot orphan the loan
        let customer = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM customers WHERE id = $1 FOR SHARE",
        )
        .bind(loan.customer_id)
        .fetch_optional(&mut *tx)
        .await?;
        if customer.is_none() {
            return Err(StoreError::Referential {
                entity: "customer",
                id: loan.customer_id,
            });
        }

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (
                id, customer_id, principal_amount, interest_amount, total_amount,
                installment_amount, number_of_installments, loan_duration_days,
                repayment_frequency, start_date, end_date, notes, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(loan.id)
        .bind(loan.customer_id)
        .bind(loan.principal_amount)
        .bind(loan.interest_amount)
        .bind(loan.total_amount)
        .bind(loan.installment_amount)
        .bind(loan.number_of_installments)
        .bind(loan.loan_duration_days)
        .bind(loan.repayment_frequency)
        .bind(loan.start_date)
        .bind(loan.end_date)
        .bind(&loan.notes)
        .bind(loan.created_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(loan)
    }

    async fn get_loan(&self, id: Uuid) -> Result<Option<Loan>, StoreError> {
        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?;
        Ok(loan)
    }

    async fn list_loans(
        &self,
        customer_id: Option<Uuid>,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Loan>, StoreError> {
        let mut query_builder = sqlx::QueryBuilder::new("SELECT * FROM loans WHERE 1=1");

        if let Some(customer_id) = customer_id {
            query_builder.push(" AND customer_id = ");
            query_builder.push_bind(customer_id);
        }

        query_builder.push(" ORDER BY created_at DESC, id DESC OFFSET ");
        query_builder.push_bind(skip.max(0));
        query_builder.push(" LIMIT ");
        query_builder.push_bind(limit.max(0));

        let loans = query_builder
            .build_query_as::<Loan>()
            .fetch_all(&self.db_pool)
            .await?;
        Ok(loans)
    }

    async fn insert_payment(&self, payment: Payment) -> Result<Payment, StoreError> {
        let mut tx = self.db_pool.begin().await?;

        // Serializes payments against the same loan
        let loan = sqlx::query_scalar::<_, Uuid>("SELECT id FROM loans WHERE id = $1 FOR UPDATE")
            .bind(payment.loan_id)
            .fetch_optional(&mut *tx)
            .await?;
        if loan.is_none() {
            return Err(StoreError::Referential {
                entity: "loan",
                id: payment.loan_id,
            });
        }

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (id, loan_id, paid_amount, payment_date, collector_id, notes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(payment.id)
        .bind(payment.loan_id)
        .bind(payment.paid_amount)
        .bind(payment.payment_date)
        .bind(payment.collector_id)
        .bind(&payment.notes)
        .bind(payment.created_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(payment)
    }

    async fn list_payments(&self, loan_id: Option<Uuid>) -> Result<Vec<Payment>, StoreError> {
        let payments = match loan_id {
            Some(loan_id) => {
                sqlx::query_as::<_, Payment>(
                    "SELECT * FROM payments WHERE loan_id = $1 ORDER BY seq ASC",
                )
                .bind(loan_id)
                .fetch_all(&self.db_pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Payment>("SELECT * FROM payments ORDER BY seq ASC")
                    .fetch_all(&self.db_pool)
                    .await?
            }
        };
        Ok(payments)
    }

    async fn loan_snapshot(
        &self,
        loan_id: Uuid,
    ) -> Result<Option<(Loan, Vec<Payment>)>, StoreError> {
        let mut tx = self.begin_snapshot().await?;

        let Some(loan) = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE loan_id = $1 ORDER BY seq ASC",
        )
        .bind(loan_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some((loan, payments)))
    }

    async fn customer_snapshot(
        &self,
        customer_id: Uuid,
    ) -> Result<Option<CustomerSnapshot>, StoreError> {
        let mut tx = self.begin_snapshot().await?;

        let Some(customer) = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(customer_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let loans = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE customer_id = $1 ORDER BY created_at ASC",
        )
        .bind(customer_id)
        .fetch_all(&mut *tx)
        .await?;

        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT p.* FROM payments p
            JOIN loans l ON l.id = p.loan_id
            WHERE l.customer_id = $1
            ORDER BY p.seq ASC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(CustomerSnapshot {
            customer,
            loans,
            payments,
        }))
    }

    async fn snapshot(&self) -> Result<LedgerSnapshot, StoreError> {
        let mut tx = self.begin_snapshot().await?;

        let customers =
            sqlx::query_as::<_, Customer>("SELECT * FROM customers ORDER BY created_at ASC")
                .fetch_all(&mut *tx)
                .await?;
        let loans = sqlx::query_as::<_, Loan>("SELECT * FROM loans ORDER BY created_at ASC")
            .fetch_all(&mut *tx)
            .await?;
        let payments = sqlx::query_as::<_, Payment>("SELECT * FROM payments ORDER BY seq ASC")
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(LedgerSnapshot {
            customers,
            loans,
            payments,
        })
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        crate::db::check_health(&self.db_pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}
