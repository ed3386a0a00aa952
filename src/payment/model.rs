use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Payment record. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub paid_amount: Decimal,
    pub payment_date: NaiveDate,
    pub collector_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Insertion sequence assigned by the store; orders same-instant writes
    #[serde(skip)]
    pub seq: i64,
}

/// Request to record a payment against a loan
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecordPaymentRequest {
    pub loan_id: Uuid,
    pub paid_amount: Decimal,
    pub payment_date: NaiveDate,
    pub collector_id: Option<Uuid>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Query for listing payments
#[derive(Debug, Default, Deserialize)]
pub struct ListPaymentsQuery {
    pub loan_id: Option<Uuid>,
}
