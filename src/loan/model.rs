//! Loan models
use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Period between installments
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Hash)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RepaymentFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl RepaymentFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepaymentFrequency::Daily => "daily",
            RepaymentFrequency::Weekly => "weekly",
            RepaymentFrequency::Monthly => "monthly",
        }
    }

    /// Advance `start` by `periods` whole repayment periods.
    ///
    /// Monthly periods are calendar months counted from `start`, so a loan
    /// starting on the 31st falls due on the last day of shorter months.
    /// Returns `None` when the result leaves chrono's date range.
    pub fn advance(&self, start: NaiveDate, periods: u32) -> Option<NaiveDate> {
        match self {
            RepaymentFrequency::Daily => start.checked_add_days(Days::new(u64::from(periods))),
            RepaymentFrequency::Weekly => {
                start.checked_add_days(Days::new(u64::from(periods) * 7))
            }
            RepaymentFrequency::Monthly => start.checked_add_months(Months::new(periods)),
        }
    }
}

impl std::fmt::Display for RepaymentFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RepaymentFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(RepaymentFrequency::Daily),
            "weekly" => Ok(RepaymentFrequency::Weekly),
            "monthly" => Ok(RepaymentFrequency::Monthly),
            other => Err(format!(
                "unknown repayment frequency '{}', expected daily, weekly or monthly",
                other
            )),
        }
    }
}

/// Loan record. Immutable once issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Loan {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub principal_amount: Decimal,
    pub interest_amount: Decimal,
    pub total_amount: Decimal,
    pub installment_amount: Decimal,
    pub number_of_installments: i32,
    pub loan_duration_days: i32,
    pub repayment_frequency: RepaymentFrequency,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request to issue a new loan
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLoanRequest {
    pub customer_id: Uuid,
    pub principal_amount: Decimal,
    pub interest_amount: Decimal,
    pub installment_amount: Decimal,
    /// Parsed by the service so an unknown value is reported as a field error
    pub repayment_frequency: String,
    pub start_date: NaiveDate,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Query for listing loans
#[derive(Debug, Default, Deserialize)]
pub struct ListLoansQuery {
    pub customer_id: Option<Uuid>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}
