//! Loan Ledger Engine
//!
//! Pure computations that turn stored loan and payment records into the
//! figures every surface displays: loan summaries, customer ledgers, the
//! portfolio dashboard and the daily collection list. Nothing here touches
//! the store or the clock; "today" is always an argument, so the same inputs
//! give the same output on every call.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::customer::Customer;
use crate::loan::{Loan, RepaymentFrequency};
use crate::payment::Payment;
use crate::services::money::{
    floor_zero, in_money_range, max_amount, round_money, sub_money, sum_money,
};

/// Upper bound on installments per loan
pub const MAX_INSTALLMENTS: i32 = 10_000;

// ============================================================================
// Errors
// ============================================================================

/// Ledger errors, one kind per failure category
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("{entity} {id} does not exist")]
    Referential { entity: &'static str, id: Uuid },

    #[error("payment {payment_id} belongs to loan {found}, not loan {expected}")]
    PaymentLoanMismatch {
        payment_id: Uuid,
        expected: Uuid,
        found: Uuid,
    },

    #[error("{field} is outside the supported date range")]
    DateOutOfRange { field: &'static str },

    #[error("{field} is outside the supported amount range")]
    AmountOverflow { field: &'static str },
}

impl LedgerError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        LedgerError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Reject an amount too large for a money column
pub fn check_amount(field: &str, amount: Decimal) -> Result<(), LedgerError> {
    if in_money_range(amount) {
        Ok(())
    } else {
        Err(LedgerError::validation(
            field,
            format!("must be less than {}", max_amount()),
        ))
    }
}

fn total_of<I>(field: &'static str, amounts: I) -> Result<Decimal, LedgerError>
where
    I: IntoIterator<Item = Decimal>,
{
    sum_money(amounts).ok_or(LedgerError::AmountOverflow { field })
}

// ============================================================================
// Data Models
// ============================================================================

/// Repayment status of a loan
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Active,
    Completed,
}

/// Validated terms of a loan application, before it is issued
#[derive(Debug, Clone, PartialEq)]
pub struct LoanApplication {
    pub customer_id: Uuid,
    pub principal_amount: Decimal,
    pub interest_amount: Decimal,
    pub installment_amount: Decimal,
    pub repayment_frequency: RepaymentFrequency,
    pub start_date: NaiveDate,
    pub notes: Option<String>,
}

/// Figures fixed at loan creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanTerms {
    pub total_amount: Decimal,
    pub number_of_installments: i32,
    pub end_date: NaiveDate,
    pub loan_duration_days: i32,
}

/// Derived state of one loan
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LoanSummary {
    pub loan_id: Uuid,
    pub customer_id: Uuid,
    pub principal_amount: Decimal,
    pub interest_amount: Decimal,
    pub total_amount: Decimal,
    pub installment_amount: Decimal,
    pub number_of_installments: i32,
    pub repayment_frequency: RepaymentFrequency,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_paid: Decimal,
    pub remaining: Decimal,
    /// Amount paid beyond `total_amount`; held on the loan, never redistributed
    pub excess_paid: Decimal,
    pub installments_paid: i32,
    pub installments_remaining: i32,
    pub next_due_date: Option<NaiveDate>,
    pub overdue_days: i64,
    pub is_overdue: bool,
    pub last_payment_date: Option<NaiveDate>,
    pub status: LoanStatus,
}

/// One payment line inside a ledger entry
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LedgerPayment {
    pub payment_id: Uuid,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub collector_id: Option<Uuid>,
    pub notes: Option<String>,
    /// Remaining balance after this payment, floored at zero
    pub balance_after: Decimal,
}

/// A loan as shown in a customer's ledger
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LedgerEntry {
    /// 1-based position in start-date order
    pub loan_number: u32,
    #[serde(flatten)]
    pub summary: LoanSummary,
    pub payments: Vec<LedgerPayment>,
}

/// Full ledger of one customer
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CustomerLedgerResponse {
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub total_borrowed: Decimal,
    pub total_paid: Decimal,
    pub total_remaining: Decimal,
    pub ledger: Vec<LedgerEntry>,
}

/// Portfolio aggregate for the dashboard
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DashboardSummary {
    pub as_of: NaiveDate,
    pub total_customers: i64,
    pub total_loans: i64,
    pub active_loans: i64,
    pub completed_loans: i64,
    pub total_issued: Decimal,
    pub collected: Decimal,
    pub pending: Decimal,
    pub due_today: i64,
    pub overdue: i64,
    pub today_collection: Decimal,
}

/// A payment collected on a given business day
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CollectionItem {
    pub payment_id: Uuid,
    pub loan_id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub installment_amount: Decimal,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

// ============================================================================
// Loan creation
// ============================================================================

/// Derive the fixed terms of a loan from its application.
///
/// Amounts are expected at ledger precision already; this checks their
/// ranges (each amount, and the total, below [`max_amount`]) and computes
/// `total_amount`, `number_of_installments` and the schedule end date.
pub fn plan_loan(application: &LoanApplication) -> Result<LoanTerms, LedgerError> {
    if application.principal_amount <= Decimal::ZERO {
        return Err(LedgerError::validation(
            "principal_amount",
            "must be greater than 0",
        ));
    }
    if application.interest_amount.is_sign_negative() {
        return Err(LedgerError::validation(
            "interest_amount",
            "must not be negative",
        ));
    }
    if application.installment_amount <= Decimal::ZERO {
        return Err(LedgerError::validation(
            "installment_amount",
            "must be greater than 0",
        ));
    }

    check_amount("principal_amount", application.principal_amount)?;
    check_amount("interest_amount", application.interest_amount)?;
    check_amount("installment_amount", application.installment_amount)?;

    let total_amount = application
        .principal_amount
        .checked_add(application.interest_amount)
        .map(round_money)
        .filter(|total| in_money_range(*total))
        .ok_or_else(|| {
            LedgerError::validation(
                "interest_amount",
                format!("principal plus interest must be less than {}", max_amount()),
            )
        })?;

    let number_of_installments = total_amount
        .checked_div(application.installment_amount)
        .and_then(|n| n.ceil().to_i32())
        .filter(|n| (1..=MAX_INSTALLMENTS).contains(n))
        .ok_or_else(|| {
            LedgerError::validation(
                "installment_amount",
                format!("results in more than {} installments", MAX_INSTALLMENTS),
            )
        })?;

    let end_date = application
        .repayment_frequency
        .advance(application.start_date, number_of_installments as u32)
        .ok_or(LedgerError::DateOutOfRange { field: "end_date" })?;

    let loan_duration_days = (end_date - application.start_date)
        .num_days()
        .to_i32()
        .ok_or(LedgerError::DateOutOfRange { field: "end_date" })?;

    Ok(LoanTerms {
        total_amount,
        number_of_installments,
        end_date,
        loan_duration_days,
    })
}

// ============================================================================
// Loan summary
// ============================================================================

/// Compute the derived state of one loan from its payments.
///
/// Every payment must reference `loan`; a foreign payment is an integrity
/// fault and is reported, not skipped.
pub fn compute_loan_summary(
    loan: &Loan,
    payments: &[Payment],
    today: NaiveDate,
) -> Result<LoanSummary, LedgerError> {
    let mut refs: Vec<&Payment> = payments.iter().collect();
    sort_payments(&mut refs);
    summarize(loan, &refs, today)
}

fn summarize(
    loan: &Loan,
    payments: &[&Payment],
    today: NaiveDate,
) -> Result<LoanSummary, LedgerError> {
    if let Some(foreign) = payments.iter().find(|p| p.loan_id != loan.id) {
        return Err(LedgerError::PaymentLoanMismatch {
            payment_id: foreign.id,
            expected: loan.id,
            found: foreign.loan_id,
        });
    }
    if loan.installment_amount <= Decimal::ZERO {
        return Err(LedgerError::validation(
            "installment_amount",
            "must be greater than 0",
        ));
    }

    let total_amount = round_money(loan.total_amount);
    let total_paid = total_of("total_paid", payments.iter().map(|p| p.paid_amount))?;
    let remaining = floor_zero(
        sub_money(total_amount, total_paid).ok_or(LedgerError::AmountOverflow {
            field: "remaining",
        })?,
    );
    let excess_paid = floor_zero(
        sub_money(total_paid, total_amount).ok_or(LedgerError::AmountOverflow {
            field: "excess_paid",
        })?,
    );
    let settled = remaining.is_zero();

    let installments_total = loan.number_of_installments.max(0);
    let installments_paid = if settled {
        installments_total
    } else {
        total_paid
            .checked_div(loan.installment_amount)
            .and_then(|n| n.floor().to_i32())
            .unwrap_or(installments_total)
            .clamp(0, installments_total)
    };
    let installments_remaining = installments_total - installments_paid;

    let next_due_date = if settled || installments_remaining == 0 {
        None
    } else {
        let periods = (installments_paid + 1) as u32;
        Some(
            loan.repayment_frequency
                .advance(loan.start_date, periods)
                .ok_or(LedgerError::DateOutOfRange {
                    field: "next_due_date",
                })?,
        )
    };

    let overdue_days = next_due_date
        .map(|due| (today - due).num_days().max(0))
        .unwrap_or(0);

    let last_payment_date = payments.iter().map(|p| p.payment_date).max();

    Ok(LoanSummary {
        loan_id: loan.id,
        customer_id: loan.customer_id,
        principal_amount: round_money(loan.principal_amount),
        interest_amount: round_money(loan.interest_amount),
        total_amount,
        installment_amount: round_money(loan.installment_amount),
        number_of_installments: installments_total,
        repayment_frequency: loan.repayment_frequency,
        start_date: loan.start_date,
        end_date: loan.end_date,
        total_paid,
        remaining,
        excess_paid,
        installments_paid,
        installments_remaining,
        next_due_date,
        overdue_days,
        is_overdue: overdue_days > 0,
        last_payment_date,
        status: if settled {
            LoanStatus::Completed
        } else {
            LoanStatus::Active
        },
    })
}

/// Payments in ledger order: payment date, then creation order
pub fn sort_payments(payments: &mut [&Payment]) {
    payments.sort_by(|a, b| {
        a.payment_date
            .cmp(&b.payment_date)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.seq.cmp(&b.seq))
    });
}

// ============================================================================
// Customer ledger
// ============================================================================

/// Build a customer's ledger.
///
/// Only loans owned by `customer` are included, ordered by start date (then
/// creation time) and numbered from 1. Payments are listed oldest first with
/// the balance left after each.
pub fn compute_customer_ledger(
    customer: &Customer,
    loans: &[Loan],
    payments_by_loan: &HashMap<Uuid, Vec<Payment>>,
    today: NaiveDate,
) -> Result<CustomerLedgerResponse, LedgerError> {
    let mut owned: Vec<&Loan> = loans
        .iter()
        .filter(|loan| loan.customer_id == customer.id)
        .collect();
    owned.sort_by(|a, b| {
        a.start_date
            .cmp(&b.start_date)
            .then(a.created_at.cmp(&b.created_at))
    });

    let mut ledger = Vec::with_capacity(owned.len());
    for (index, loan) in owned.into_iter().enumerate() {
        let mut payments: Vec<&Payment> = payments_by_loan
            .get(&loan.id)
            .map(|ps| ps.iter().collect())
            .unwrap_or_default();
        sort_payments(&mut payments);

        let summary = summarize(loan, &payments, today)?;

        let mut paid_so_far = Decimal::ZERO;
        let mut lines = Vec::with_capacity(payments.len());
        for p in &payments {
            let overflow = LedgerError::AmountOverflow {
                field: "balance_after",
            };
            paid_so_far = paid_so_far.checked_add(p.paid_amount).ok_or(overflow.clone())?;
            let balance = sub_money(summary.total_amount, paid_so_far).ok_or(overflow)?;
            lines.push(LedgerPayment {
                payment_id: p.id,
                amount: round_money(p.paid_amount),
                date: p.payment_date,
                collector_id: p.collector_id,
                notes: p.notes.clone(),
                balance_after: floor_zero(balance),
            });
        }

        ledger.push(LedgerEntry {
            loan_number: index as u32 + 1,
            summary,
            payments: lines,
        });
    }

    Ok(CustomerLedgerResponse {
        customer_id: customer.id,
        customer_name: customer.name.clone(),
        customer_phone: customer.phone.clone(),
        total_borrowed: total_of(
            "total_borrowed",
            ledger.iter().map(|e| e.summary.total_amount),
        )?,
        total_paid: total_of("total_paid", ledger.iter().map(|e| e.summary.total_paid))?,
        total_remaining: total_of(
            "total_remaining",
            ledger.iter().map(|e| e.summary.remaining),
        )?,
        ledger,
    })
}

// ============================================================================
// Portfolio views
// ============================================================================

/// Group payments by loan, rejecting any payment whose loan is unknown
fn group_payments<'a>(
    loans: &[Loan],
    payments: &'a [Payment],
) -> Result<HashMap<Uuid, Vec<&'a Payment>>, LedgerError> {
    let mut grouped: HashMap<Uuid, Vec<&Payment>> =
        loans.iter().map(|loan| (loan.id, Vec::new())).collect();

    for payment in payments {
        match grouped.get_mut(&payment.loan_id) {
            Some(bucket) => bucket.push(payment),
            None => {
                return Err(LedgerError::Referential {
                    entity: "loan",
                    id: payment.loan_id,
                })
            }
        }
    }

    Ok(grouped)
}

fn index_customers(customers: &[Customer]) -> HashMap<Uuid, &Customer> {
    customers.iter().map(|c| (c.id, c)).collect()
}

/// Summaries for every loan, in input order
pub fn compute_loan_summaries(
    loans: &[Loan],
    payments: &[Payment],
    today: NaiveDate,
) -> Result<Vec<LoanSummary>, LedgerError> {
    let grouped = group_payments(loans, payments)?;
    loans
        .iter()
        .map(|loan| {
            let ps = grouped.get(&loan.id).map(Vec::as_slice).unwrap_or(&[]);
            summarize(loan, ps, today)
        })
        .collect()
}

/// Aggregate the whole portfolio as of `today`.
///
/// `today_collection` and `due_today` compare calendar dates, so `today`
/// must already be expressed in the business timezone.
pub fn compute_dashboard_summary(
    customers: &[Customer],
    loans: &[Loan],
    payments: &[Payment],
    today: NaiveDate,
) -> Result<DashboardSummary, LedgerError> {
    let by_id = index_customers(customers);
    if let Some(orphan) = loans.iter().find(|l| !by_id.contains_key(&l.customer_id)) {
        return Err(LedgerError::Referential {
            entity: "customer",
            id: orphan.customer_id,
        });
    }

    let summaries = compute_loan_summaries(loans, payments, today)?;

    let active_loans = summaries
        .iter()
        .filter(|s| s.remaining > Decimal::ZERO)
        .count() as i64;
    let total_issued = total_of("total_issued", summaries.iter().map(|s| s.total_amount))?;
    let collected = total_of("collected", summaries.iter().map(|s| s.total_paid))?;
    let pending = total_of("pending", summaries.iter().map(|s| s.remaining))?;
    let due_today = summaries
        .iter()
        .filter(|s| s.next_due_date == Some(today))
        .count() as i64;
    let overdue = summaries.iter().filter(|s| s.overdue_days > 0).count() as i64;
    let today_collection = total_of(
        "today_collection",
        payments
            .iter()
            .filter(|p| p.payment_date == today)
            .map(|p| p.paid_amount),
    )?;

    Ok(DashboardSummary {
        as_of: today,
        total_customers: customers.len() as i64,
        total_loans: summaries.len() as i64,
        active_loans,
        completed_loans: summaries.len() as i64 - active_loans,
        total_issued,
        collected,
        pending,
        due_today,
        overdue,
        today_collection,
    })
}

/// Payments dated `day`, most recently recorded first
pub fn collections_on(
    customers: &[Customer],
    loans: &[Loan],
    payments: &[Payment],
    day: NaiveDate,
) -> Result<Vec<CollectionItem>, LedgerError> {
    let by_customer = index_customers(customers);
    let by_loan: HashMap<Uuid, &Loan> = loans.iter().map(|l| (l.id, l)).collect();

    let mut items = Vec::new();
    for payment in payments.iter().filter(|p| p.payment_date == day) {
        let loan = by_loan.get(&payment.loan_id).ok_or(LedgerError::Referential {
            entity: "loan",
            id: payment.loan_id,
        })?;
        let customer = by_customer
            .get(&loan.customer_id)
            .ok_or(LedgerError::Referential {
                entity: "customer",
                id: loan.customer_id,
            })?;

        items.push(CollectionItem {
            payment_id: payment.id,
            loan_id: loan.id,
            customer_id: customer.id,
            customer_name: customer.name.clone(),
            customer_phone: customer.phone.clone(),
            installment_amount: round_money(loan.installment_amount),
            amount: round_money(payment.paid_amount),
            payment_date: payment.payment_date,
            notes: payment.notes.clone(),
            recorded_at: payment.created_at,
        });
    }

    items.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
    Ok(items)
}

/// Loans with at least one overdue day, most overdue first
pub fn overdue_loans(
    loans: &[Loan],
    payments: &[Payment],
    today: NaiveDate,
) -> Result<Vec<LoanSummary>, LedgerError> {
    let mut overdue: Vec<LoanSummary> = compute_loan_summaries(loans, payments, today)?
        .into_iter()
        .filter(|s| s.overdue_days > 0)
        .collect();
    overdue.sort_by(|a, b| {
        b.overdue_days
            .cmp(&a.overdue_days)
            .then(a.start_date.cmp(&b.start_date))
    });
    Ok(overdue)
}
