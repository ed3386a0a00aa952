//! Ledger computations and the read-side service built on them

pub mod calendar;
pub mod ledger;
pub mod ledger_engine;
pub mod money;

pub use calendar::BusinessCalendar;
pub use ledger::{LedgerService, LoanOverview, TodayCollectionReport};
