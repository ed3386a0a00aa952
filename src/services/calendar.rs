//! Business calendar
//!
//! "Today" is always a calendar date in the configured business timezone.
//! The ledger engine never reads a clock; callers resolve the date here and
//! pass it in.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Resolves calendar dates in the business timezone
#[derive(Debug, Clone, Copy)]
pub struct BusinessCalendar {
    timezone: Tz,
}

impl BusinessCalendar {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    /// Calendar using UTC day boundaries
    pub fn utc() -> Self {
        Self::new(Tz::UTC)
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Current business date
    pub fn today(&self) -> NaiveDate {
        self.date_of(Utc::now())
    }

    /// Business date containing the given instant
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.timezone).date_naive()
    }

    /// Explicit `as_of` date when supplied, otherwise today
    pub fn resolve(&self, as_of: Option<NaiveDate>) -> NaiveDate {
        as_of.unwrap_or_else(|| self.today())
    }
}

impl Default for BusinessCalendar {
    fn default() -> Self {
        Self::utc()
    }
}
