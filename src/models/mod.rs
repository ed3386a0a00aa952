//! Shared request and response models for the HTTP surface

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod auth;
pub use auth::*;

/// Default page size for list endpoints
pub const DEFAULT_PAGE_LIMIT: i64 = 100;

/// Largest page a caller may request
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// Resolve optional `skip`/`limit` query values into store bounds
pub fn page_bounds(skip: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let skip = skip.unwrap_or(0).max(0);
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(0, MAX_PAGE_LIMIT);
    (skip, limit)
}

/// Optional business date override for "today"-dependent reads
#[derive(Debug, Default, Deserialize)]
pub struct AsOfQuery {
    pub as_of: Option<NaiveDate>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_bounds_defaults_and_clamps() {
        assert_eq!(page_bounds(None, None), (0, DEFAULT_PAGE_LIMIT));
        assert_eq!(page_bounds(Some(-5), Some(10)), (0, 10));
        assert_eq!(page_bounds(Some(20), Some(5000)), (20, MAX_PAGE_LIMIT));
    }
}
