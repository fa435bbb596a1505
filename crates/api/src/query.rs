//! Shared query parameter types for API handlers.

use chrono::NaiveDate;
use serde::Deserialize;
use shopdesk_core::error::CoreError;
use shopdesk_core::reports::{period_bounds, validate_period};
use shopdesk_core::search::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT};
use shopdesk_core::types::Timestamp;

/// Generic pagination parameters (`?limit=&offset=`).
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    /// Clamped `(limit, offset)` ready for a repository call.
    pub fn resolve(&self) -> (i64, i64) {
        (
            clamp_limit(self.limit, DEFAULT_LIMIT, MAX_LIMIT),
            clamp_offset(self.offset),
        )
    }
}

/// Inclusive reporting period (`?from=2026-01-01&to=2026-01-31`).
#[derive(Debug, Deserialize)]
pub struct PeriodParams {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Convert optional inclusive dates into half-open timestamp bounds.
///
/// Either end may be open. When both are given the period is validated.
pub fn timestamp_bounds(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<(Option<Timestamp>, Option<Timestamp>), CoreError> {
    Ok(match (from, to) {
        (Some(from), Some(to)) => {
            validate_period(from, to)?;
            let (start, end) = period_bounds(from, to);
            (Some(start), Some(end))
        }
        (Some(from), None) => (Some(period_bounds(from, from).0), None),
        (None, Some(to)) => (None, Some(period_bounds(to, to).1)),
        (None, None) => (None, None),
    })
}

/// Free-text search with pagination (`?search=&limit=&offset=`).
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl SearchParams {
    /// Trimmed search term, `None` when blank.
    pub fn term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn resolve(&self) -> (i64, i64) {
        (
            clamp_limit(self.limit, DEFAULT_LIMIT, MAX_LIMIT),
            clamp_offset(self.offset),
        )
    }
}
