/*
Date window utilities: the inclusive `[start, end]` range every search is
restricted to, and the clamp that intersects a requested range with the
corpus bounds.

Design notes:
- Dates are `YYYY-MM-DD` strings compared lexicographically. No calendar
  arithmetic happens here, and none should: the window semantics are defined
  by string order.
- Clamping never fails. An inverted window (start > end) is returned as-is
  and simply matches nothing downstream.
- Caller-supplied dates go through `normalize_date` first, which is the only
  place a calendar type is involved.
*/

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::corpus::CorpusBounds;

/// Inclusive date range used to restrict which topics may be returned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: String,
    pub end: String,
}

impl DateWindow {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// `start <= date <= end`, by string comparison.
    pub fn contains(&self, date: &str) -> bool {
        self.start.as_str() <= date && date <= self.end.as_str()
    }

    /// True when no date can satisfy the window.
    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }
}

impl From<&CorpusBounds> for DateWindow {
    fn from(b: &CorpusBounds) -> Self {
        DateWindow::new(b.start.clone(), b.end.clone())
    }
}

/// Corpus date format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, thiserror::Error)]
#[error("invalid date {input:?}: expected YYYY-MM-DD or an RFC3339 timestamp")]
pub struct DateError {
    pub input: String,
}

/// Reduce a caller-supplied date to the corpus's `YYYY-MM-DD` form.
///
/// Accepts a plain calendar date or an RFC3339 timestamp, whose own offset
/// decides the calendar day.
pub fn normalize_date(value: &str) -> Result<String, DateError> {
    let value = value.trim();
    if let Ok(d) = NaiveDate::parse_from_str(value, DATE_FORMAT) {
        return Ok(d.format(DATE_FORMAT).to_string());
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.date_naive().format(DATE_FORMAT).to_string())
        .map_err(|_| DateError {
            input: value.to_string(),
        })
}

/// Intersect a requested window with the corpus bounds.
///
/// - Missing ends default to the corresponding bound.
/// - `start = max(requested_start, bounds.start)`, `end = min(requested_end, bounds.end)`.
pub fn clamp(start: Option<&str>, end: Option<&str>, bounds: &CorpusBounds) -> DateWindow {
    let s = start.unwrap_or(bounds.start.as_str());
    let e = end.unwrap_or(bounds.end.as_str());
    DateWindow::new(
        std::cmp::max(s, bounds.start.as_str()),
        std::cmp::min(e, bounds.end.as_str()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> CorpusBounds {
        CorpusBounds {
            start: "2024-01-01".into(),
            end: "2024-04-09".into(),
        }
    }

    #[test]
    fn absent_ends_default_to_bounds() {
        let w = clamp(None, None, &bounds());
        assert_eq!(w, DateWindow::new("2024-01-01", "2024-04-09"));
    }

    #[test]
    fn requested_range_is_intersected() {
        let w = clamp(Some("2024-04-01"), Some("2024-04-30"), &bounds());
        assert_eq!(w, DateWindow::new("2024-04-01", "2024-04-09"));

        let w = clamp(Some("2023-01-01"), Some("2024-02-01"), &bounds());
        assert_eq!(w, DateWindow::new("2024-01-01", "2024-02-01"));
    }

    #[test]
    fn inverted_window_is_kept() {
        let w = clamp(Some("2024-03-01"), Some("2024-02-01"), &bounds());
        assert!(w.is_inverted());
        assert!(!w.contains("2024-02-15"));
    }

    #[test]
    fn window_entirely_after_corpus_matches_nothing() {
        let w = clamp(Some("2030-01-01"), None, &bounds());
        assert_eq!(w.start, "2030-01-01");
        assert_eq!(w.end, "2024-04-09");
        assert!(w.is_inverted());
    }

    #[test]
    fn normalize_accepts_dates_and_timestamps() {
        assert_eq!(normalize_date(" 2024-04-08 ").unwrap(), "2024-04-08");
        assert_eq!(normalize_date("2024-04-08T23:30:00-05:00").unwrap(), "2024-04-08");
        assert_eq!(normalize_date("2024-04-09T01:00:00Z").unwrap(), "2024-04-09");
    }

    #[test]
    fn normalize_rejects_garbage() {
        assert!(normalize_date("April 8").is_err());
        assert!(normalize_date("2024-13-01").is_err());
        let err = normalize_date("yesterday").unwrap_err();
        assert!(err.to_string().contains("yesterday"));
    }

    #[test]
    fn contains_is_inclusive() {
        let w = DateWindow::new("2024-04-08", "2024-04-09");
        assert!(w.contains("2024-04-08"));
        assert!(w.contains("2024-04-09"));
        assert!(!w.contains("2024-04-10"));
        assert!(!w.contains("2024-04-07"));
    }
}
