//! Query criteria and their validation.

use chrono::{Days, NaiveDate, Utc};

use crate::error::{AuditError, AuditResult, QueryErrorKind};
use crate::record::{AuditRecord, HttpMethod};

/// Maximum span of the inclusive date window, in days.
pub const MAX_RANGE_DAYS: i64 = 7;

/// Minimum page size.
pub const MIN_LIMIT: usize = 1;

/// Maximum page size.
pub const MAX_LIMIT: usize = 100;

/// Page size used when the caller does not supply one.
pub const DEFAULT_LIMIT: usize = 50;

/// Filters, date window and pagination for one audit query.
///
/// Ephemeral and never persisted. All filters are AND-combined: `operator`
/// and `path` are substring matches, the rest are exact. Omitted dates
/// default to the last [`MAX_RANGE_DAYS`] days ending today (UTC).
#[derive(Debug, Clone, Default)]
pub struct QueryCriteria {
    /// Substring match against the record's operator.
    pub operator: Option<String>,
    /// Substring match against the record's path.
    pub path: Option<String>,
    /// Exact match against the record's page tag.
    pub page: Option<String>,
    /// Exact match against the record's action tag.
    pub action: Option<String>,
    /// Exact match against the record's method.
    pub method: Option<HttpMethod>,
    /// Exact match against the record's status code.
    pub status_code: Option<u16>,
    /// Start of the inclusive date window (UTC).
    pub start_date: Option<NaiveDate>,
    /// End of the inclusive date window (UTC).
    pub end_date: Option<NaiveDate>,
    /// Page size, [`MIN_LIMIT`]..=[`MAX_LIMIT`].
    pub limit: Option<usize>,
    /// Records to skip before the page starts.
    pub offset: Option<usize>,
}

impl QueryCriteria {
    /// Validate the criteria without touching disk.
    ///
    /// Rejects an inverted window, a window wider than [`MAX_RANGE_DAYS`]
    /// and a limit outside [`MIN_LIMIT`]..=[`MAX_LIMIT`]. The offset is
    /// unsigned and needs no lower-bound check.
    pub fn validate(&self) -> AuditResult<()> {
        let (start, end) = self.window();

        if end < start {
            return Err(AuditError::Query {
                kind: QueryErrorKind::InvertedRange { start, end },
            });
        }

        let days = (end - start).num_days();
        if days > MAX_RANGE_DAYS {
            return Err(AuditError::Query {
                kind: QueryErrorKind::RangeTooWide {
                    days,
                    max: MAX_RANGE_DAYS,
                },
            });
        }

        if let Some(limit) = self.limit {
            if !(MIN_LIMIT..=MAX_LIMIT).contains(&limit) {
                return Err(AuditError::Query {
                    kind: QueryErrorKind::LimitOutOfRange {
                        limit,
                        min: MIN_LIMIT,
                        max: MAX_LIMIT,
                    },
                });
            }
        }

        Ok(())
    }

    /// The effective inclusive date window, defaults resolved.
    pub fn window(&self) -> (NaiveDate, NaiveDate) {
        let end = self.end_date.unwrap_or_else(|| Utc::now().date_naive());
        let start = self.start_date.unwrap_or_else(|| {
            end.checked_sub_days(Days::new(MAX_RANGE_DAYS as u64))
                .unwrap_or(NaiveDate::MIN)
        });
        (start, end)
    }

    /// The effective page size.
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    /// The effective offset.
    pub fn offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }

    /// Whether a decoded record passes every supplied filter.
    pub fn matches(&self, record: &AuditRecord) -> bool {
        if let Some(operator) = &self.operator {
            if !record.operator.contains(operator.as_str()) {
                return false;
            }
        }
        if let Some(path) = &self.path {
            if !record.path.contains(path.as_str()) {
                return false;
            }
        }
        if let Some(page) = &self.page {
            if record.page.as_deref() != Some(page.as_str()) {
                return false;
            }
        }
        if let Some(action) = &self.action {
            if record.action.as_deref() != Some(action.as_str()) {
                return false;
            }
        }
        if let Some(method) = self.method {
            if record.method != method {
                return false;
            }
        }
        if let Some(status_code) = self.status_code {
            if record.status_code != status_code {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuditError;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn criteria(start: NaiveDate, end: NaiveDate) -> QueryCriteria {
        QueryCriteria {
            start_date: Some(start),
            end_date: Some(end),
            ..QueryCriteria::default()
        }
    }

    #[test]
    fn test_default_window_is_last_seven_days() {
        let c = QueryCriteria::default();
        let (start, end) = c.window();
        assert_eq!((end - start).num_days(), MAX_RANGE_DAYS);
        assert_eq!(end, Utc::now().date_naive());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_inverted_range_rejected() {
        let c = criteria(date(2025, 10, 10), date(2025, 10, 1));
        match c.validate() {
            Err(AuditError::Query {
                kind: QueryErrorKind::InvertedRange { .. },
            }) => {}
            other => panic!("expected InvertedRange, got {:?}", other),
        }
    }

    #[test]
    fn test_ten_day_span_rejected() {
        let c = criteria(date(2025, 10, 1), date(2025, 10, 10));
        match c.validate() {
            Err(AuditError::Query {
                kind: QueryErrorKind::RangeTooWide { days: 9, max: 7 },
            }) => {}
            other => panic!("expected RangeTooWide, got {:?}", other),
        }
    }

    #[test]
    fn test_seven_day_span_accepted() {
        let c = criteria(date(2025, 10, 1), date(2025, 10, 8));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_limit_bounds() {
        let mut c = criteria(date(2025, 10, 1), date(2025, 10, 2));
        for limit in [0usize, 101, 1000] {
            c.limit = Some(limit);
            assert!(c.validate().is_err(), "limit {limit} should be rejected");
        }
        for limit in [1usize, 50, 100] {
            c.limit = Some(limit);
            assert!(c.validate().is_ok(), "limit {limit} should be accepted");
        }
    }

    #[test]
    fn test_matches_filters() {
        let record = AuditRecord::new(
            "alice@example.com",
            HttpMethod::Put,
            "/api/shops/42",
            200,
            "req-1",
        )
        .with_context("shops", "update");

        let mut c = QueryCriteria {
            operator: Some("alice".into()),
            path: Some("/shops".into()),
            ..QueryCriteria::default()
        };
        assert!(c.matches(&record));

        c.method = Some(HttpMethod::Delete);
        assert!(!c.matches(&record));
        c.method = Some(HttpMethod::Put);
        assert!(c.matches(&record));

        c.page = Some("shop".into()); // exact, not substring
        assert!(!c.matches(&record));
        c.page = Some("shops".into());
        c.status_code = Some(200);
        assert!(c.matches(&record));
    }
}
