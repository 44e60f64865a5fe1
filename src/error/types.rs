//! Error types for the audit trail.

use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for audit operations.
#[derive(Error, Debug)]
pub enum AuditError {
    /// Configuration-related errors.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The audit directory or one of its files cannot be created, opened,
    /// written, or read. Never silently swallowed on the write path.
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Query criteria rejected before any file I/O.
    #[error("Invalid query: {kind}")]
    Query { kind: QueryErrorKind },

    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Query validation error kinds.
///
/// Each kind names the offending field(s) and the constraint violated, so
/// callers can surface a precise rejection without re-validating.
#[derive(Error, Debug)]
pub enum QueryErrorKind {
    #[error("endDate {end} is earlier than startDate {start}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    #[error("date range spans {days} days, maximum is {max}")]
    RangeTooWide { days: i64, max: i64 },

    #[error("limit {limit} outside allowed range {min}..={max}")]
    LimitOutOfRange { limit: usize, min: usize, max: usize },
}

/// Result type alias for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;
