//! Query path for the audit trail.
//!
//! Validates query criteria, scans the candidate day files, applies
//! in-memory filtering and pagination, and shapes the caller-facing
//! response.

mod criteria;
mod engine;
mod response;

pub use criteria::{QueryCriteria, DEFAULT_LIMIT, MAX_LIMIT, MAX_RANGE_DAYS, MIN_LIMIT};
pub use engine::{AuditLogQueryEngine, QueryOutcome};
pub use response::{AuditRecordView, Pagination, QueryResponse, RequestMetadata};
