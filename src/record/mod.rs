//! Audit record types.
//!
//! Defines the wire format of audit log entries: one serialized record per
//! line in a day-partitioned JSONL file. Field names are camelCase on the
//! wire; unknown fields are ignored on read and optional fields may be
//! missing, so older files remain readable as the record grows.

mod types;

pub use types::{timestamp_millis, AuditRecord, HttpMethod};
