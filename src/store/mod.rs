//! Day-partitioned file storage for audit records.
//!
//! Owns all file-path construction and date arithmetic for the audit
//! directory: one append-only JSONL file per UTC calendar day, enumerated
//! for bounded range reads and deleted wholesale once past retention.

mod files;

pub use files::{AuditFileStore, AUDIT_FILE_EXTENSION, AUDIT_FILE_PREFIX};
