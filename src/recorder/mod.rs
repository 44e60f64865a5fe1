//! Write path and retention scheduling.
//!
//! The recorder masks and durably appends fully-formed records; the sweeper
//! is the owned background task that deletes day files past retention.

mod sweeper;
mod writer;

pub use sweeper::{next_run_after, RetentionSweeper};
pub use writer::AuditLogRecorder;
