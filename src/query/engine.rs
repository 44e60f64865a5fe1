//! In-memory scan-and-filter query engine.
//!
//! Every query is a full scan of the candidate day files. This is a
//! deliberate simplicity/cost trade-off, not an oversight: the window is
//! capped at seven days, so a query opens at most seven files, and the
//! audit trail is an operational/compliance tool, not a high-QPS path. No
//! secondary index is built.
//!
//! Result ordering is the visible contract: oldest file first, then append
//! order within each file. No secondary sort is performed, and append order
//! is write-completion order, so records from concurrent writers are not
//! guaranteed to be timestamp-sorted within a file.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::AuditResult;
use crate::record::AuditRecord;
use crate::store::AuditFileStore;

use super::criteria::QueryCriteria;
use super::response::QueryResponse;

/// A filtered, paginated slice of records plus the total match count.
#[derive(Debug)]
pub struct QueryOutcome {
    /// The requested page, in scan order.
    pub records: Vec<AuditRecord>,
    /// Count of records passing the filters, before pagination.
    pub total: usize,
}

/// Executes validated queries against the file store.
pub struct AuditLogQueryEngine {
    store: Arc<AuditFileStore>,
}

impl AuditLogQueryEngine {
    pub fn new(store: Arc<AuditFileStore>) -> Self {
        Self { store }
    }

    /// Run a query and return the matching page of full records.
    ///
    /// Criteria are validated before any file is opened. A line that fails
    /// to decode is skipped with a warning; it never fails the query. An
    /// empty result set is a success with `total == 0`.
    pub fn query(&self, criteria: &QueryCriteria) -> AuditResult<QueryOutcome> {
        criteria.validate()?;
        let (start, end) = criteria.window();

        let mut matched = Vec::new();
        for path in self.store.files_in_range(start, end) {
            for line in self.store.read_file(&path)? {
                let record: AuditRecord = match serde_json::from_str(&line) {
                    Ok(record) => record,
                    Err(e) => {
                        warn!(
                            path = %path.display(),
                            error = %e,
                            "Skipping undecodable audit line"
                        );
                        continue;
                    }
                };
                if criteria.matches(&record) {
                    matched.push(record);
                }
            }
        }

        let total = matched.len();
        let records: Vec<AuditRecord> = matched
            .into_iter()
            .skip(criteria.offset())
            .take(criteria.limit())
            .collect();

        debug!(total, returned = records.len(), "Audit query complete");
        Ok(QueryOutcome { records, total })
    }

    /// Run a query and shape the result for external callers.
    pub fn query_response(&self, criteria: &QueryCriteria) -> AuditResult<QueryResponse> {
        let outcome = self.query(criteria)?;
        Ok(QueryResponse::from_outcome(
            outcome,
            criteria.limit(),
            criteria.offset(),
        ))
    }
}
