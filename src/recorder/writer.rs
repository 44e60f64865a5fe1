//! Durable write path for audit records.

use std::sync::Arc;

use tracing::debug;

use crate::error::AuditResult;
use crate::mask::SensitiveDataMasker;
use crate::record::AuditRecord;
use crate::store::AuditFileStore;

/// Accepts fully-formed records, masks their free-form payloads and hands
/// them to the store for durable append.
///
/// The recorder assigns nothing: id and timestamp were set by the caller at
/// the moment of the audited event, so causal ordering survives even if the
/// write is retried. A storage failure propagates to the caller as a typed
/// error and is never a silent no-op; whether to log-and-continue or alert
/// is the caller's decision, and an audit-write failure never rolls back
/// the business operation that triggered it.
pub struct AuditLogRecorder {
    store: Arc<AuditFileStore>,
    masker: SensitiveDataMasker,
}

impl AuditLogRecorder {
    pub fn new(store: Arc<AuditFileStore>, masker: SensitiveDataMasker) -> Self {
        Self { store, masker }
    }

    /// Mask, serialize and append one record to its UTC day file.
    pub fn record(&self, mut record: AuditRecord) -> AuditResult<()> {
        if let Some(params) = &record.query_params {
            record.query_params = Some(self.masker.mask(params));
        }
        if let Some(body) = &record.request_body {
            record.request_body = Some(self.masker.mask(body));
        }

        let line = serde_json::to_string(&record)?;
        self.store.append(record.timestamp.date_naive(), &line)?;

        debug!(
            id = %record.id,
            method = %record.method,
            path = %record.path,
            status = record.status_code,
            "Audit record appended"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::MASK_TOKEN;
    use crate::record::HttpMethod;
    use chrono::NaiveDate;
    use serde_json::json;
    use tempfile::TempDir;

    fn recorder(dir: &std::path::Path) -> (AuditLogRecorder, Arc<AuditFileStore>) {
        let store = Arc::new(AuditFileStore::new(dir));
        (
            AuditLogRecorder::new(Arc::clone(&store), SensitiveDataMasker::new()),
            store,
        )
    }

    #[test]
    fn test_record_masks_payloads_before_write() {
        let temp_dir = TempDir::new().unwrap();
        let (recorder, store) = recorder(temp_dir.path());

        let mut record = AuditRecord::new("ops", HttpMethod::Post, "/api/login", 200, "req-1")
            .with_query_params(json!({"token": "abc"}))
            .with_request_body(json!({"password": "x", "shopId": 1}));
        record.timestamp = NaiveDate::from_ymd_opt(2025, 10, 6)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
            .and_utc();

        recorder.record(record).unwrap();

        let lines = store
            .read_file(&store.path_for_date(NaiveDate::from_ymd_opt(2025, 10, 6).unwrap()))
            .unwrap();
        assert_eq!(lines.len(), 1);
        let stored: AuditRecord = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(stored.request_body.as_ref().unwrap()["password"], MASK_TOKEN);
        assert_eq!(stored.request_body.as_ref().unwrap()["shopId"], 1);
        assert_eq!(stored.query_params.as_ref().unwrap()["token"], MASK_TOKEN);
    }

    #[test]
    fn test_record_partitions_by_utc_day_of_timestamp() {
        let temp_dir = TempDir::new().unwrap();
        let (recorder, store) = recorder(temp_dir.path());

        // 23:59 and next day 00:01 must land in different files.
        let mut late = AuditRecord::new("ops", HttpMethod::Put, "/a", 200, "r1");
        late.timestamp = NaiveDate::from_ymd_opt(2025, 10, 6)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap()
            .and_utc();
        let mut early = AuditRecord::new("ops", HttpMethod::Put, "/a", 200, "r2");
        early.timestamp = NaiveDate::from_ymd_opt(2025, 10, 7)
            .unwrap()
            .and_hms_opt(0, 1, 0)
            .unwrap()
            .and_utc();

        recorder.record(late).unwrap();
        recorder.record(early).unwrap();

        let day6 = store
            .read_file(&store.path_for_date(NaiveDate::from_ymd_opt(2025, 10, 6).unwrap()))
            .unwrap();
        let day7 = store
            .read_file(&store.path_for_date(NaiveDate::from_ymd_opt(2025, 10, 7).unwrap()))
            .unwrap();
        assert_eq!(day6.len(), 1);
        assert_eq!(day7.len(), 1);
    }

    #[test]
    fn test_storage_failure_propagates() {
        // A file where the directory should be makes every append fail.
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("audit");
        std::fs::write(&blocker, "not a directory").unwrap();

        let (recorder, _) = recorder(&blocker);
        let record = AuditRecord::new("ops", HttpMethod::Delete, "/a", 204, "r1");
        match recorder.record(record) {
            Err(crate::error::AuditError::Storage { message }) => {
                assert!(message.contains("audit"));
            }
            other => panic!("expected Storage error, got {:?}", other),
        }
    }
}
