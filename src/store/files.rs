//! Filesystem operations for day-partitioned audit files.

use std::ffi::OsStr;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{Days, NaiveDate, Utc};
use tracing::{debug, warn};

use crate::error::{AuditError, AuditResult};

/// Filename prefix for audit partition files.
pub const AUDIT_FILE_PREFIX: &str = "audit-";

/// Filename extension for audit partition files.
pub const AUDIT_FILE_EXTENSION: &str = "jsonl";

/// Store managing the audit directory.
///
/// Day-partitioning bounds the cost of a bounded-range query to one file
/// open per day and makes retention a cheap whole-file delete instead of a
/// line-level rewrite. All date arithmetic is UTC; local time is never used
/// for file naming, so writers in different host timezones agree on file
/// boundaries.
pub struct AuditFileStore {
    dir: PathBuf,
}

impl AuditFileStore {
    /// Create a store rooted at `dir`. The directory is created lazily on
    /// first write, not here.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The audit directory root.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the audit directory if it does not exist. Idempotent.
    pub fn ensure_directory(&self) -> AuditResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| AuditError::Storage {
            message: format!(
                "failed to create audit directory '{}': {}",
                self.dir.display(),
                e
            ),
        })
    }

    /// Deterministic mapping from a UTC calendar day to its partition file.
    pub fn path_for_date(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!(
            "{}{}.{}",
            AUDIT_FILE_PREFIX,
            date.format("%Y%m%d"),
            AUDIT_FILE_EXTENSION
        ))
    }

    /// Parse the date encoded in a partition filename.
    ///
    /// Returns `None` for any name that does not match the expected pattern,
    /// so unrelated files sharing the directory are ignored.
    pub fn date_from_filename(name: &OsStr) -> Option<NaiveDate> {
        let name = name.to_str()?;
        let stem = name
            .strip_prefix(AUDIT_FILE_PREFIX)?
            .strip_suffix(&format!(".{}", AUDIT_FILE_EXTENSION))?;
        // Exactly eight digits; chrono alone would accept shorter stems.
        if stem.len() != 8 || !stem.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        NaiveDate::parse_from_str(stem, "%Y%m%d").ok()
    }

    /// Append one serialized record to the file for `date`.
    ///
    /// The file is opened in create-if-absent append mode and the line plus
    /// terminator goes out as a single write, so concurrent appenders never
    /// interleave partial lines (O_APPEND atomicity at line granularity).
    /// Open or write failure surfaces as [`AuditError::Storage`].
    pub fn append(&self, date: NaiveDate, serialized_record: &str) -> AuditResult<()> {
        self.ensure_directory()?;
        let path = self.path_for_date(date);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| AuditError::Storage {
                message: format!("failed to open '{}' for append: {}", path.display(), e),
            })?;

        let mut line = String::with_capacity(serialized_record.len() + 1);
        line.push_str(serialized_record);
        line.push('\n');
        file.write_all(line.as_bytes())
            .map_err(|e| AuditError::Storage {
                message: format!("failed to append to '{}': {}", path.display(), e),
            })?;

        // Sync for durability; a failed sync is not a lost write.
        if let Err(e) = file.sync_data() {
            warn!(path = %path.display(), error = %e, "Failed to sync audit file");
        }

        Ok(())
    }

    /// One path per calendar day in the inclusive range, ascending.
    ///
    /// Existence is not checked here; the reader treats a missing file as an
    /// empty day.
    pub fn files_in_range(&self, start_date: NaiveDate, end_date: NaiveDate) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        let mut day = start_date;
        while day <= end_date {
            paths.push(self.path_for_date(day));
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        paths
    }

    /// Read the raw lines of one partition file.
    ///
    /// A missing file yields an empty sequence, not an error: a day with no
    /// audited writes is normal. Empty lines are discarded. Decoding is the
    /// caller's concern so one corrupt line cannot block the rest.
    pub fn read_file(&self, path: &Path) -> AuditResult<Vec<String>> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(content
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(String::from)
                .collect()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(AuditError::Storage {
                message: format!("failed to read '{}': {}", path.display(), e),
            }),
        }
    }

    /// Partition files whose encoded date is strictly older than
    /// `today - retention_days`.
    ///
    /// A file exactly `retention_days` old is kept. Filenames not matching
    /// the partition pattern are ignored.
    pub fn expired_files(
        &self,
        retention_days: u32,
        today: NaiveDate,
    ) -> AuditResult<Vec<PathBuf>> {
        let cutoff = today
            .checked_sub_days(Days::new(u64::from(retention_days)))
            .unwrap_or(NaiveDate::MIN);

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AuditError::Storage {
                    message: format!(
                        "failed to list audit directory '{}': {}",
                        self.dir.display(),
                        e
                    ),
                })
            }
        };

        let mut expired = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| AuditError::Storage {
                message: format!(
                    "failed to list audit directory '{}': {}",
                    self.dir.display(),
                    e
                ),
            })?;
            if let Some(date) = Self::date_from_filename(&entry.file_name()) {
                if date < cutoff {
                    expired.push(entry.path());
                }
            }
        }
        expired.sort();
        Ok(expired)
    }

    /// Delete every partition file past retention; returns the count removed.
    ///
    /// A delete failure for one file is logged and does not abort deletion
    /// of the others.
    pub fn delete_expired_files(&self, retention_days: u32) -> AuditResult<usize> {
        let today = Utc::now().date_naive();
        let mut removed = 0;
        for path in self.expired_files(retention_days, today)? {
            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!(path = %path.display(), "Deleted expired audit file");
                    removed += 1;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to delete expired audit file");
                }
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_path_for_date_encoding() {
        let store = AuditFileStore::new("/var/log/audit");
        let path = store.path_for_date(date(2025, 10, 6));
        assert_eq!(
            path,
            PathBuf::from("/var/log/audit/audit-20251006.jsonl")
        );
    }

    #[test]
    fn test_date_from_filename_roundtrip() {
        let store = AuditFileStore::new("/tmp");
        let path = store.path_for_date(date(2025, 1, 31));
        let name = path.file_name().unwrap();
        assert_eq!(
            AuditFileStore::date_from_filename(name),
            Some(date(2025, 1, 31))
        );
    }

    #[test]
    fn test_date_from_filename_rejects_unrelated_names() {
        for name in [
            "audit-2025106.jsonl",
            "audit-20251006.log",
            "notes.txt",
            "audit-.jsonl",
            "audit-20251332.jsonl",
        ] {
            assert_eq!(
                AuditFileStore::date_from_filename(OsStr::new(name)),
                None,
                "{name} should not parse"
            );
        }
    }

    #[test]
    fn test_files_in_range_inclusive_ascending() {
        let store = AuditFileStore::new("/tmp/audit");
        let paths = store.files_in_range(date(2025, 9, 29), date(2025, 10, 2));
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "audit-20250929.jsonl",
                "audit-20250930.jsonl",
                "audit-20251001.jsonl",
                "audit-20251002.jsonl"
            ]
        );
    }

    #[test]
    fn test_files_in_range_single_day() {
        let store = AuditFileStore::new("/tmp/audit");
        assert_eq!(
            store.files_in_range(date(2025, 10, 6), date(2025, 10, 6)).len(),
            1
        );
    }

    #[test]
    fn test_read_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = AuditFileStore::new(temp_dir.path());
        let lines = store
            .read_file(&store.path_for_date(date(2025, 10, 6)))
            .unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn test_append_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let store = AuditFileStore::new(temp_dir.path().join("audit"));
        let day = date(2025, 10, 6);

        store.append(day, r#"{"n":1}"#).unwrap();
        store.append(day, r#"{"n":2}"#).unwrap();

        let lines = store.read_file(&store.path_for_date(day)).unwrap();
        assert_eq!(lines, vec![r#"{"n":1}"#, r#"{"n":2}"#]);
    }

    #[test]
    fn test_append_creates_directory_lazily() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("nested/audit");
        let store = AuditFileStore::new(&dir);
        assert!(!dir.exists());
        store.append(date(2025, 10, 6), "{}").unwrap();
        assert!(dir.exists());
    }

    #[test]
    fn test_different_days_different_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = AuditFileStore::new(temp_dir.path());
        store.append(date(2025, 10, 6), r#"{"d":6}"#).unwrap();
        store.append(date(2025, 10, 7), r#"{"d":7}"#).unwrap();

        assert_eq!(
            store.read_file(&store.path_for_date(date(2025, 10, 6))).unwrap(),
            vec![r#"{"d":6}"#]
        );
        assert_eq!(
            store.read_file(&store.path_for_date(date(2025, 10, 7))).unwrap(),
            vec![r#"{"d":7}"#]
        );
    }

    #[test]
    fn test_expired_files_strict_boundary() {
        let temp_dir = TempDir::new().unwrap();
        let store = AuditFileStore::new(temp_dir.path());
        let today = date(2025, 10, 31);

        store.append(date(2025, 9, 30), "{}").unwrap(); // 31 days old
        store.append(date(2025, 10, 1), "{}").unwrap(); // exactly 30 days old
        store.append(date(2025, 10, 2), "{}").unwrap(); // 29 days old

        let expired = store.expired_files(30, today).unwrap();
        assert_eq!(expired, vec![store.path_for_date(date(2025, 9, 30))]);
    }

    #[test]
    fn test_expired_files_ignores_unrelated_names() {
        let temp_dir = TempDir::new().unwrap();
        let store = AuditFileStore::new(temp_dir.path());
        store.ensure_directory().unwrap();
        fs::write(temp_dir.path().join("README.md"), "not an audit file").unwrap();
        fs::write(temp_dir.path().join("audit-19700101.log"), "wrong ext").unwrap();

        let expired = store.expired_files(30, date(2025, 10, 31)).unwrap();
        assert!(expired.is_empty());
    }

    #[test]
    fn test_expired_files_missing_directory_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = AuditFileStore::new(temp_dir.path().join("never-created"));
        assert!(store.expired_files(30, date(2025, 10, 31)).unwrap().is_empty());
    }

    #[test]
    fn test_delete_expired_files_counts_removed() {
        let temp_dir = TempDir::new().unwrap();
        let store = AuditFileStore::new(temp_dir.path());
        let today = Utc::now().date_naive();
        let old = today.checked_sub_days(Days::new(40)).unwrap();
        let older = today.checked_sub_days(Days::new(45)).unwrap();

        store.append(old, "{}").unwrap();
        store.append(older, "{}").unwrap();
        store.append(today, "{}").unwrap();

        let removed = store.delete_expired_files(30).unwrap();
        assert_eq!(removed, 2);
        assert!(store.path_for_date(today).exists());
        assert!(!store.path_for_date(old).exists());
    }
}
