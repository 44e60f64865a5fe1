//! Scheduled retention sweep over the audit directory.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Days, NaiveTime, Utc};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::store::AuditFileStore;

/// Background task deleting audit files older than the retention window.
///
/// Runs one sweep at startup and then daily at a fixed UTC hour. A trigger
/// that fires while a sweep is still in progress is skipped, not queued
/// (single-flight; the store is local-filesystem-scoped so no distributed
/// lock is involved). Sweep failures are terminal for that cycle and are
/// naturally retried at the next scheduled run.
pub struct RetentionSweeper {
    store: Arc<AuditFileStore>,
    retention_days: u32,
    cleanup_hour_utc: u32,
    running: AtomicBool,
    shutdown: Notify,
}

impl RetentionSweeper {
    pub fn new(store: Arc<AuditFileStore>, retention_days: u32, cleanup_hour_utc: u32) -> Self {
        Self {
            store,
            retention_days,
            cleanup_hour_utc,
            running: AtomicBool::new(false),
            shutdown: Notify::new(),
        }
    }

    /// Run one sweep now.
    ///
    /// Returns the number of files removed, or `None` if another sweep was
    /// already in progress. Failures are logged, never propagated: the
    /// sweep has no synchronous caller to report to.
    pub fn sweep(&self) -> Option<usize> {
        if self
            .running
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            warn!("Retention sweep already in progress, skipping this trigger");
            return None;
        }

        let result = self.store.delete_expired_files(self.retention_days);
        self.running.store(false, Ordering::Release);

        match result {
            Ok(removed) => {
                info!(
                    removed,
                    retention_days = self.retention_days,
                    "Retention sweep complete"
                );
                Some(removed)
            }
            Err(e) => {
                error!(error = %e, "Retention sweep failed");
                Some(0)
            }
        }
    }

    /// Spawn the owned background task: one sweep immediately, then one at
    /// the configured UTC hour every day until [`stop`](Self::stop).
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let sweeper = Arc::clone(self);
        tokio::spawn(async move {
            sweeper.sweep();
            loop {
                let now = Utc::now();
                let next = next_run_after(now, sweeper.cleanup_hour_utc);
                let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
                debug!(next = %next, "Retention sweep scheduled");

                tokio::select! {
                    _ = sweeper.shutdown.notified() => {
                        debug!("Retention sweeper stopped");
                        break;
                    }
                    _ = tokio::time::sleep(wait) => {
                        sweeper.sweep();
                    }
                }
            }
        })
    }

    /// Stop the background task after its current wait or sweep.
    pub fn stop(&self) {
        self.shutdown.notify_waiters();
    }
}

/// The next occurrence of `hour:00:00` UTC strictly after `now`.
pub fn next_run_after(now: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
    let trigger_time = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or_default();
    let today = now.date_naive().and_time(trigger_time).and_utc();
    if today > now {
        today
    } else {
        (now.date_naive() + Days::new(1)).and_time(trigger_time).and_utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn test_next_run_later_today() {
        let next = next_run_after(at(2025, 10, 6, 0, 30), 2);
        assert_eq!(next, at(2025, 10, 6, 2, 0));
    }

    #[test]
    fn test_next_run_rolls_to_tomorrow() {
        let next = next_run_after(at(2025, 10, 6, 2, 0), 2);
        assert_eq!(next, at(2025, 10, 7, 2, 0));

        let next = next_run_after(at(2025, 10, 6, 14, 0), 2);
        assert_eq!(next, at(2025, 10, 7, 2, 0));
    }

    #[test]
    fn test_sweep_removes_expired_only() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(AuditFileStore::new(temp_dir.path()));
        let today = Utc::now().date_naive();
        let expired_day = today - Days::new(31);

        store.append(expired_day, "{}").unwrap();
        store.append(today, "{}").unwrap();

        let sweeper = RetentionSweeper::new(Arc::clone(&store), 30, 2);
        assert_eq!(sweeper.sweep(), Some(1));
        assert!(store.path_for_date(today).exists());
        assert!(!store.path_for_date(expired_day).exists());
    }

    #[test]
    fn test_sweep_single_flight() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(AuditFileStore::new(temp_dir.path()));
        let sweeper = RetentionSweeper::new(store, 30, 2);

        // Simulate a sweep still in progress: the next trigger is skipped.
        sweeper.running.store(true, Ordering::Release);
        assert_eq!(sweeper.sweep(), None);

        sweeper.running.store(false, Ordering::Release);
        assert_eq!(sweeper.sweep(), Some(0));
    }

    #[tokio::test]
    async fn test_start_runs_startup_sweep_and_stops() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(AuditFileStore::new(temp_dir.path()));
        let today = Utc::now().date_naive();
        store.append(today - Days::new(40), "{}").unwrap();

        let sweeper = Arc::new(RetentionSweeper::new(Arc::clone(&store), 30, 2));
        let handle = sweeper.start();

        // The startup sweep runs before the first scheduled wait.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!store.path_for_date(today - Days::new(40)).exists());

        sweeper.stop();
        handle.await.unwrap();
    }
}
