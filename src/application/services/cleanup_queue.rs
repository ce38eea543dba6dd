use super::shutdown::sleep_or_stop;
use crate::monitoring::domain::CleanupRequest;
use crate::ports::outbound::FileRemover;
use crate::shared::error::FileSystemError;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Grace period before a denied file is deleted.
pub const DEFAULT_CLEANUP_DELAY: Duration = Duration::from_secs(300);

/// How often the drain loop looks for eligible requests.
pub const DEFAULT_CLEANUP_TICK: Duration = Duration::from_secs(1);

type PendingMap = Arc<DashMap<PathBuf, DateTime<Utc>>>;

/// Producer handle for the cleanup queue. Cheap to clone; any component may
/// schedule.
#[derive(Clone, Default)]
pub struct CleanupScheduler {
    pending: PendingMap,
}

impl CleanupScheduler {
    /// Queues a deletion. A newer request for the same path supersedes the
    /// older one and restarts its grace period.
    pub fn schedule(&self, request: CleanupRequest) {
        tracing::debug!(path = %request.path().display(), "Cleanup scheduled");
        self.pending
            .insert(request.path().to_path_buf(), request.timestamp());
    }

    /// Withdraws a pending deletion for `path`, e.g. after the path was
    /// allowed or restored. Returns whether anything was pending.
    pub fn cancel(&self, path: &Path) -> bool {
        let cancelled = self.pending.remove(path).is_some();
        if cancelled {
            tracing::info!(path = %path.display(), "Pending cleanup cancelled");
        }
        cancelled
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, path: &Path) -> bool {
        self.pending.contains_key(path)
    }
}

/// Outcome counters for one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub removed: usize,
    pub retried: usize,
    pub dropped: usize,
}

impl DrainReport {
    pub fn is_empty(&self) -> bool {
        self.removed == 0 && self.retried == 0 && self.dropped == 0
    }
}

/// CleanupQueue deletes files left behind by denied installs
///
/// Requests wait out the grace period first because the installer may still
/// hold the file open. Each pass takes every eligible request at once, so
/// one stuck file cannot hold up the others:
/// - in use: re-queued with a fresh timestamp
/// - not found: dropped quietly
/// - anything else: logged and dropped
pub struct CleanupQueue {
    pending: PendingMap,
    remover: Arc<dyn FileRemover>,
    delay: chrono::Duration,
}

impl CleanupQueue {
    pub fn new(remover: Arc<dyn FileRemover>, delay: Duration) -> Self {
        Self {
            pending: Arc::new(DashMap::new()),
            remover,
            delay: chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::days(36_500)),
        }
    }

    pub fn scheduler(&self) -> CleanupScheduler {
        CleanupScheduler {
            pending: Arc::clone(&self.pending),
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Processes every request eligible at `now`
    pub fn drain_once(&self, now: DateTime<Utc>) -> DrainReport {
        let eligible: Vec<CleanupRequest> = self
            .pending
            .iter()
            .map(|entry| CleanupRequest::new(entry.key().clone(), *entry.value()))
            .filter(|request| request.is_eligible(now, self.delay))
            .collect();

        let mut report = DrainReport::default();
        for request in eligible {
            // Skip requests superseded since the scan above.
            let scheduled = request.timestamp();
            if self
                .pending
                .remove_if(request.path(), |_, ts| *ts == scheduled)
                .is_none()
            {
                continue;
            }

            match self.remover.remove(request.path()) {
                Ok(()) => {
                    tracing::info!(path = %request.path().display(), "Cleaned up denied installation file");
                    report.removed += 1;
                }
                Err(FileSystemError::InUse { path }) => {
                    tracing::debug!(path = %path.display(), "File still in use; cleanup deferred");
                    self.pending.entry(path).or_insert(now);
                    report.retried += 1;
                }
                Err(FileSystemError::NotFound { path }) => {
                    tracing::debug!(path = %path.display(), "File already gone; cleanup dropped");
                    report.dropped += 1;
                }
                Err(e) => {
                    tracing::warn!(path = %e.path().display(), error = %e, "Cleanup failed; giving up");
                    report.dropped += 1;
                }
            }
        }
        report
    }

    /// Drains on every tick until the stop signal fires
    pub async fn run(self: Arc<Self>, tick: Duration, mut stop: watch::Receiver<bool>) {
        tracing::info!(delay_secs = self.delay.num_seconds(), "Cleanup queue started");
        while !sleep_or_stop(&mut stop, tick).await {
            let queue = Arc::clone(&self);
            match tokio::task::spawn_blocking(move || queue.drain_once(Utc::now())).await {
                Ok(report) if !report.is_empty() => tracing::debug!(
                    removed = report.removed,
                    retried = report.retried,
                    dropped = report.dropped,
                    "Cleanup pass finished"
                ),
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "Cleanup pass aborted"),
            }
        }
        tracing::info!(pending = self.pending_len(), "Cleanup queue stopped");
    }
}
