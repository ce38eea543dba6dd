use crate::application::services::{CleanupScheduler, WireChannel};
use crate::monitoring::domain::{
    AttemptOrigin, CleanupRequest, Decision, InstallAttempt, InstallationEvent, WireResponse,
};
use crate::ports::outbound::{NotificationOutcome, NotificationSink, QuarantineStore};
use crate::shared::error::FileSystemError;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// What enforcement actually did for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnforcementOutcome {
    /// A correlated response reached the driver
    Responded { allow: bool },
    /// The response could not be written; the driver's own timeout decides
    ResponseFailed,
    /// Allowed attempt from poll detection; nothing to do
    Allowed,
    /// Denied application moved into the holding area
    Quarantined { location: PathBuf },
    /// Denied application was already gone
    NothingToQuarantine,
    /// Quarantine failed; only deferred deletion remains
    QuarantineFailed,
}

/// EnforcementCoordinator applies a verification decision
///
/// - Driver attempts get exactly one correlated response. A denied path is
///   also scheduled for deferred deletion.
/// - Poll-detected attempts cannot be blocked. A denied application is moved
///   to quarantine and its original path is scheduled for cleanup of
///   whatever the installer leaves behind.
/// - An allowed path, or one restored from quarantine, has any pending
///   deletion withdrawn.
///
/// Nothing here returns an error: every failure is logged and absorbed.
pub struct EnforcementCoordinator {
    channel: Option<Arc<WireChannel>>,
    quarantine: Arc<dyn QuarantineStore>,
    cleanup: CleanupScheduler,
    notifier: Option<Arc<dyn NotificationSink>>,
}

impl EnforcementCoordinator {
    pub fn new(quarantine: Arc<dyn QuarantineStore>, cleanup: CleanupScheduler) -> Self {
        Self {
            channel: None,
            quarantine,
            cleanup,
            notifier: None,
        }
    }

    pub fn with_channel(mut self, channel: Arc<WireChannel>) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn cleanup_scheduler(&self) -> &CleanupScheduler {
        &self.cleanup
    }

    /// Applies `decision` to `attempt`
    ///
    /// # Returns
    /// The action taken, for logging and tests
    pub async fn enforce(&self, attempt: &InstallAttempt, decision: &Decision) -> EnforcementOutcome {
        if decision.allow {
            self.cleanup.cancel(attempt.path());
        }
        match attempt.origin() {
            AttemptOrigin::WireChannel { request_id } => {
                self.respond(request_id, attempt.path(), decision).await
            }
            AttemptOrigin::PollDiff if decision.allow => EnforcementOutcome::Allowed,
            AttemptOrigin::PollDiff => self.quarantine_denied(attempt.path(), &decision.reason).await,
        }
    }

    async fn respond(&self, request_id: u64, path: &Path, decision: &Decision) -> EnforcementOutcome {
        if !decision.allow {
            self.cleanup.schedule(CleanupRequest::now(path));
        }

        let Some(channel) = &self.channel else {
            tracing::error!(request_id, "No driver channel to answer request");
            return EnforcementOutcome::ResponseFailed;
        };

        let response = WireResponse::install_response(request_id, decision.allow, decision.reason.clone());
        match channel.send_response(&response).await {
            Ok(()) => {
                tracing::debug!(request_id, allow = decision.allow, "Driver response sent");
                EnforcementOutcome::Responded {
                    allow: decision.allow,
                }
            }
            Err(e) => {
                tracing::error!(request_id, error = %e, "Failed to send driver response");
                EnforcementOutcome::ResponseFailed
            }
        }
    }

    async fn quarantine_denied(&self, path: &Path, reason: &str) -> EnforcementOutcome {
        let store = Arc::clone(&self.quarantine);
        let source = path.to_path_buf();
        let moved = tokio::task::spawn_blocking(move || store.quarantine(&source)).await;

        let outcome = match moved {
            Ok(Ok(location)) => {
                tracing::warn!(
                    path = %path.display(),
                    quarantine = %location.display(),
                    reason,
                    "Denied application quarantined"
                );
                EnforcementOutcome::Quarantined { location }
            }
            Ok(Err(FileSystemError::NotFound { .. })) => {
                tracing::info!(path = %path.display(), "Denied application already removed");
                EnforcementOutcome::NothingToQuarantine
            }
            Ok(Err(e)) => {
                tracing::error!(path = %path.display(), error = %e, "Quarantine failed");
                EnforcementOutcome::QuarantineFailed
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Quarantine task failed");
                EnforcementOutcome::QuarantineFailed
            }
        };

        self.cleanup.schedule(CleanupRequest::now(path));
        outcome
    }

    /// Moves a quarantined item back into `destination_dir`
    ///
    /// # Errors
    /// Returns the classified filesystem error when the move fails
    pub async fn restore(&self, quarantined: &Path, destination_dir: &Path) -> Result<PathBuf, FileSystemError> {
        let store = Arc::clone(&self.quarantine);
        let source = quarantined.to_path_buf();
        let destination = destination_dir.to_path_buf();
        let restored = tokio::task::spawn_blocking(move || store.restore(&source, &destination))
            .await
            .map_err(|e| FileSystemError::Other {
                path: quarantined.to_path_buf(),
                details: e.to_string(),
            })??;
        self.cleanup.cancel(&restored);
        tracing::info!(path = %restored.display(), "Application restored from quarantine");
        Ok(restored)
    }

    /// Shows `event` to the user without waiting for the sink
    ///
    /// # Returns
    /// `None` when the event needs no notice or no sink is configured;
    /// otherwise a handle resolving to the event with its notification
    /// fields updated
    pub fn announce(&self, event: InstallationEvent) -> Option<JoinHandle<InstallationEvent>> {
        if !event.requires_notification() {
            return None;
        }
        let sink = Arc::clone(self.notifier.as_ref()?);

        Some(tokio::spawn(async move {
            let shown = event.clone();
            let outcome = tokio::task::spawn_blocking(move || sink.show(&shown)).await;
            let mut event = event;
            match outcome {
                Ok(NotificationOutcome::Shown) => event.mark_notification_shown(Utc::now()),
                Ok(NotificationOutcome::Skipped { reason }) => {
                    tracing::debug!(software = %event.record().name(), reason, "Notification skipped")
                }
                Err(e) => tracing::warn!(error = %e, "Notification task failed"),
            }
            event
        }))
    }
}
