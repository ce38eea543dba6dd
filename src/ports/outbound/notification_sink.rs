use crate::monitoring::domain::InstallationEvent;

/// Result of asking the sink to surface an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    Shown,
    /// Nobody to show it to (no interactive session, muted level). Not an error.
    Skipped { reason: String },
}

/// NotificationSink port for user-facing installation notices
///
/// Called from a blocking task so a slow sink never stalls enforcement.
pub trait NotificationSink: Send + Sync {
    fn show(&self, event: &InstallationEvent) -> NotificationOutcome;
}
