use crate::monitoring::domain::{InstallationEvent, RiskLevel};
use crate::ports::outbound::{NotificationOutcome, NotificationSink};

/// TracingNotificationSink adapter surfacing events through the log
///
/// Events at Medium risk or above are logged at warn, the rest at info.
/// Events below `minimum_level` are skipped.
pub struct TracingNotificationSink {
    minimum_level: RiskLevel,
}

impl TracingNotificationSink {
    pub fn new(minimum_level: RiskLevel) -> Self {
        Self { minimum_level }
    }
}

impl Default for TracingNotificationSink {
    fn default() -> Self {
        Self::new(RiskLevel::Low)
    }
}

impl NotificationSink for TracingNotificationSink {
    fn show(&self, event: &InstallationEvent) -> NotificationOutcome {
        let level = event.risk_level();
        if level < self.minimum_level {
            return NotificationOutcome::Skipped {
                reason: format!("risk {level} below notification threshold"),
            };
        }

        let record = event.record();
        let flags = event
            .risk_flags()
            .iter()
            .map(|f| f.description())
            .collect::<Vec<_>>()
            .join(", ");

        if level >= RiskLevel::Medium {
            tracing::warn!(
                software = %record.name(),
                publisher = %record.publisher(),
                risk = %level,
                flags = %flags,
                action = event.recommended_action(),
                "New software installed"
            );
        } else {
            tracing::info!(
                software = %record.name(),
                publisher = %record.publisher(),
                risk = %level,
                "New software installed"
            );
        }
        NotificationOutcome::Shown
    }
}
