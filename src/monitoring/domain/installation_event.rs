use super::application_record::ApplicationRecord;
use super::risk_assessment::{RiskAssessment, RiskFlag, RiskLevel};
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Install,
    Uninstall,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Install => "Install",
            EventKind::Uninstall => "Uninstall",
        }
    }
}

/// Where an installation was first observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMethod {
    WireChannel,
    PollDiff,
}

impl DetectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionMethod::WireChannel => "wire-channel",
            DetectionMethod::PollDiff => "poll-diff",
        }
    }
}

/// A transient install or uninstall observation, consumed once by the
/// verification or reporting path.
#[derive(Debug, Clone)]
pub struct InstallationEvent {
    event_id: Uuid,
    kind: EventKind,
    record: ApplicationRecord,
    detection_method: DetectionMethod,
    assessment: RiskAssessment,
    requires_notification: bool,
    notification_shown: bool,
    notification_shown_at: Option<DateTime<Utc>>,
    detected_at: DateTime<Utc>,
    user_context: Option<String>,
}

impl InstallationEvent {
    pub fn install(
        record: ApplicationRecord,
        detection_method: DetectionMethod,
        assessment: RiskAssessment,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            kind: EventKind::Install,
            record,
            detection_method,
            assessment,
            requires_notification: true,
            notification_shown: false,
            notification_shown_at: None,
            detected_at: Utc::now(),
            user_context: None,
        }
    }

    /// Uninstalls are never scored and do not notify the user.
    pub fn uninstall(record: ApplicationRecord, detection_method: DetectionMethod) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            kind: EventKind::Uninstall,
            record,
            detection_method,
            assessment: RiskAssessment::unscored(),
            requires_notification: false,
            notification_shown: false,
            notification_shown_at: None,
            detected_at: Utc::now(),
            user_context: None,
        }
    }

    pub fn with_user_context(mut self, user: impl Into<String>) -> Self {
        self.user_context = Some(user.into());
        self
    }

    pub fn mark_notification_shown(&mut self, at: DateTime<Utc>) {
        self.notification_shown = true;
        self.notification_shown_at = Some(at);
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn record(&self) -> &ApplicationRecord {
        &self.record
    }

    pub fn into_record(self) -> ApplicationRecord {
        self.record
    }

    pub fn detection_method(&self) -> DetectionMethod {
        self.detection_method
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.assessment.level()
    }

    pub fn risk_flags(&self) -> &[RiskFlag] {
        self.assessment.flags()
    }

    pub fn recommended_action(&self) -> &'static str {
        self.assessment.recommended_action()
    }

    pub fn requires_notification(&self) -> bool {
        self.requires_notification
    }

    pub fn notification_shown(&self) -> bool {
        self.notification_shown
    }

    pub fn notification_shown_at(&self) -> Option<DateTime<Utc>> {
        self.notification_shown_at
    }

    pub fn detected_at(&self) -> DateTime<Utc> {
        self.detected_at
    }

    pub fn user_context(&self) -> Option<&str> {
        self.user_context.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::domain::IdentityKey;

    fn record() -> ApplicationRecord {
        ApplicationRecord::new(IdentityKey::new("/Applications/Foo.app").unwrap(), "Foo")
    }

    #[test]
    fn test_install_event_requires_notification() {
        let event = InstallationEvent::install(
            record(),
            DetectionMethod::PollDiff,
            RiskAssessment::from_flags(vec![RiskFlag::SuspiciousName]),
        );
        assert_eq!(event.kind(), EventKind::Install);
        assert!(event.requires_notification());
        assert!(!event.notification_shown());
        assert_eq!(event.risk_level(), RiskLevel::Medium);
        assert_eq!(event.recommended_action(), "Monitor the application's behavior");
    }

    #[test]
    fn test_uninstall_event_is_unscored() {
        let event = InstallationEvent::uninstall(record(), DetectionMethod::PollDiff);
        assert_eq!(event.kind(), EventKind::Uninstall);
        assert!(!event.requires_notification());
        assert_eq!(event.risk_level(), RiskLevel::Low);
        assert!(event.risk_flags().is_empty());
    }

    #[test]
    fn test_mark_notification_shown() {
        let mut event =
            InstallationEvent::install(record(), DetectionMethod::PollDiff, RiskAssessment::unscored());
        let now = Utc::now();
        event.mark_notification_shown(now);
        assert!(event.notification_shown());
        assert_eq!(event.notification_shown_at(), Some(now));
    }

    #[test]
    fn test_event_ids_are_unique() {
        let a = InstallationEvent::uninstall(record(), DetectionMethod::PollDiff);
        let b = InstallationEvent::uninstall(record(), DetectionMethod::PollDiff);
        assert_ne!(a.event_id(), b.event_id());
    }
}
