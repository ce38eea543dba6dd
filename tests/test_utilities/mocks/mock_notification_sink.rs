use install_guard::ports::outbound::NotificationOutcome;
use install_guard::prelude::*;
use std::sync::Mutex;

/// Mock NotificationSink recording the names of the events it was shown
#[derive(Default)]
pub struct MockNotificationSink {
    shown: Mutex<Vec<String>>,
}

impl MockNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Vec<String> {
        self.shown.lock().unwrap().clone()
    }
}

impl NotificationSink for MockNotificationSink {
    fn show(&self, event: &InstallationEvent) -> NotificationOutcome {
        self.shown.lock().unwrap().push(event.record().name().to_string());
        NotificationOutcome::Shown
    }
}
