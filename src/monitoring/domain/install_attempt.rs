use super::application_record::ApplicationRecord;
use super::installation_event::InstallationEvent;
use super::wire_protocol::WireMessage;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Where an attempt came from, which decides how a decision is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOrigin {
    /// Blocked by the minifilter until a correlated response is written
    WireChannel { request_id: u64 },
    /// Already on disk; enforcement has to quarantine after the fact
    PollDiff,
}

/// The canonical shape both detection paths normalize into before
/// verification.
#[derive(Debug, Clone)]
pub struct InstallAttempt {
    origin: AttemptOrigin,
    path: PathBuf,
    file_size: Option<u64>,
    content_hash: Option<String>,
    process_id: Option<u32>,
    process_name: Option<String>,
    username: Option<String>,
    timestamp: DateTime<Utc>,
    record: Option<ApplicationRecord>,
}

impl InstallAttempt {
    pub fn from_wire(message: &WireMessage) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            origin: AttemptOrigin::WireChannel {
                request_id: message.request_id,
            },
            path: PathBuf::from(&message.file_path),
            file_size: u64::try_from(message.file_size).ok(),
            content_hash: None,
            process_id: (message.process_id != 0).then_some(message.process_id),
            process_name: non_empty(&message.process_name),
            username: non_empty(&message.username),
            timestamp: message.timestamp_utc().unwrap_or_else(Utc::now),
            record: None,
        }
    }

    pub fn from_event(event: &InstallationEvent) -> Self {
        let record = event.record().clone();
        Self {
            origin: AttemptOrigin::PollDiff,
            path: record.target_path(),
            file_size: record.estimated_size(),
            content_hash: record.content_hash().map(str::to_string),
            process_id: None,
            process_name: None,
            username: event.user_context().map(str::to_string),
            timestamp: event.detected_at(),
            record: Some(record),
        }
    }

    /// A manually requested verification of a path on disk.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            origin: AttemptOrigin::PollDiff,
            path: path.into(),
            file_size: None,
            content_hash: None,
            process_id: None,
            process_name: None,
            username: None,
            timestamp: Utc::now(),
            record: None,
        }
    }

    pub fn with_content_hash(mut self, hash: impl Into<String>) -> Self {
        self.content_hash = Some(hash.into());
        self
    }

    pub fn with_file_size(mut self, size: u64) -> Self {
        self.file_size = Some(size);
        self
    }

    pub fn origin(&self) -> AttemptOrigin {
        self.origin
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_size(&self) -> Option<u64> {
        self.file_size
    }

    pub fn content_hash(&self) -> Option<&str> {
        self.content_hash.as_deref()
    }

    pub fn process_id(&self) -> Option<u32> {
        self.process_id
    }

    pub fn process_name(&self) -> Option<&str> {
        self.process_name.as_deref()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn record(&self) -> Option<&ApplicationRecord> {
        self.record.as_ref()
    }

    /// Human-readable name: the record name, else the file name.
    pub fn display_name(&self) -> String {
        if let Some(record) = &self.record {
            if !record.name().is_empty() {
                return record.name().to_string();
            }
        }
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

/// Allow/deny verdict plus the operator-facing reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub allow: bool,
    pub reason: String,
}

impl Decision {
    pub fn allow(reason: impl Into<String>) -> Self {
        Self {
            allow: true,
            reason: reason.into(),
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allow: false,
            reason: reason.into(),
        }
    }
}
