use chrono::{DateTime, Duration, Utc};
use std::path::{Path, PathBuf};

/// A deferred deletion. `timestamp` starts the grace period; the request is
/// eligible once `now - timestamp >= delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupRequest {
    path: PathBuf,
    timestamp: DateTime<Utc>,
}

impl CleanupRequest {
    pub fn new(path: impl Into<PathBuf>, timestamp: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            timestamp,
        }
    }

    pub fn now(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Utc::now())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn is_eligible(&self, now: DateTime<Utc>, delay: Duration) -> bool {
        now - self.timestamp >= delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_request_is_not_eligible() {
        let now = Utc::now();
        let request = CleanupRequest::new("/tmp/setup.pkg", now);
        assert!(!request.is_eligible(now, Duration::minutes(5)));
        assert!(!request.is_eligible(now + Duration::seconds(299), Duration::minutes(5)));
        assert!(request.is_eligible(now + Duration::minutes(5), Duration::minutes(5)));
    }

    #[test]
    fn test_old_request_is_eligible_immediately() {
        let now = Utc::now();
        let request = CleanupRequest::new("/tmp/setup.pkg", now - Duration::minutes(5) - Duration::seconds(1));
        assert!(request.is_eligible(now, Duration::minutes(5)));
    }
}
