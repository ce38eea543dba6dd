use crate::application::dto::{HostIdentity, SoftwareValidationRequest, ValidationResponse};
use crate::monitoring::domain::{Decision, InstallAttempt};
use crate::ports::outbound::{ContentHasher, PolicyBackend};
use crate::shared::error::PolicyError;
use std::sync::Arc;
use std::time::Duration;

/// Default upper bound on one policy call.
pub const DEFAULT_VERIFICATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on hashing the installer before the call. The request goes
/// out without a hash when it expires.
pub const DEFAULT_HASH_TIMEOUT: Duration = Duration::from_secs(5);

/// VerificationGate turns one install attempt into an allow/deny decision
///
/// Exactly one backend call is made per attempt, bounded by an explicit
/// timeout. Every failure mode (transport, timeout, non-success status,
/// malformed body) produces a deny carrying the proximate cause. The gate
/// keeps no state between calls.
pub struct VerificationGate {
    backend: Arc<dyn PolicyBackend>,
    hasher: Option<Arc<dyn ContentHasher>>,
    hash_timeout: Duration,
    identity: HostIdentity,
    timeout: Duration,
}

impl VerificationGate {
    /// Creates a new gate
    ///
    /// # Arguments
    /// * `backend` - Remote policy authority
    /// * `identity` - Host identity stamped on every request
    /// * `timeout` - Upper bound for the backend call
    pub fn new(backend: Arc<dyn PolicyBackend>, identity: HostIdentity, timeout: Duration) -> Self {
        Self {
            backend,
            hasher: None,
            hash_timeout: DEFAULT_HASH_TIMEOUT,
            identity,
            timeout,
        }
    }

    /// Computes missing content hashes before the call.
    pub fn with_hasher(mut self, hasher: Arc<dyn ContentHasher>) -> Self {
        self.hasher = Some(hasher);
        self
    }

    pub fn with_hash_timeout(mut self, hash_timeout: Duration) -> Self {
        self.hash_timeout = hash_timeout;
        self
    }

    pub fn identity(&self) -> &HostIdentity {
        &self.identity
    }

    /// Verifies one attempt
    ///
    /// # Returns
    /// A decision that is `allow = true` only when the backend explicitly
    /// approved the attempt within the timeout
    pub async fn verify(&self, attempt: &InstallAttempt) -> Decision {
        let attempt = self.with_content_hash(attempt).await;
        let request = SoftwareValidationRequest::from_attempt(&attempt, &self.identity);

        let outcome = match tokio::time::timeout(self.timeout, self.backend.validate_software(&request)).await {
            Ok(result) => result,
            Err(_) => Err(PolicyError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        };

        let decision = decide(outcome);
        if decision.allow {
            tracing::info!(
                software = %request.software_name,
                path = %attempt.path().display(),
                "Installation approved"
            );
        } else {
            tracing::warn!(
                software = %request.software_name,
                path = %attempt.path().display(),
                reason = %decision.reason,
                "Installation denied"
            );
        }
        decision
    }

    async fn with_content_hash(&self, attempt: &InstallAttempt) -> InstallAttempt {
        let attempt = attempt.clone();
        let Some(hasher) = self.hasher.as_ref().filter(|_| attempt.content_hash().is_none()) else {
            return attempt;
        };

        let hasher = Arc::clone(hasher);
        let path = attempt.path().to_path_buf();
        let hashing = tokio::task::spawn_blocking(move || hasher.sha256(&path));
        match tokio::time::timeout(self.hash_timeout, hashing).await {
            Ok(Ok(Ok(hash))) => attempt.with_content_hash(hash),
            Ok(Ok(Err(e))) => {
                tracing::debug!(path = %attempt.path().display(), error = %e, "Content hash unavailable");
                attempt
            }
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "Hashing task failed");
                attempt
            }
            Err(_) => {
                tracing::warn!(
                    path = %attempt.path().display(),
                    timeout_ms = self.hash_timeout.as_millis() as u64,
                    "Hashing timed out; verifying without a content hash"
                );
                attempt
            }
        }
    }
}

/// Maps a backend outcome onto a decision. Only an explicit approval allows.
fn decide(outcome: Result<ValidationResponse, PolicyError>) -> Decision {
    match outcome {
        Ok(response) if response.is_approved => {
            Decision::allow(response.reason.unwrap_or_else(|| "Approved by policy".to_string()))
        }
        Ok(response) => {
            Decision::deny(response.reason.unwrap_or_else(|| "Not approved by policy".to_string()))
        }
        Err(e) => Decision::deny(format!("Verification failed: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dto::{AgentPing, Platform, PingResponse};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    enum Reply {
        Approve,
        Reject,
        Fail(PolicyError),
        Hang,
    }

    struct StubBackend {
        reply: Reply,
        calls: AtomicUsize,
        last_request: Mutex<Option<SoftwareValidationRequest>>,
    }

    impl StubBackend {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl PolicyBackend for StubBackend {
        async fn validate_software(
            &self,
            request: &SoftwareValidationRequest,
        ) -> Result<ValidationResponse, PolicyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            match &self.reply {
                Reply::Approve => Ok(ValidationResponse {
                    is_approved: true,
                    software_id: Some("sw-1".to_string()),
                    reason: None,
                }),
                Reply::Reject => Ok(ValidationResponse {
                    is_approved: false,
                    software_id: None,
                    reason: Some("Blocked software".to_string()),
                }),
                Reply::Fail(e) => Err(e.clone()),
                Reply::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    unreachable!()
                }
            }
        }

        async fn health_check(&self) -> Result<(), PolicyError> {
            Ok(())
        }

        async fn send_ping(&self, _ping: &AgentPing) -> Result<PingResponse, PolicyError> {
            Ok(PingResponse::default())
        }
    }

    struct FixedHasher(Option<&'static str>);

    impl ContentHasher for FixedHasher {
        fn sha256(&self, _path: &std::path::Path) -> crate::shared::Result<String> {
            match self.0 {
                Some(hash) => Ok(hash.to_string()),
                None => anyhow::bail!("unreadable"),
            }
        }
    }

    struct SlowHasher(Duration);

    impl ContentHasher for SlowHasher {
        fn sha256(&self, _path: &std::path::Path) -> crate::shared::Result<String> {
            std::thread::sleep(self.0);
            Ok("late".to_string())
        }
    }

    fn identity() -> HostIdentity {
        HostIdentity::from_parts(Some("SN1"), "host", "alice", None, Platform::Linux)
    }

    fn gate(backend: Arc<StubBackend>) -> VerificationGate {
        VerificationGate::new(backend, identity(), Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_approval_allows() {
        let backend = StubBackend::new(Reply::Approve);
        let decision = gate(backend.clone()).verify(&InstallAttempt::from_path("/tmp/a.pkg")).await;
        assert!(decision.allow);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejection_denies_with_reason() {
        let backend = StubBackend::new(Reply::Reject);
        let decision = gate(backend).verify(&InstallAttempt::from_path("/tmp/a.pkg")).await;
        assert!(!decision.allow);
        assert_eq!(decision.reason, "Blocked software");
    }

    #[tokio::test]
    async fn test_every_failure_denies() {
        let failures = vec![
            PolicyError::Transport {
                details: "connection refused".to_string(),
            },
            PolicyError::Status {
                status: 503,
                body: "unavailable".to_string(),
            },
            PolicyError::MalformedResponse {
                details: "expected value".to_string(),
            },
            PolicyError::Timeout { timeout_ms: 1 },
        ];

        for failure in failures {
            let backend = StubBackend::new(Reply::Fail(failure));
            let decision = gate(backend.clone()).verify(&InstallAttempt::from_path("/tmp/a.pkg")).await;
            assert!(!decision.allow);
            assert!(decision.reason.starts_with("Verification failed"));
            assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn test_timeout_denies() {
        let backend = StubBackend::new(Reply::Hang);
        let started = std::time::Instant::now();
        let decision = gate(backend).verify(&InstallAttempt::from_path("/tmp/a.pkg")).await;
        assert!(!decision.allow);
        assert!(decision.reason.contains("200 ms"));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_hash_is_computed_when_missing() {
        let backend = StubBackend::new(Reply::Approve);
        let gate = gate(backend.clone()).with_hasher(Arc::new(FixedHasher(Some("abc123"))));
        gate.verify(&InstallAttempt::from_path("/tmp/a.pkg")).await;

        let request = backend.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.sha256.as_deref(), Some("abc123"));
        assert_eq!(request.device_id, "LNX-SN1");
    }

    #[tokio::test]
    async fn test_hash_failure_leaves_hash_null() {
        let backend = StubBackend::new(Reply::Approve);
        let gate = gate(backend.clone()).with_hasher(Arc::new(FixedHasher(None)));
        let decision = gate.verify(&InstallAttempt::from_path("/tmp/a.pkg")).await;

        assert!(decision.allow);
        let request = backend.last_request.lock().unwrap().clone().unwrap();
        assert!(request.sha256.is_none());
    }

    #[tokio::test]
    async fn test_slow_hash_is_abandoned() {
        let backend = StubBackend::new(Reply::Approve);
        let gate = gate(backend.clone())
            .with_hasher(Arc::new(SlowHasher(Duration::from_secs(1))))
            .with_hash_timeout(Duration::from_millis(50));

        let started = std::time::Instant::now();
        let decision = gate.verify(&InstallAttempt::from_path("/tmp/huge.pkg")).await;
        assert!(started.elapsed() < Duration::from_millis(900));

        assert!(decision.allow);
        let request = backend.last_request.lock().unwrap().clone().unwrap();
        assert!(request.sha256.is_none());
    }

    #[tokio::test]
    async fn test_existing_hash_is_kept() {
        let backend = StubBackend::new(Reply::Approve);
        let gate = gate(backend.clone()).with_hasher(Arc::new(FixedHasher(Some("other"))));
        let attempt = InstallAttempt::from_path("/tmp/a.pkg").with_content_hash("given");
        gate.verify(&attempt).await;

        let request = backend.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.sha256.as_deref(), Some("given"));
    }
}
