use async_trait::async_trait;
use install_guard::application::dto::{
    AgentPing, PingResponse, SoftwareValidationRequest, ValidationResponse,
};
use install_guard::ports::outbound::PolicyBackend;
use install_guard::shared::error::PolicyError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Mock PolicyBackend approving everything unless told otherwise
#[derive(Default)]
pub struct MockPolicyBackend {
    denied_names: Mutex<Vec<String>>,
    fail_every: Option<usize>,
    unreachable: bool,
    calls: AtomicUsize,
    requests: Mutex<Vec<SoftwareValidationRequest>>,
    pings: Mutex<Vec<AgentPing>>,
}

impl MockPolicyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects software whose name contains `fragment`.
    pub fn denying(mut self, fragment: &str) -> Self {
        self.denied_names.get_mut().unwrap().push(fragment.to_string());
        self
    }

    /// Approves everything from now on, as after an admin approval.
    pub fn approve_all(&self) {
        self.denied_names.lock().unwrap().clear();
    }

    /// Every `n`th validation call fails with a 500, counting from 1.
    pub fn failing_every(mut self, n: usize) -> Self {
        self.fail_every = Some(n);
        self
    }

    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<SoftwareValidationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn pings(&self) -> Vec<AgentPing> {
        self.pings.lock().unwrap().clone()
    }
}

#[async_trait]
impl PolicyBackend for MockPolicyBackend {
    async fn validate_software(
        &self,
        request: &SoftwareValidationRequest,
    ) -> Result<ValidationResponse, PolicyError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().unwrap().push(request.clone());

        if self.unreachable {
            return Err(PolicyError::Transport {
                details: "connection refused".to_string(),
            });
        }
        if self.fail_every.is_some_and(|n| call % n == 0) {
            return Err(PolicyError::Status {
                status: 500,
                body: "internal error".to_string(),
            });
        }

        let denied = self
            .denied_names
            .lock()
            .unwrap()
            .iter()
            .any(|fragment| request.software_name.contains(fragment.as_str()));
        Ok(ValidationResponse {
            is_approved: !denied,
            software_id: None,
            reason: denied.then(|| "Blocked by mock policy".to_string()),
        })
    }

    async fn health_check(&self) -> Result<(), PolicyError> {
        if self.unreachable {
            return Err(PolicyError::Transport {
                details: "connection refused".to_string(),
            });
        }
        Ok(())
    }

    async fn send_ping(&self, ping: &AgentPing) -> Result<PingResponse, PolicyError> {
        self.pings.lock().unwrap().push(ping.clone());
        Ok(PingResponse::default())
    }
}
