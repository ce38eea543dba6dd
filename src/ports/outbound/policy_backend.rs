use crate::application::dto::{AgentPing, PingResponse, SoftwareValidationRequest, ValidationResponse};
use crate::shared::error::PolicyError;
use async_trait::async_trait;

/// PolicyBackend port for the remote policy authority
///
/// # Async Support
/// All methods are async so verification and batch reporting can run
/// concurrently. Implementations must be `Send + Sync`.
#[async_trait]
pub trait PolicyBackend: Send + Sync {
    /// Submits one application or install attempt for validation
    ///
    /// # Arguments
    /// * `request` - Normalized payload built from a record or an attempt
    ///
    /// # Returns
    /// The backend's approval verdict
    ///
    /// # Errors
    /// Returns a [`PolicyError`] if:
    /// - The backend cannot be reached
    /// - The backend answers with a non-success status
    /// - The response body does not match the schema
    async fn validate_software(
        &self,
        request: &SoftwareValidationRequest,
    ) -> Result<ValidationResponse, PolicyError>;

    /// Probes `GET /health`
    async fn health_check(&self) -> Result<(), PolicyError>;

    /// Sends a liveness ping
    async fn send_ping(&self, ping: &AgentPing) -> Result<PingResponse, PolicyError>;
}
