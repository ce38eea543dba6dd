/// Data Transfer Objects for application layer
///
/// DTOs carry the versioned backend schema and the host identity between the
/// use cases and the network adapter, keeping the domain layer isolated.
mod agent_ping;
mod host_identity;
mod software_validation;

pub use agent_ping::{AgentPing, PingResponse};
pub use host_identity::{derive_device_id, derive_user_id, HostIdentity, Platform};
pub use software_validation::{
    format_bytes, SoftwareValidationRequest, ValidationResponse, SCHEMA_VERSION,
};
