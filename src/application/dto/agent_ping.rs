use super::host_identity::HostIdentity;
use serde::{Deserialize, Serialize};

/// Body of `POST /agents/ping`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentPing {
    pub device_id: String,
    pub employee_email: String,
    pub status: String,
}

impl AgentPing {
    pub fn active(identity: &HostIdentity, email_domain: &str) -> Self {
        Self {
            device_id: identity.device_id.clone(),
            employee_email: format!("{}@{}", identity.username, email_domain),
            status: "active".to_string(),
        }
    }
}

/// Liveness answer. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PingResponse {
    #[serde(rename = "shouldUpdate", default)]
    pub should_update: bool,
}
