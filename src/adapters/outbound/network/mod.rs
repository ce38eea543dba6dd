/// Network adapters for the policy backend
mod policy_api_client;

pub use policy_api_client::HttpPolicyBackend;
