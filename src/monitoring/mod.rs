/// Monitoring domain - Installation detection, risk scoring and the driver wire format
pub mod domain;
pub mod policies;
pub mod services;
