pub mod application_record;
pub mod cleanup_request;
pub mod install_attempt;
pub mod installation_event;
pub mod risk_assessment;
pub mod snapshot;
pub mod wire_protocol;

pub use application_record::{parse_install_date, ApplicationRecord, IdentityKey};
pub use cleanup_request::CleanupRequest;
pub use install_attempt::{AttemptOrigin, Decision, InstallAttempt};
pub use installation_event::{DetectionMethod, EventKind, InstallationEvent};
pub use risk_assessment::{RiskAssessment, RiskFlag, RiskLevel};
pub use snapshot::Snapshot;
pub use wire_protocol::{WireCommand, WireMessage, WireResponse};
