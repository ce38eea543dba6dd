/// Use cases module containing the verify/enforce/report pipeline
mod enforcement_coordinator;
mod reporting_dispatcher;
mod verification_gate;

pub use enforcement_coordinator::{EnforcementCoordinator, EnforcementOutcome};
pub use reporting_dispatcher::{ReportingDispatcher, DEFAULT_BATCH_PAUSE, DEFAULT_BATCH_SIZE};
pub use verification_gate::{VerificationGate, DEFAULT_HASH_TIMEOUT, DEFAULT_VERIFICATION_TIMEOUT};
