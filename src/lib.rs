//! install-guard - endpoint agent for install verification and enforcement
//!
//! Install attempts reach the agent from two sources: requests pushed by a
//! kernel minifilter over its communication port, and installs found by
//! diffing successive inventory snapshots. Both are normalized into an
//! [`InstallAttempt`](monitoring::domain::InstallAttempt), checked against a
//! remote policy backend and enforced fail-closed: any error along the way
//! is a deny.
//!
//! # Architecture
//!
//! The library is organized into the following layers:
//!
//! - **Domain Layer** (`monitoring`): records, snapshots, events, the wire codec and risk scoring
//! - **Application Layer** (`application`): use cases and background services
//! - **Ports** (`ports`): Interface definitions for infrastructure
//! - **Adapters** (`adapters`): Concrete implementations of ports
//! - **Shared** (`shared`): Common utilities and error types
//! - **Configuration** (`config`): YAML settings with platform-aware defaults
//!
//! # Example
//!
//! ```no_run
//! use install_guard::prelude::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<()> {
//! let identity = detect_host_identity().await;
//! let backend = Arc::new(HttpPolicyBackend::new(
//!     "https://policy.example.com/api",
//!     "api-key",
//!     Duration::from_secs(10),
//! )?);
//!
//! let gate = VerificationGate::new(backend, identity, Duration::from_secs(10))
//!     .with_hasher(Arc::new(Sha256FileHasher));
//! let decision = gate.verify(&InstallAttempt::from_path("/tmp/setup.pkg")).await;
//! println!("allow={} reason={}", decision.allow, decision.reason);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod config;
pub mod monitoring;
pub mod ports;
pub mod shared;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::outbound::console::{ScanPresenter, TracingNotificationSink};
    pub use crate::adapters::outbound::driver::platform_driver_port;
    pub use crate::adapters::outbound::filesystem::{
        DirectoryInventory, DirectoryQuarantine, FsFileRemover, Sha256FileHasher,
    };
    pub use crate::adapters::outbound::network::HttpPolicyBackend;
    pub use crate::adapters::outbound::system::detect_host_identity;
    pub use crate::application::dto::{HostIdentity, Platform};
    pub use crate::application::services::{
        stop_channel, CleanupQueue, DriverWorker, DriverWorkerSettings, MonitorWorker,
        MonitorWorkerSettings, PingWorker, PingWorkerSettings, WireChannel,
    };
    pub use crate::application::use_cases::{
        EnforcementCoordinator, EnforcementOutcome, ReportingDispatcher, VerificationGate,
    };
    pub use crate::monitoring::domain::{
        ApplicationRecord, Decision, InstallAttempt, InstallationEvent, RiskLevel, Snapshot,
    };
    pub use crate::monitoring::policies::RiskPolicy;
    pub use crate::monitoring::services::InstallationWatcher;
    pub use crate::ports::outbound::{
        ContentHasher, DriverPort, FileRemover, InventoryProvider, NotificationSink,
        PolicyBackend, PortConnection, QuarantineStore,
    };
    pub use crate::shared::Result;
}
