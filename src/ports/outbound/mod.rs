/// Outbound ports (Driven ports) - Infrastructure interfaces
///
/// These ports define the interfaces that the application core uses
/// to interact with the driver, the policy backend, the filesystem and the user.
pub mod content_hasher;
pub mod driver_port;
pub mod file_remover;
pub mod inventory_provider;
pub mod notification_sink;
pub mod policy_backend;
pub mod quarantine_store;

pub use content_hasher::ContentHasher;
pub use driver_port::{DriverPort, PortConnection};
pub use file_remover::FileRemover;
pub use inventory_provider::InventoryProvider;
pub use notification_sink::{NotificationOutcome, NotificationSink};
pub use policy_backend::PolicyBackend;
pub use quarantine_store::QuarantineStore;
