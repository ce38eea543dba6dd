use crate::monitoring::domain::Snapshot;
use crate::shared::Result;
use async_trait::async_trait;

/// InventoryProvider port for reading the installed-application inventory
///
/// Implementations return a best-effort union over their sources: one
/// failing source is logged and skipped, never allowed to abort the whole
/// snapshot.
#[async_trait]
pub trait InventoryProvider: Send + Sync {
    /// Produces a complete snapshot for the current instant
    ///
    /// # Errors
    /// Only when no source at all could be read
    async fn snapshot(&self) -> Result<Snapshot>;
}
