use crate::shared::error::FileSystemError;
use std::path::{Path, PathBuf};

/// QuarantineStore port for reversible relocation of denied applications
pub trait QuarantineStore: Send + Sync {
    /// Moves `path` into the holding area, replacing any item already there
    ///
    /// # Returns
    /// The quarantined location
    fn quarantine(&self, path: &Path) -> Result<PathBuf, FileSystemError>;

    /// Moves a quarantined item back into `destination_dir`, replacing any
    /// application already present under the same name
    ///
    /// # Returns
    /// The restored location
    fn restore(&self, quarantined: &Path, destination_dir: &Path) -> Result<PathBuf, FileSystemError>;

    /// Where an item named like `path` lands when quarantined.
    fn destination_for(&self, path: &Path) -> Result<PathBuf, FileSystemError>;
}
