use crate::shared::Result;
use std::path::Path;

/// ContentHasher port for computing content digests of attempted installs
pub trait ContentHasher: Send + Sync {
    /// Returns the lowercase hex SHA-256 of the file, or of a bundle's main
    /// file when `path` is a directory
    ///
    /// # Errors
    /// Returns an error if the content cannot be read
    fn sha256(&self, path: &Path) -> Result<String>;
}
