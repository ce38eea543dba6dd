use crate::shared::error::FileSystemError;
use std::path::Path;

/// FileRemover port used by the cleanup queue
///
/// Errors must be classified so the queue can tell "in use" (retry) from
/// "not found" (already gone) and everything else (drop).
pub trait FileRemover: Send + Sync {
    fn remove(&self, path: &Path) -> Result<(), FileSystemError>;
}
