use super::file_remover::remove_entry;
use crate::ports::outbound::QuarantineStore;
use crate::shared::error::FileSystemError;
use crate::shared::security::{ensure_directory, plain_file_name, validate_not_symlink};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

// EXDEV / ERROR_NOT_SAME_DEVICE
#[cfg(windows)]
const CROSS_DEVICE_OS_CODE: i32 = 17;
#[cfg(not(windows))]
const CROSS_DEVICE_OS_CODE: i32 = 18;

/// DirectoryQuarantine adapter holding denied applications in one directory
///
/// Items keep their file name, so quarantining a second item with the same
/// name replaces the first. Symlinks are never moved in either direction.
pub struct DirectoryQuarantine {
    root: PathBuf,
}

impl DirectoryQuarantine {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Replaces whatever sits at `destination` with `source`.
    fn replace_with(&self, source: &Path, destination: &Path) -> Result<(), FileSystemError> {
        match remove_entry(destination) {
            Ok(()) => tracing::debug!(path = %destination.display(), "Replaced existing item"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(FileSystemError::classify(destination, e)),
        }
        move_entry(source, destination)
    }
}

fn other(path: &Path, error: anyhow::Error) -> FileSystemError {
    FileSystemError::Other {
        path: path.to_path_buf(),
        details: error.to_string(),
    }
}

/// Requires `path` to exist and not be a symlink.
fn checked_source(path: &Path, operation: &str) -> Result<(), FileSystemError> {
    fs::symlink_metadata(path).map_err(|e| FileSystemError::classify(path, e))?;
    validate_not_symlink(path, operation).map_err(|e| other(path, e))
}

/// Renames, falling back to copy and delete across volumes.
fn move_entry(source: &Path, destination: &Path) -> Result<(), FileSystemError> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.raw_os_error() == Some(CROSS_DEVICE_OS_CODE) => {
            copy_entry(source, destination).map_err(|e| FileSystemError::classify(destination, e))?;
            remove_entry(source).map_err(|e| FileSystemError::classify(source, e))
        }
        Err(e) => Err(FileSystemError::classify(source, e)),
    }
}

fn copy_entry(source: &Path, destination: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(source)?;
    if metadata.is_symlink() {
        return Ok(());
    }
    if !metadata.is_dir() {
        return fs::copy(source, destination).map(|_| ());
    }
    fs::create_dir_all(destination)?;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        copy_entry(&entry.path(), &destination.join(entry.file_name()))?;
    }
    Ok(())
}

impl QuarantineStore for DirectoryQuarantine {
    fn quarantine(&self, path: &Path) -> Result<PathBuf, FileSystemError> {
        checked_source(path, "quarantine")?;
        ensure_directory(&self.root, "Quarantine directory").map_err(|e| other(&self.root, e))?;

        let destination = self.destination_for(path)?;
        self.replace_with(path, &destination)?;
        Ok(destination)
    }

    fn restore(&self, quarantined: &Path, destination_dir: &Path) -> Result<PathBuf, FileSystemError> {
        let name = plain_file_name(quarantined).map_err(|e| other(quarantined, e))?;
        let source = self.root.join(name);
        checked_source(&source, "restore")?;
        ensure_directory(destination_dir, "Restore directory").map_err(|e| other(destination_dir, e))?;

        let destination = destination_dir.join(name);
        self.replace_with(&source, &destination)?;
        Ok(destination)
    }

    fn destination_for(&self, path: &Path) -> Result<PathBuf, FileSystemError> {
        let name = plain_file_name(path).map_err(|e| other(path, e))?;
        Ok(self.root.join(name))
    }
}
