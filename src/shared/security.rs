use crate::shared::Result;
use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path};

/// Largest file the agent hashes before giving up (1 GiB).
/// Installers above this size are verified without a content hash.
pub const MAX_HASH_FILE_SIZE: u64 = 1024 * 1024 * 1024;

/// Validates that a path is not a symbolic link
///
/// # Security
/// Uses `symlink_metadata()` so the link itself is inspected, never its target.
/// Quarantine and restore moves refuse to follow links out of the holding area.
///
/// # Arguments
/// * `path` - The path to validate
/// * `operation` - Description of the operation (e.g., "quarantine", "restore") for error messages
///
/// # Errors
/// Returns an error if the path is a symbolic link or if metadata cannot be read
pub fn validate_not_symlink(path: &Path, operation: &str) -> Result<()> {
    let metadata = fs::symlink_metadata(path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to read metadata for {} operation on {}: {}",
            operation,
            path.display(),
            e
        )
    })?;

    if metadata.is_symlink() {
        anyhow::bail!(
            "Security: {} is a symbolic link. For security reasons, {} operations on symbolic links are not allowed.",
            path.display(),
            operation
        );
    }

    Ok(())
}

/// Makes sure `path` exists and is a real directory, creating it when absent.
///
/// # Errors
/// Returns an error if the path is a symbolic link, is not a directory, or
/// cannot be created.
pub fn ensure_directory(path: &Path, description: &str) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(metadata) => {
            if metadata.is_symlink() {
                anyhow::bail!(
                    "Security: {} {} is a symbolic link. For security reasons, symbolic links are not allowed.",
                    description,
                    path.display()
                );
            }
            if !metadata.is_dir() {
                anyhow::bail!("{} {} is not a directory", description, path.display());
            }
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            fs::create_dir_all(path).map_err(|e| {
                anyhow::anyhow!(
                    "Failed to create {} {}: {}",
                    description,
                    path.display(),
                    e
                )
            })?;
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!(
            "Failed to read {} metadata for {}: {}",
            description,
            path.display(),
            e
        )),
    }
}

/// Returns the final component of `path` when it is a plain name.
///
/// Rejects `..`, root-only paths and empty names so a crafted path can never
/// place a quarantined item outside its holding directory.
pub fn plain_file_name(path: &Path) -> Result<&OsStr> {
    match path.components().next_back() {
        Some(Component::Normal(name)) if !name.is_empty() => Ok(name),
        _ => anyhow::bail!(
            "Security: {} has no plain file name component",
            path.display()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_validate_not_symlink_regular_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("setup.exe");
        fs::write(&file_path, "MZ").unwrap();

        assert!(validate_not_symlink(&file_path, "quarantine").is_ok());
    }

    #[test]
    fn test_validate_not_symlink_nonexistent() {
        let path = PathBuf::from("/nonexistent/setup.exe");
        assert!(validate_not_symlink(&path, "quarantine").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_validate_not_symlink_rejects_link() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("target");
        fs::write(&target, "x").unwrap();
        let link = temp_dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let err = validate_not_symlink(&link, "restore").unwrap_err();
        assert!(err.to_string().contains("symbolic link"));
    }

    #[test]
    fn test_ensure_directory_creates_missing() {
        let temp_dir = TempDir::new().unwrap();
        let quarantine = temp_dir.path().join("a").join("quarantine");

        ensure_directory(&quarantine, "Quarantine directory").unwrap();
        assert!(quarantine.is_dir());
    }

    #[test]
    fn test_ensure_directory_rejects_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("not-a-dir");
        fs::write(&file_path, "x").unwrap();

        let err = ensure_directory(&file_path, "Quarantine directory").unwrap_err();
        assert!(err.to_string().contains("is not a directory"));
    }

    #[test]
    fn test_plain_file_name() {
        assert_eq!(
            plain_file_name(Path::new("/Applications/Foo.app")).unwrap(),
            OsStr::new("Foo.app")
        );
        assert!(plain_file_name(Path::new("/")).is_err());
        assert!(plain_file_name(Path::new("/tmp/..")).is_err());
    }

    #[test]
    fn test_max_hash_file_size_constant() {
        assert_eq!(MAX_HASH_FILE_SIZE, 1024 * 1024 * 1024);
    }
}
