use crate::ports::outbound::FileRemover;
use crate::shared::error::FileSystemError;
use std::fs;
use std::io;
use std::path::Path;

/// Removes a file, or a directory tree, without following a symlink at `path`.
pub(crate) fn remove_entry(path: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// FsFileRemover adapter deleting leftovers of denied installs.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsFileRemover;

impl FileRemover for FsFileRemover {
    fn remove(&self, path: &Path) -> Result<(), FileSystemError> {
        remove_entry(path).map_err(|e| FileSystemError::classify(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_removes_file_and_directory() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("setup.exe");
        fs::write(&file, "MZ").unwrap();
        let bundle = temp.path().join("Foo.app");
        fs::create_dir_all(bundle.join("Contents/MacOS")).unwrap();
        fs::write(bundle.join("Contents/MacOS/Foo"), "bin").unwrap();

        FsFileRemover.remove(&file).unwrap();
        FsFileRemover.remove(&bundle).unwrap();
        assert!(!file.exists());
        assert!(!bundle.exists());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let err = FsFileRemover.remove(&temp.path().join("gone")).unwrap_err();
        assert!(matches!(err, FileSystemError::NotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_is_removed_not_followed() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("target");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep.txt"), "x").unwrap();
        let link = temp.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        FsFileRemover.remove(&link).unwrap();
        assert!(target.join("keep.txt").exists());
    }
}
