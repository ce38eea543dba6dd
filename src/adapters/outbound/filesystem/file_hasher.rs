use crate::ports::outbound::ContentHasher;
use crate::shared::security::MAX_HASH_FILE_SIZE;
use crate::shared::Result;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

const READ_CHUNK: usize = 64 * 1024;

/// Sha256FileHasher adapter computing content digests with `sha2`
///
/// A directory is treated as an application bundle and its main file is
/// hashed instead: the first entry of `Contents/MacOS`, else the first
/// regular file at the top level.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256FileHasher;

impl Sha256FileHasher {
    fn main_file(bundle: &Path) -> Result<PathBuf> {
        let executables = bundle.join("Contents").join("MacOS");
        first_regular_file(&executables)
            .or_else(|| first_regular_file(bundle))
            .ok_or_else(|| anyhow::anyhow!("No file to hash inside {}", bundle.display()))
    }

    fn hash_file(path: &Path) -> Result<String> {
        let metadata = fs::symlink_metadata(path)
            .map_err(|e| anyhow::anyhow!("Failed to read metadata for {}: {}", path.display(), e))?;
        if metadata.is_symlink() {
            anyhow::bail!(
                "Security: {} is a symbolic link. For security reasons, symbolic links are not hashed.",
                path.display()
            );
        }
        if metadata.len() > MAX_HASH_FILE_SIZE {
            anyhow::bail!(
                "{} is too large to hash ({} bytes, limit {} bytes)",
                path.display(),
                metadata.len(),
                MAX_HASH_FILE_SIZE
            );
        }

        let file = File::open(path).map_err(|e| anyhow::anyhow!("Failed to open {}: {}", path.display(), e))?;
        let mut reader = BufReader::with_capacity(READ_CHUNK, file);
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; READ_CHUNK];
        loop {
            let read = reader.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }
        Ok(format!("{:x}", hasher.finalize()))
    }
}

fn first_regular_file(dir: &Path) -> Option<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .map(|entry| entry.path())
        .collect();
    files.sort();
    files.into_iter().next()
}

impl ContentHasher for Sha256FileHasher {
    fn sha256(&self, path: &Path) -> Result<String> {
        if fs::symlink_metadata(path).is_ok_and(|m| m.is_dir()) {
            Self::hash_file(&Self::main_file(path)?)
        } else {
            Self::hash_file(path)
        }
    }
}
