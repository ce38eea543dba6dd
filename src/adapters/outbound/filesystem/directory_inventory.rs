use crate::monitoring::domain::{ApplicationRecord, IdentityKey, Snapshot};
use crate::ports::outbound::InventoryProvider;
use crate::shared::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// DirectoryInventory adapter listing installed applications from watch roots
///
/// Every non-hidden entry directly under a root is one application, keyed by
/// its full path. Roots are read independently: an unreadable root is logged
/// and skipped, and the snapshot fails only when no root could be read.
pub struct DirectoryInventory {
    roots: Vec<PathBuf>,
}

impl DirectoryInventory {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Synchronous scan used by the async provider.
    pub fn scan(&self) -> Result<Snapshot> {
        let mut snapshot = Snapshot::new();
        let mut readable = 0usize;

        for root in &self.roots {
            match scan_root(root) {
                Ok(records) => {
                    readable += 1;
                    for record in records {
                        snapshot.insert(record);
                    }
                }
                Err(e) => tracing::warn!(root = %root.display(), error = %e, "Skipping unreadable watch root"),
            }
        }

        if readable == 0 && !self.roots.is_empty() {
            anyhow::bail!("None of the {} watch roots could be read", self.roots.len());
        }
        Ok(snapshot)
    }
}

fn scan_root(root: &Path) -> std::io::Result<Vec<ApplicationRecord>> {
    let mut records = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(root = %root.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        if let Some(record) = record_for(&entry.path(), &name) {
            records.push(record);
        }
    }
    Ok(records)
}

fn record_for(path: &Path, file_name: &str) -> Option<ApplicationRecord> {
    let key = IdentityKey::from_path(path).ok()?;
    let display_name = file_name
        .strip_suffix(".app")
        .filter(|stem| !stem.is_empty())
        .unwrap_or(file_name);

    let mut record = ApplicationRecord::new(key, display_name).with_install_location(path);
    if let Ok(metadata) = fs::symlink_metadata(path) {
        let installed = metadata.created().or_else(|_| metadata.modified()).ok();
        if let Some(installed) = installed {
            record = record.with_install_date(DateTime::<Utc>::from(installed));
        }
        if metadata.is_file() {
            record = record.with_estimated_size(metadata.len());
        }
    }
    Some(record)
}

#[async_trait]
impl InventoryProvider for DirectoryInventory {
    async fn snapshot(&self) -> Result<Snapshot> {
        let inventory = DirectoryInventory::new(self.roots.clone());
        tokio::task::spawn_blocking(move || inventory.scan()).await?
    }
}
