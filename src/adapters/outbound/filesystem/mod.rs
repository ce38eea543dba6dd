/// Filesystem adapters: inventory, quarantine, deletion and hashing
mod directory_inventory;
mod file_hasher;
mod file_remover;
mod quarantine;

pub use directory_inventory::DirectoryInventory;
pub use file_hasher::Sha256FileHasher;
pub use file_remover::FsFileRemover;
pub use quarantine::DirectoryQuarantine;
