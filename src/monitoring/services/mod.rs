pub mod installation_watcher;

pub use installation_watcher::{compute_diff, InstallationWatcher};
