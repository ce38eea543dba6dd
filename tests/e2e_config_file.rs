/// End-to-end tests for config file discovery and validation.
///
/// These tests exercise the flow from a config file on disk through CLI
/// invocation, using `assert_cmd` and `tempfile` for isolated environments.
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// ============================================================================
// Helper Functions
// ============================================================================

/// Create a watch root with one application bundle.
fn create_watch_root(dir: &Path) -> std::path::PathBuf {
    let apps = dir.join("apps");
    fs::create_dir_all(apps.join("Browser.app/Contents/MacOS")).unwrap();
    apps
}

/// Write a config file at the specified path.
fn write_config(path: &Path, content: &str) {
    fs::write(path, content).unwrap();
}

// ============================================================================
// Discovery
// ============================================================================

#[test]
fn test_config_discovered_in_working_directory() {
    let temp = TempDir::new().unwrap();
    let apps = create_watch_root(temp.path());
    write_config(
        &temp.path().join("install-guard.config.yml"),
        &format!("monitor:\n  watch_roots:\n    - {}\n", apps.display()),
    );

    cargo_bin_cmd!("install-guard")
        .current_dir(temp.path())
        .arg("scan")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Browser"));
}

#[test]
fn test_explicit_config_overrides_discovered_one() {
    let temp = TempDir::new().unwrap();
    let apps = create_watch_root(temp.path());
    write_config(
        &temp.path().join("install-guard.config.yml"),
        "reporting:\n  batch_size: 0\n",
    );
    let explicit = temp.path().join("explicit.yml");
    write_config(&explicit, &format!("monitor:\n  watch_roots:\n    - {}\n", apps.display()));

    cargo_bin_cmd!("install-guard")
        .current_dir(temp.path())
        .arg("--config")
        .arg(&explicit)
        .arg("scan")
        .assert()
        .code(0);
}

#[test]
fn test_unknown_fields_are_warned_not_fatal() {
    let temp = TempDir::new().unwrap();
    let apps = create_watch_root(temp.path());
    let config = temp.path().join("agent.yml");
    write_config(
        &config,
        &format!("auto_update: true\nmonitor:\n  watch_roots:\n    - {}\n", apps.display()),
    );

    cargo_bin_cmd!("install-guard")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(&config)
        .arg("scan")
        .assert()
        .code(0)
        .stderr(predicate::str::contains("auto_update"));
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_missing_explicit_config_fails() {
    let temp = TempDir::new().unwrap();
    cargo_bin_cmd!("install-guard")
        .arg("--config")
        .arg(temp.path().join("missing.yml"))
        .arg("scan")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn test_invalid_yaml_fails() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("agent.yml");
    write_config(&config, "monitor: [[[broken");

    cargo_bin_cmd!("install-guard")
        .arg("--config")
        .arg(&config)
        .arg("scan")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Failed to parse config file"));
}

#[test]
fn test_zero_batch_size_rejected() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("agent.yml");
    write_config(&config, "reporting:\n  batch_size: 0\n");

    cargo_bin_cmd!("install-guard")
        .arg("--config")
        .arg(&config)
        .arg("scan")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("batch_size"))
        .stderr(predicate::str::contains("💡 Hint:"));
}

#[test]
fn test_non_http_backend_url_rejected() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("agent.yml");
    write_config(&config, "backend:\n  base_url: ftp://policy.example.com\n");

    cargo_bin_cmd!("install-guard")
        .arg("--config")
        .arg(&config)
        .arg("health")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("base_url"));
}
