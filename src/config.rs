//! Configuration file support for install-guard.
//!
//! Provides YAML-based configuration through `install-guard.config.yml`
//! files, the resolved [`AgentSettings`] with platform-aware defaults, and
//! validation.

use anyhow::Context;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::application::dto::Platform;
use crate::monitoring::domain::wire_protocol::DEFAULT_PORT_NAME;
use crate::monitoring::policies::risk_policy::{DEFAULT_SUSPICIOUS_NAMES, DEFAULT_SUSPICIOUS_ROOTS};
use crate::shared::error::AgentError;
use crate::shared::Result;

pub const CONFIG_FILENAME: &str = "install-guard.config.yml";

/// Environment variable that overrides `backend.api_key`.
pub const API_KEY_ENV: &str = "INSTALL_GUARD_API_KEY";

const DEFAULT_BACKEND_URL: &str = "http://localhost:4002/api";

/// Top-level configuration file schema.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub backend: Option<BackendSection>,
    pub driver: Option<DriverSection>,
    pub monitor: Option<MonitorSection>,
    pub cleanup: Option<CleanupSection>,
    pub reporting: Option<ReportingSection>,
    pub ping: Option<PingSection>,
    /// Captures unknown fields for warnings.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

#[derive(Debug, Deserialize, Default)]
pub struct BackendSection {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct DriverSection {
    pub enabled: Option<bool>,
    /// Fail startup when the port cannot be opened
    pub required: Option<bool>,
    pub port_name: Option<String>,
    pub reconnect_delay_secs: Option<u64>,
    pub poll_interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct MonitorSection {
    pub enabled: Option<bool>,
    /// Verify and quarantine detected installs instead of only reporting them
    pub enforce: Option<bool>,
    pub interval_secs: Option<u64>,
    pub watch_roots: Option<Vec<PathBuf>>,
    pub quarantine_dir: Option<PathBuf>,
    pub restore_dir: Option<PathBuf>,
    pub suspicious_roots: Option<Vec<String>>,
    pub suspicious_names: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CleanupSection {
    pub delay_secs: Option<u64>,
    pub tick_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ReportingSection {
    pub batch_size: Option<usize>,
    pub batch_pause_ms: Option<u64>,
    pub report_inventory_on_start: Option<bool>,
    /// Periodic full-inventory send; absent disables it
    pub inventory_interval_minutes: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PingSection {
    pub enabled: Option<bool>,
    pub interval_secs: Option<u64>,
    pub email_domain: Option<String>,
}

/// Load config from an explicit path. Returns an error if the file is not found.
pub fn load_config_from_path(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read config file: {}\n\n💡 Hint: Check that the file exists and is readable.",
            path.display()
        )
    })?;

    let config: ConfigFile = serde_yaml_ng::from_str(&content).with_context(|| {
        format!(
            "Failed to parse config file: {}\n\n💡 Hint: Ensure the file contains valid YAML syntax.",
            path.display()
        )
    })?;

    warn_unknown_fields(&config);
    Ok(config)
}

/// Auto-discover config in a directory. Returns `None` silently if not found.
pub fn discover_config(dir: &Path) -> Result<Option<ConfigFile>> {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        return Ok(None);
    }

    let config = load_config_from_path(&config_path)?;
    Ok(Some(config))
}

/// Warn about unknown fields in the config file.
fn warn_unknown_fields(config: &ConfigFile) {
    for key in config.unknown_fields.keys() {
        tracing::warn!(field = %key, "Unknown config field will be ignored");
    }
}

/// Fully resolved agent settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSettings {
    pub backend_url: String,
    pub api_key: String,
    pub request_timeout: Duration,

    pub driver_enabled: bool,
    pub driver_required: bool,
    pub port_name: String,
    pub reconnect_delay: Duration,
    pub poll_interval: Duration,

    pub monitor_enabled: bool,
    pub enforce: bool,
    pub monitor_interval: Duration,
    pub watch_roots: Vec<PathBuf>,
    pub quarantine_dir: PathBuf,
    pub restore_dir: PathBuf,
    pub suspicious_roots: Vec<String>,
    pub suspicious_names: Vec<String>,

    pub cleanup_delay: Duration,
    pub cleanup_tick: Duration,

    pub batch_size: usize,
    pub batch_pause: Duration,
    pub report_inventory_on_start: bool,
    pub inventory_interval: Option<Duration>,

    pub ping_enabled: bool,
    pub ping_interval: Duration,
    pub email_domain: String,
}

fn default_watch_roots(platform: Platform) -> Vec<PathBuf> {
    match platform {
        Platform::Windows => vec![
            PathBuf::from(r"C:\Program Files"),
            PathBuf::from(r"C:\Program Files (x86)"),
        ],
        Platform::MacOs => vec![PathBuf::from("/Applications")],
        Platform::Linux => vec![PathBuf::from("/opt")],
    }
}

fn default_quarantine_dir(platform: Platform) -> PathBuf {
    match platform {
        Platform::Windows => PathBuf::from(r"C:\ProgramData\InstallGuard\Quarantine"),
        Platform::MacOs => std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/var/root"))
            .join("Library/Application Support/AppQuarantine"),
        Platform::Linux => PathBuf::from("/var/lib/install-guard/quarantine"),
    }
}

impl AgentSettings {
    /// Applies defaults for `platform` to whatever the file left unset
    ///
    /// The driver runs by default only on Windows, where the monitor merely
    /// observes. Elsewhere the monitor is the only detection path and
    /// enforces.
    pub fn resolve(config: ConfigFile, platform: Platform, env_api_key: Option<String>) -> Self {
        let backend = config.backend.unwrap_or_default();
        let driver = config.driver.unwrap_or_default();
        let monitor = config.monitor.unwrap_or_default();
        let cleanup = config.cleanup.unwrap_or_default();
        let reporting = config.reporting.unwrap_or_default();
        let ping = config.ping.unwrap_or_default();
        let on_windows = platform == Platform::Windows;
        let watch_roots = monitor.watch_roots.unwrap_or_else(|| default_watch_roots(platform));

        Self {
            backend_url: backend.base_url.unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
            api_key: env_api_key
                .filter(|key| !key.is_empty())
                .or(backend.api_key)
                .unwrap_or_default(),
            request_timeout: Duration::from_secs(backend.timeout_secs.unwrap_or(10)),

            driver_enabled: driver.enabled.unwrap_or(on_windows),
            driver_required: driver.required.unwrap_or(false),
            port_name: driver.port_name.unwrap_or_else(|| DEFAULT_PORT_NAME.to_string()),
            reconnect_delay: Duration::from_secs(driver.reconnect_delay_secs.unwrap_or(5)),
            poll_interval: Duration::from_millis(driver.poll_interval_ms.unwrap_or(1000)),

            monitor_enabled: monitor.enabled.unwrap_or(true),
            enforce: monitor.enforce.unwrap_or(!on_windows),
            monitor_interval: Duration::from_secs(monitor.interval_secs.unwrap_or(5)),
            restore_dir: monitor
                .restore_dir
                .or_else(|| watch_roots.first().cloned())
                .unwrap_or_else(|| PathBuf::from(".")),
            watch_roots,
            quarantine_dir: monitor.quarantine_dir.unwrap_or_else(|| default_quarantine_dir(platform)),
            suspicious_roots: monitor
                .suspicious_roots
                .unwrap_or_else(|| DEFAULT_SUSPICIOUS_ROOTS.iter().map(|s| s.to_string()).collect()),
            suspicious_names: monitor
                .suspicious_names
                .unwrap_or_else(|| DEFAULT_SUSPICIOUS_NAMES.iter().map(|s| s.to_string()).collect()),

            cleanup_delay: Duration::from_secs(cleanup.delay_secs.unwrap_or(300)),
            cleanup_tick: Duration::from_millis(cleanup.tick_ms.unwrap_or(1000)),

            batch_size: reporting.batch_size.unwrap_or(10),
            batch_pause: Duration::from_millis(reporting.batch_pause_ms.unwrap_or(1000)),
            report_inventory_on_start: reporting.report_inventory_on_start.unwrap_or(true),
            inventory_interval: reporting
                .inventory_interval_minutes
                .map(|minutes| Duration::from_secs(minutes * 60)),

            ping_enabled: ping.enabled.unwrap_or(true),
            ping_interval: Duration::from_secs(ping.interval_secs.unwrap_or(60)),
            email_domain: ping.email_domain.unwrap_or_else(|| "example.com".to_string()),
        }
    }

    /// Validate the resolved settings.
    pub fn validate(&self) -> Result<()> {
        let url = self.backend_url.trim();
        let has_scheme = url.starts_with("http://") || url.starts_with("https://");
        if !has_scheme || url.len() <= "https://".len() {
            return Err(invalid(
                format!("backend.base_url '{}' is not an http(s) URL", self.backend_url),
                "Use the full API root, e.g. \"https://policy.example.com/api\".",
            ));
        }
        if self.batch_size == 0 {
            return Err(invalid(
                "reporting.batch_size must be at least 1",
                "The default of 10 suits most backends.",
            ));
        }
        if self.port_name.trim().is_empty() {
            return Err(invalid(
                "driver.port_name must not be empty",
                format!("The minifilter listens on \"{}\" unless it was built otherwise.", DEFAULT_PORT_NAME),
            ));
        }
        if let Some(i) = self.suspicious_names.iter().position(|name| name.trim().is_empty()) {
            return Err(invalid(
                format!("monitor.suspicious_names[{}] must not be empty", i),
                "An empty entry would match every application name.",
            ));
        }
        if let Some(i) = self.suspicious_roots.iter().position(|root| root.trim().is_empty()) {
            return Err(invalid(
                format!("monitor.suspicious_roots[{}] must not be empty", i),
                "An empty entry would flag every install location.",
            ));
        }
        if self.monitor_enabled && self.watch_roots.is_empty() {
            return Err(invalid(
                "monitor.watch_roots must list at least one directory",
                "Disable the monitor with `monitor.enabled: false` instead.",
            ));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>, hint: impl Into<String>) -> anyhow::Error {
    AgentError::InvalidConfig {
        message: message.into(),
        hint: hint.into(),
    }
    .into()
}

/// Loads the explicit file, or discovers one in `cwd`, then resolves and
/// validates the settings for the current platform.
pub fn load_settings(explicit: Option<&Path>, cwd: &Path) -> Result<AgentSettings> {
    let config = match explicit {
        Some(path) => load_config_from_path(path)?,
        None => discover_config(cwd)?.unwrap_or_default(),
    };
    let settings = AgentSettings::resolve(config, Platform::current(), std::env::var(API_KEY_ENV).ok());
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn parse(yaml: &str) -> ConfigFile {
        serde_yaml_ng::from_str(yaml).unwrap()
    }

    #[test]
    fn test_load_valid_config() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.yml");
        fs::write(
            &config_path,
            r#"
backend:
  base_url: https://policy.example.com/api
  api_key: secret
  timeout_secs: 3
driver:
  enabled: true
  port_name: \CustomPort
monitor:
  enforce: true
  watch_roots:
    - /Applications
    - /Users/alice/Applications
  suspicious_names:
    - crack
reporting:
  batch_size: 25
  inventory_interval_minutes: 15
ping:
  email_domain: corp.example
"#,
        )
        .unwrap();

        let config = load_config_from_path(&config_path).unwrap();
        let settings = AgentSettings::resolve(config, Platform::MacOs, None);

        assert_eq!(settings.backend_url, "https://policy.example.com/api");
        assert_eq!(settings.api_key, "secret");
        assert_eq!(settings.request_timeout, Duration::from_secs(3));
        assert!(settings.driver_enabled);
        assert_eq!(settings.port_name, "\\CustomPort");
        assert!(settings.enforce);
        assert_eq!(settings.watch_roots.len(), 2);
        assert_eq!(settings.restore_dir, PathBuf::from("/Applications"));
        assert_eq!(settings.suspicious_names, vec!["crack".to_string()]);
        assert_eq!(settings.batch_size, 25);
        assert_eq!(settings.inventory_interval, Some(Duration::from_secs(900)));
        assert_eq!(settings.email_domain, "corp.example");
        settings.validate().unwrap();
    }

    #[test]
    fn test_platform_defaults() {
        let windows = AgentSettings::resolve(ConfigFile::default(), Platform::Windows, None);
        assert!(windows.driver_enabled);
        assert!(!windows.enforce);
        assert_eq!(windows.port_name, "\\InstallGuardPort");

        let mac = AgentSettings::resolve(ConfigFile::default(), Platform::MacOs, None);
        assert!(!mac.driver_enabled);
        assert!(mac.enforce);
        assert_eq!(mac.watch_roots, vec![PathBuf::from("/Applications")]);
        assert_eq!(mac.cleanup_delay, Duration::from_secs(300));
        assert_eq!(mac.ping_interval, Duration::from_secs(60));
        assert!(mac.inventory_interval.is_none());
        mac.validate().unwrap();
    }

    #[test]
    fn test_env_api_key_overrides_file() {
        let config = parse("backend:\n  api_key: from-file\n");
        let settings = AgentSettings::resolve(config, Platform::Linux, Some("from-env".to_string()));
        assert_eq!(settings.api_key, "from-env");

        let config = parse("backend:\n  api_key: from-file\n");
        let settings = AgentSettings::resolve(config, Platform::Linux, Some(String::new()));
        assert_eq!(settings.api_key, "from-file");
    }

    #[test]
    fn test_discover_config_found() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "ping:\n  enabled: false\n").unwrap();

        let config = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.ping.unwrap().enabled, Some(false));
    }

    #[test]
    fn test_discover_config_not_found() {
        let dir = TempDir::new().unwrap();
        assert!(discover_config(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config_from_path(Path::new("/nonexistent/config.yml"));
        let err = format!("{}", result.unwrap_err());
        assert!(err.contains("Failed to read config file"));
    }

    #[test]
    fn test_load_config_parse_error() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("bad.yml");
        fs::write(&config_path, "invalid: yaml: [[[broken").unwrap();

        let err = format!("{}", load_config_from_path(&config_path).unwrap_err());
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_unknown_fields_are_captured() {
        let config = parse("ping:\n  enabled: true\nauto_update: true\nlegacy: x\n");
        assert_eq!(config.unknown_fields.len(), 2);
        assert!(config.unknown_fields.contains_key("auto_update"));
    }

    #[test]
    fn test_validation_errors() {
        let base = || AgentSettings::resolve(ConfigFile::default(), Platform::Linux, None);

        let mut settings = base();
        settings.backend_url = "ftp://example.com".to_string();
        assert!(settings.validate().unwrap_err().to_string().contains("base_url"));

        let mut settings = base();
        settings.batch_size = 0;
        assert!(settings.validate().unwrap_err().to_string().contains("batch_size"));

        let mut settings = base();
        settings.port_name = "  ".to_string();
        assert!(settings.validate().unwrap_err().to_string().contains("port_name"));

        let mut settings = base();
        settings.suspicious_names.push(" ".to_string());
        assert!(settings.validate().unwrap_err().to_string().contains("must not be empty"));

        let mut settings = base();
        settings.watch_roots.clear();
        assert!(settings.validate().unwrap_err().to_string().contains("watch_roots"));
    }

    #[test]
    fn test_load_settings_with_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agent.yml");
        fs::write(&path, "reporting:\n  batch_size: 0\n").unwrap();
        assert!(load_settings(Some(&path), dir.path()).is_err());

        fs::write(&path, "reporting:\n  batch_size: 4\n").unwrap();
        assert_eq!(load_settings(Some(&path), dir.path()).unwrap().batch_size, 4);
    }
}
