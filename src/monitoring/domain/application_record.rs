use crate::shared::Result;
use chrono::{DateTime, NaiveDate, Utc};
use std::path::{Path, PathBuf};

/// Maximum length for identity keys (registry key paths and bundle paths)
const MAX_IDENTITY_KEY_LENGTH: usize = 4096;

/// Rating stored on records nobody has assessed yet
pub const UNKNOWN_SECURITY_RATING: &str = "Unknown";

/// NewType wrapper for the stable key that correlates one application across
/// inventory snapshots (a registry key path or a bundle path).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            anyhow::bail!("Identity key cannot be empty");
        }

        if key.len() > MAX_IDENTITY_KEY_LENGTH {
            anyhow::bail!(
                "Identity key is too long ({} bytes). Maximum allowed: {} bytes",
                key.len(),
                MAX_IDENTITY_KEY_LENGTH
            );
        }

        if key.contains('\0') {
            anyhow::bail!("Identity key contains a NUL character");
        }

        Ok(Self(key))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Self::new(path.to_string_lossy().into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One installed application as seen by a single inventory snapshot.
///
/// Records are value objects: a new snapshot produces fresh records and the
/// watcher never mutates one in place.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationRecord {
    key: IdentityKey,
    name: String,
    version: String,
    publisher: String,
    install_location: Option<PathBuf>,
    install_date: Option<DateTime<Utc>>,
    estimated_size: Option<u64>,
    has_digital_signature: bool,
    content_hash: Option<String>,
    architecture: Option<String>,
    security_rating: String,
    install_method: Option<String>,
    product_code: Option<String>,
    uninstall_command: Option<String>,
    description: Option<String>,
}

impl ApplicationRecord {
    pub fn new(key: IdentityKey, name: impl Into<String>) -> Self {
        Self {
            key,
            name: name.into(),
            version: String::new(),
            publisher: String::new(),
            install_location: None,
            install_date: None,
            estimated_size: None,
            has_digital_signature: false,
            content_hash: None,
            architecture: None,
            security_rating: UNKNOWN_SECURITY_RATING.to_string(),
            install_method: None,
            product_code: None,
            uninstall_command: None,
            description: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = publisher.into();
        self
    }

    pub fn with_install_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.install_location = Some(location.into());
        self
    }

    pub fn with_install_date(mut self, date: DateTime<Utc>) -> Self {
        self.install_date = Some(date);
        self
    }

    pub fn with_estimated_size(mut self, bytes: u64) -> Self {
        self.estimated_size = Some(bytes);
        self
    }

    pub fn with_digital_signature(mut self, signed: bool) -> Self {
        self.has_digital_signature = signed;
        self
    }

    pub fn with_content_hash(mut self, hash: impl Into<String>) -> Self {
        self.content_hash = Some(hash.into());
        self
    }

    pub fn with_architecture(mut self, architecture: impl Into<String>) -> Self {
        self.architecture = Some(architecture.into());
        self
    }

    pub fn with_security_rating(mut self, rating: impl Into<String>) -> Self {
        self.security_rating = rating.into();
        self
    }

    pub fn with_install_method(mut self, method: impl Into<String>) -> Self {
        self.install_method = Some(method.into());
        self
    }

    pub fn with_product_code(mut self, code: impl Into<String>) -> Self {
        self.product_code = Some(code.into());
        self
    }

    pub fn with_uninstall_command(mut self, command: impl Into<String>) -> Self {
        self.uninstall_command = Some(command.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn key(&self) -> &IdentityKey {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn publisher(&self) -> &str {
        &self.publisher
    }

    pub fn install_location(&self) -> Option<&Path> {
        self.install_location.as_deref()
    }

    pub fn install_date(&self) -> Option<DateTime<Utc>> {
        self.install_date
    }

    pub fn estimated_size(&self) -> Option<u64> {
        self.estimated_size
    }

    pub fn has_digital_signature(&self) -> bool {
        self.has_digital_signature
    }

    pub fn content_hash(&self) -> Option<&str> {
        self.content_hash.as_deref()
    }

    pub fn architecture(&self) -> Option<&str> {
        self.architecture.as_deref()
    }

    pub fn security_rating(&self) -> &str {
        &self.security_rating
    }

    pub fn install_method(&self) -> Option<&str> {
        self.install_method.as_deref()
    }

    pub fn product_code(&self) -> Option<&str> {
        self.product_code.as_deref()
    }

    pub fn uninstall_command(&self) -> Option<&str> {
        self.uninstall_command.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The path enforcement acts on: the install location when known,
    /// otherwise the identity key itself (bundle paths double as keys).
    pub fn target_path(&self) -> PathBuf {
        self.install_location
            .clone()
            .unwrap_or_else(|| PathBuf::from(self.key.as_str()))
    }
}

/// Parses an install date as found in inventory sources.
///
/// Accepts the registry `YYYYMMDD` form and RFC 3339 timestamps. Anything
/// else yields `None`.
pub fn parse_install_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.len() == 8 && raw.chars().all(|c| c.is_ascii_digit()) {
        return NaiveDate::parse_from_str(raw, "%Y%m%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc());
    }

    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}
