use super::host_identity::HostIdentity;
use crate::monitoring::domain::application_record::UNKNOWN_SECURITY_RATING;
use crate::monitoring::domain::{ApplicationRecord, InstallAttempt};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Version of the request schema, sent as `X-Schema-Version`.
pub const SCHEMA_VERSION: &str = "1";

const UNKNOWN_VENDOR: &str = "Unknown";

/// Body of `POST /validate_software`.
///
/// Shared by the verification gate and the reporting dispatcher, whichever
/// detection path produced the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftwareValidationRequest {
    pub device_id: String,
    pub user_id: String,
    pub software_name: String,
    pub version: String,
    pub vendor: String,
    pub install_date: String,
    pub install_path: String,
    pub install_method: String,
    pub last_executed: String,
    pub is_running: bool,
    pub digital_signature: bool,
    pub is_approved: bool,
    pub detected_by: String,
    pub sha256: Option<String>,
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub file_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub process_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub process_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub machine_name: Option<String>,
}

impl SoftwareValidationRequest {
    /// Builds the payload for an inventory record (reporting path).
    pub fn from_record(record: &ApplicationRecord, identity: &HostIdentity) -> Self {
        let now = Utc::now();
        Self {
            device_id: identity.device_id.clone(),
            user_id: identity.user_id.clone(),
            software_name: record.name().to_string(),
            version: record.version().to_string(),
            vendor: vendor_or_unknown(record.publisher()),
            install_date: iso_utc(record.install_date().unwrap_or(now)),
            install_path: record
                .install_location()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
            install_method: determine_install_method(record),
            last_executed: iso_utc(now),
            is_running: false,
            digital_signature: record.has_digital_signature(),
            is_approved: false,
            detected_by: identity.detected_by.clone(),
            sha256: record.content_hash().map(str::to_string),
            notes: build_notes(record),
            file_size: record.estimated_size(),
            process_name: None,
            process_id: None,
            machine_name: Some(identity.machine_name.clone()),
        }
    }

    /// Builds the payload for an install attempt (verification path).
    ///
    /// Attempts that carry a record reuse its metadata; bare driver requests
    /// describe the file being written.
    pub fn from_attempt(attempt: &InstallAttempt, identity: &HostIdentity) -> Self {
        let mut request = match attempt.record() {
            Some(record) => Self::from_record(record, identity),
            None => {
                let now = Utc::now();
                Self {
                    device_id: identity.device_id.clone(),
                    user_id: identity.user_id.clone(),
                    software_name: attempt.display_name(),
                    version: String::new(),
                    vendor: UNKNOWN_VENDOR.to_string(),
                    install_date: iso_utc(attempt.timestamp()),
                    install_path: attempt.path().to_string_lossy().into_owned(),
                    install_method: method_from_path(&attempt.path().to_string_lossy()),
                    last_executed: iso_utc(now),
                    is_running: false,
                    digital_signature: false,
                    is_approved: false,
                    detected_by: identity.detected_by.clone(),
                    sha256: None,
                    notes: None,
                    file_size: None,
                    process_name: None,
                    process_id: None,
                    machine_name: Some(identity.machine_name.clone()),
                }
            }
        };

        if let Some(user) = attempt.username() {
            request.user_id = user.to_string();
        }
        if let Some(hash) = attempt.content_hash() {
            request.sha256 = Some(hash.to_string());
        }
        if attempt.file_size().is_some() {
            request.file_size = attempt.file_size();
        }
        request.process_name = attempt.process_name().map(str::to_string);
        request.process_id = attempt.process_id();
        request
    }
}

/// Body returned by `POST /validate_software`.
///
/// Older backends answer `is_approved` or `success`; all three map to one flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResponse {
    #[serde(rename = "isApproved", alias = "is_approved", alias = "success")]
    pub is_approved: bool,
    #[serde(rename = "softwareId", default, skip_serializing_if = "Option::is_none")]
    pub software_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

fn vendor_or_unknown(publisher: &str) -> String {
    if publisher.trim().is_empty() {
        UNKNOWN_VENDOR.to_string()
    } else {
        publisher.to_string()
    }
}

fn iso_utc(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Explicit method first, then MSI markers, then setup-style uninstallers.
fn determine_install_method(record: &ApplicationRecord) -> String {
    if let Some(method) = record.install_method().filter(|m| !m.is_empty()) {
        return method.to_string();
    }
    if record.product_code().is_some_and(|c| !c.is_empty()) {
        return "MSI".to_string();
    }
    let uninstall = record.uninstall_command().unwrap_or_default().to_lowercase();
    if uninstall.contains("msiexec") {
        return "MSI".to_string();
    }
    if uninstall.contains("setup") || uninstall.contains("install") {
        return "Setup".to_string();
    }
    "Manual".to_string()
}

fn method_from_path(path: &str) -> String {
    let lower = path.to_lowercase();
    if lower.ends_with(".msi") {
        "MSI".to_string()
    } else if lower.contains("setup") || lower.contains("install") {
        "Setup".to_string()
    } else {
        "Manual".to_string()
    }
}

fn build_notes(record: &ApplicationRecord) -> Option<String> {
    let mut notes = Vec::new();

    if let Some(description) = record.description().filter(|d| !d.is_empty()) {
        notes.push(format!("Description: {description}"));
    }
    if let Some(architecture) = record.architecture().filter(|a| !a.is_empty()) {
        notes.push(format!("Architecture: {architecture}"));
    }
    if let Some(size) = record.estimated_size().filter(|s| *s > 0) {
        notes.push(format!("Size: {}", format_bytes(size)));
    }
    let rating = record.security_rating();
    if !rating.is_empty() && rating != UNKNOWN_SECURITY_RATING {
        notes.push(format!("Security rating: {rating}"));
    }

    (!notes.is_empty()).then(|| notes.join("; "))
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.2} {}", UNITS[unit])
    }
}
