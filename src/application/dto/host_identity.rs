use sha2::{Digest, Sha256};

/// Serial strings firmware vendors ship when nobody filled the field in.
const PLACEHOLDER_SERIALS: &[&str] = &["To be filled by O.E.M.", "Default string", "0"];

/// Who and where the agent runs. Computed once per process and reused in
/// every backend payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostIdentity {
    pub device_id: String,
    pub user_id: String,
    pub machine_name: String,
    pub username: String,
    /// `windows_agent`, `macos_agent` or `linux_agent`
    pub detected_by: String,
}

impl HostIdentity {
    /// Derives the identity from already-collected host facts.
    pub fn from_parts(
        serial: Option<&str>,
        machine_name: &str,
        username: &str,
        domain: Option<&str>,
        platform: Platform,
    ) -> Self {
        Self {
            device_id: derive_device_id(serial, machine_name, username, platform.device_prefix()),
            user_id: derive_user_id(username, domain, machine_name),
            machine_name: machine_name.to_string(),
            username: username.to_string(),
            detected_by: platform.agent_name().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    pub fn device_prefix(&self) -> &'static str {
        match self {
            Platform::Windows => "WIN",
            Platform::MacOs => "MAC",
            Platform::Linux => "LNX",
        }
    }

    pub fn agent_name(&self) -> &'static str {
        match self {
            Platform::Windows => "windows_agent",
            Platform::MacOs => "macos_agent",
            Platform::Linux => "linux_agent",
        }
    }
}

/// `<PREFIX>-<serial>` when a real hardware serial is known, otherwise
/// `<PREFIX>-<machine>-<first 8 hex digits of SHA-256("machine-user")>`.
pub fn derive_device_id(serial: Option<&str>, machine_name: &str, username: &str, prefix: &str) -> String {
    if let Some(serial) = serial.map(str::trim).filter(|s| is_usable_serial(s)) {
        return format!("{prefix}-{serial}");
    }

    let digest = Sha256::digest(format!("{machine_name}-{username}").as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02X}")).collect();
    format!("{prefix}-{machine_name}-{}", &hex[..8])
}

fn is_usable_serial(serial: &str) -> bool {
    !serial.is_empty() && !PLACEHOLDER_SERIALS.iter().any(|p| p.eq_ignore_ascii_case(serial))
}

/// `DOMAIN\user` when the account belongs to a domain other than the machine.
pub fn derive_user_id(username: &str, domain: Option<&str>, machine_name: &str) -> String {
    match domain.map(str::trim) {
        Some(domain) if !domain.is_empty() && !domain.eq_ignore_ascii_case(machine_name) => {
            format!("{domain}\\{username}")
        }
        _ => username.to_string(),
    }
}
