use crate::application::dto::{HostIdentity, Platform};
use std::time::Duration;
use tokio::process::Command;

/// Bound on each external query used for identity detection.
const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Collects host facts once at startup and derives the [`HostIdentity`].
///
/// Every source is best effort. A missing serial falls back to the
/// machine-name based device id.
pub async fn detect_host_identity() -> HostIdentity {
    let platform = Platform::current();
    let machine_name = machine_name().await;
    let username = first_env(&["USERNAME", "USER", "LOGNAME"]).unwrap_or_else(|| "unknown".to_string());
    let domain = if platform == Platform::Windows {
        first_env(&["USERDOMAIN"])
    } else {
        None
    };
    let serial = hardware_serial(platform).await;
    if serial.is_none() {
        tracing::debug!("No hardware serial available; using machine-name device id");
    }

    let identity = HostIdentity::from_parts(serial.as_deref(), &machine_name, &username, domain.as_deref(), platform);
    tracing::info!(device_id = %identity.device_id, user_id = %identity.user_id, "Host identity resolved");
    identity
}

fn first_env(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

async fn machine_name() -> String {
    if let Some(name) = first_env(&["COMPUTERNAME", "HOSTNAME"]) {
        return name;
    }
    if let Some(name) = run_query("hostname", &[]).await.and_then(|out| first_non_empty_line(&out)) {
        return name;
    }
    "unknown-host".to_string()
}

async fn hardware_serial(platform: Platform) -> Option<String> {
    match platform {
        Platform::Windows => {
            let output = run_query(
                "powershell",
                &["-NoProfile", "-Command", "(Get-CimInstance Win32_BIOS).SerialNumber"],
            )
            .await;
            match output.and_then(|out| first_non_empty_line(&out)) {
                Some(serial) => Some(serial),
                None => run_query("wmic", &["bios", "get", "serialnumber"])
                    .await
                    .and_then(|out| parse_wmic_value(&out)),
            }
        }
        Platform::MacOs => run_query("ioreg", &["-rd1", "-c", "IOPlatformExpertDevice"])
            .await
            .and_then(|out| parse_ioreg_serial(&out)),
        Platform::Linux => std::fs::read_to_string("/sys/class/dmi/id/product_serial")
            .ok()
            .and_then(|out| first_non_empty_line(&out)),
    }
}

async fn run_query(program: &str, args: &[&str]) -> Option<String> {
    let output = tokio::time::timeout(QUERY_TIMEOUT, Command::new(program).args(args).kill_on_drop(true).output())
        .await
        .ok()?
        .ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).into_owned())
}

fn first_non_empty_line(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// `wmic` prints a header line before the value.
fn parse_wmic_value(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .nth(1)
        .map(str::to_string)
}

/// Extracts `"IOPlatformSerialNumber" = "XXXX"` from `ioreg` output.
fn parse_ioreg_serial(output: &str) -> Option<String> {
    let line = output.lines().find(|line| line.contains("\"IOPlatformSerialNumber\""))?;
    let value = line.split('=').nth(1)?.trim().trim_matches('"');
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ioreg_serial() {
        let output = "+-o J314sAP  <class IOPlatformExpertDevice>\n    {\n      \"IOPlatformUUID\" = \"ABC\"\n      \"IOPlatformSerialNumber\" = \"C02XK1\"\n    }\n";
        assert_eq!(parse_ioreg_serial(output).as_deref(), Some("C02XK1"));
        assert_eq!(parse_ioreg_serial("nothing here"), None);
    }

    #[test]
    fn test_parse_wmic_value() {
        assert_eq!(parse_wmic_value("SerialNumber  \r\nPF3XK2  \r\n\r\n").as_deref(), Some("PF3XK2"));
        assert_eq!(parse_wmic_value("SerialNumber\r\n"), None);
    }

    #[test]
    fn test_first_non_empty_line() {
        assert_eq!(first_non_empty_line("\n  host-1 \n").as_deref(), Some("host-1"));
        assert_eq!(first_non_empty_line("   \n"), None);
    }

    #[tokio::test]
    async fn test_detect_always_produces_identity() {
        let identity = detect_host_identity().await;
        assert!(!identity.device_id.is_empty());
        assert!(!identity.user_id.is_empty());
    }
}
