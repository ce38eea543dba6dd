use crate::monitoring::domain::{ApplicationRecord, RiskAssessment, RiskFlag};

/// Install roots that user-level processes can write to without elevation.
pub const DEFAULT_SUSPICIOUS_ROOTS: &[&str] = &[
    r"C:\Users",
    r"C:\Temp",
    r"C:\Windows\Temp",
    "/tmp/",
    "/private/tmp/",
    "/var/tmp/",
];

/// Name fragments associated with pirated or tampered software.
pub const DEFAULT_SUSPICIOUS_NAMES: &[&str] = &["crack", "keygen", "patch", "hack", "cheat"];

/// RiskPolicy scores a record as a weighted sum of independent flags
///
/// Weights and thresholds live on [`RiskFlag`] and
/// [`RiskLevel`](crate::monitoring::domain::RiskLevel); this policy only
/// decides which flags fire. Matching is case-insensitive.
#[derive(Debug, Clone)]
pub struct RiskPolicy {
    suspicious_roots: Vec<String>,
    suspicious_names: Vec<String>,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_SUSPICIOUS_ROOTS.iter().map(|s| s.to_string()).collect(),
            DEFAULT_SUSPICIOUS_NAMES.iter().map(|s| s.to_string()).collect(),
        )
    }
}

impl RiskPolicy {
    /// Creates a policy from explicit denylists
    ///
    /// # Arguments
    /// * `suspicious_roots` - Path prefixes that mark an install location as suspicious
    /// * `suspicious_names` - Substrings that mark an application name as suspicious
    pub fn new(suspicious_roots: Vec<String>, suspicious_names: Vec<String>) -> Self {
        Self {
            suspicious_roots: suspicious_roots.iter().map(|r| r.to_lowercase()).collect(),
            suspicious_names: suspicious_names.iter().map(|n| n.to_lowercase()).collect(),
        }
    }

    /// Assesses one record, keeping every triggered flag
    pub fn assess(&self, record: &ApplicationRecord) -> RiskAssessment {
        let mut flags = Vec::new();

        if !record.has_digital_signature() {
            flags.push(RiskFlag::UnsignedBinary);
        }

        if record.publisher().trim().is_empty() {
            flags.push(RiskFlag::UnknownPublisher);
        }

        if let Some(location) = record.install_location() {
            if self.is_suspicious_location(&location.to_string_lossy()) {
                flags.push(RiskFlag::SuspiciousLocation);
            }
        }

        if self.is_suspicious_name(record.name()) {
            flags.push(RiskFlag::SuspiciousName);
        }

        RiskAssessment::from_flags(flags)
    }

    fn is_suspicious_location(&self, location: &str) -> bool {
        let location = location.to_lowercase();
        self.suspicious_roots
            .iter()
            .any(|root| location.starts_with(root.as_str()))
    }

    fn is_suspicious_name(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.suspicious_names
            .iter()
            .any(|fragment| name.contains(fragment.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::domain::{IdentityKey, RiskLevel};

    fn clean_record(name: &str) -> ApplicationRecord {
        ApplicationRecord::new(IdentityKey::new(format!("/Applications/{name}.app")).unwrap(), name)
            .with_publisher("Example Corp")
            .with_digital_signature(true)
            .with_install_location("/Applications")
    }

    #[test]
    fn test_clean_record_is_low() {
        let assessment = RiskPolicy::default().assess(&clean_record("Editor"));
        assert_eq!(assessment.level(), RiskLevel::Low);
        assert!(assessment.flags().is_empty());
    }

    #[test]
    fn test_unsigned_is_medium() {
        let record = clean_record("Editor").with_digital_signature(false);
        let assessment = RiskPolicy::default().assess(&record);
        assert_eq!(assessment.flags(), &[RiskFlag::UnsignedBinary]);
        assert_eq!(assessment.level(), RiskLevel::Medium);
    }

    #[test]
    fn test_unsigned_unknown_publisher_is_high() {
        let record = clean_record("Editor")
            .with_digital_signature(false)
            .with_publisher("  ");
        let assessment = RiskPolicy::default().assess(&record);
        assert_eq!(assessment.score(), 50);
        assert_eq!(assessment.level(), RiskLevel::High);
    }

    #[test]
    fn test_all_flags_are_retained() {
        let record = ApplicationRecord::new(IdentityKey::new("/tmp/KeyGen.app").unwrap(), "Photo KeyGen")
            .with_install_location(r"C:\Users\bob\AppData\Local\KeyGen");
        let assessment = RiskPolicy::default().assess(&record);
        assert_eq!(
            assessment.flags(),
            &[
                RiskFlag::UnsignedBinary,
                RiskFlag::UnknownPublisher,
                RiskFlag::SuspiciousLocation,
                RiskFlag::SuspiciousName,
            ]
        );
        assert_eq!(assessment.score(), 115);
        assert_eq!(assessment.level(), RiskLevel::Critical);
    }

    #[test]
    fn test_location_match_is_case_insensitive_prefix() {
        let policy = RiskPolicy::default();
        assert!(policy.is_suspicious_location(r"c:\temp\installer"));
        assert!(policy.is_suspicious_location("/tmp/foo"));
        assert!(!policy.is_suspicious_location(r"D:\Users\foo"));
        assert!(!policy.is_suspicious_location("/opt/tmp/foo"));
    }

    #[test]
    fn test_missing_location_does_not_flag() {
        let record = ApplicationRecord::new(IdentityKey::new("/x").unwrap(), "Editor")
            .with_publisher("Example Corp")
            .with_digital_signature(true);
        assert!(RiskPolicy::default().assess(&record).flags().is_empty());
    }

    #[test]
    fn test_custom_denylist() {
        let policy = RiskPolicy::new(vec!["/srv/drop".to_string()], vec!["Miner".to_string()]);
        let record = clean_record("CoinMiner").with_install_location("/SRV/drop/x");
        let assessment = policy.assess(&record);
        assert_eq!(
            assessment.flags(),
            &[RiskFlag::SuspiciousLocation, RiskFlag::SuspiciousName]
        );
    }

    #[test]
    fn test_adding_any_flag_never_lowers_level() {
        let base = clean_record("Editor");
        let base_level = RiskPolicy::default().assess(&base).level();

        let variants = vec![
            base.clone().with_digital_signature(false),
            base.clone().with_publisher(""),
            base.clone().with_install_location("/tmp/editor"),
            ApplicationRecord::new(base.key().clone(), "Editor Crack")
                .with_publisher("Example Corp")
                .with_digital_signature(true),
        ];

        for variant in variants {
            let level = RiskPolicy::default().assess(&variant).level();
            assert!(level >= base_level, "{:?} lowered risk", variant.name());
        }
    }

    #[test]
    fn test_adding_flags_is_monotonic_from_any_start() {
        let all = [
            RiskFlag::UnsignedBinary,
            RiskFlag::UnknownPublisher,
            RiskFlag::SuspiciousLocation,
            RiskFlag::SuspiciousName,
        ];

        for mask in 0u8..16 {
            let flags: Vec<_> = (0..4).filter(|i| mask & (1 << i) != 0).map(|i| all[i]).collect();
            let level = RiskAssessment::from_flags(flags.clone()).level();
            for extra in all.iter().filter(|f| !flags.contains(f)) {
                let mut more = flags.clone();
                more.push(*extra);
                assert!(RiskAssessment::from_flags(more).level() >= level);
            }
        }
    }
}
