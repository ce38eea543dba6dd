use std::fmt;

/// Coarse risk level derived from the sum of triggered flag weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Maps a weighted score onto a level.
    pub fn from_score(score: u32) -> Self {
        match score {
            70.. => RiskLevel::Critical,
            50..=69 => RiskLevel::High,
            30..=49 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        }
    }

    /// Operator-facing advice for this level.
    pub fn recommended_action(&self) -> &'static str {
        match self {
            RiskLevel::Critical => "Uninstall immediately and run a full antivirus scan",
            RiskLevel::High => "Verify the legitimacy of the application before use",
            RiskLevel::Medium => "Monitor the application's behavior",
            RiskLevel::Low => "Application appears safe",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Independent boolean risk indicators and their weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiskFlag {
    UnsignedBinary,
    UnknownPublisher,
    SuspiciousLocation,
    SuspiciousName,
}

impl RiskFlag {
    pub fn weight(&self) -> u32 {
        match self {
            RiskFlag::UnsignedBinary => 30,
            RiskFlag::UnknownPublisher => 20,
            RiskFlag::SuspiciousLocation => 25,
            RiskFlag::SuspiciousName => 40,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RiskFlag::UnsignedBinary => "No digital signature",
            RiskFlag::UnknownPublisher => "Unknown publisher",
            RiskFlag::SuspiciousLocation => "Suspicious install location",
            RiskFlag::SuspiciousName => "Suspicious name",
        }
    }
}

impl fmt::Display for RiskFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Outcome of scoring one record: every triggered flag is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskAssessment {
    level: RiskLevel,
    flags: Vec<RiskFlag>,
}

impl RiskAssessment {
    pub fn from_flags(flags: Vec<RiskFlag>) -> Self {
        let score = flags.iter().map(RiskFlag::weight).sum();
        Self {
            level: RiskLevel::from_score(score),
            flags,
        }
    }

    /// Assessment attached to events that are never scored (uninstalls).
    pub fn unscored() -> Self {
        Self {
            level: RiskLevel::Low,
            flags: Vec::new(),
        }
    }

    pub fn level(&self) -> RiskLevel {
        self.level
    }

    pub fn flags(&self) -> &[RiskFlag] {
        &self.flags
    }

    pub fn score(&self) -> u32 {
        self.flags.iter().map(RiskFlag::weight).sum()
    }

    pub fn recommended_action(&self) -> &'static str {
        self.level.recommended_action()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_thresholds() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(29), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(30), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(49), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(50), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(69), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(70), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(155), RiskLevel::Critical);
    }

    #[test]
    fn test_flags_are_additive() {
        let assessment =
            RiskAssessment::from_flags(vec![RiskFlag::UnsignedBinary, RiskFlag::UnknownPublisher]);
        assert_eq!(assessment.score(), 50);
        assert_eq!(assessment.level(), RiskLevel::High);
        assert_eq!(assessment.flags().len(), 2);
    }

    #[test]
    fn test_unscored_is_low_without_flags() {
        let assessment = RiskAssessment::unscored();
        assert_eq!(assessment.level(), RiskLevel::Low);
        assert!(assessment.flags().is_empty());
        assert_eq!(assessment.recommended_action(), "Application appears safe");
    }

    #[test]
    fn test_level_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);
    }
}
