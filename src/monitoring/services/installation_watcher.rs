use crate::monitoring::domain::{DetectionMethod, InstallationEvent, Snapshot};
use crate::monitoring::policies::RiskPolicy;

/// InstallationWatcher turns successive inventory snapshots into
/// install and uninstall events
///
/// The watcher exclusively owns its baseline. Each diff runs against the
/// current baseline without touching it, and the new snapshot replaces the
/// baseline only once the event list is complete.
///
/// A record whose key survives between snapshots is never reported, even if
/// its version changed.
#[derive(Debug)]
pub struct InstallationWatcher {
    baseline: Option<Snapshot>,
    policy: RiskPolicy,
}

impl InstallationWatcher {
    pub fn new(policy: RiskPolicy) -> Self {
        Self {
            baseline: None,
            policy,
        }
    }

    /// Installs `snapshot` as the reference point for the next diff.
    pub fn load_baseline(&mut self, snapshot: Snapshot) {
        tracing::debug!(records = snapshot.len(), "Inventory baseline loaded");
        self.baseline = Some(snapshot);
    }

    pub fn has_baseline(&self) -> bool {
        self.baseline.is_some()
    }

    pub fn baseline(&self) -> Option<&Snapshot> {
        self.baseline.as_ref()
    }

    /// Diffs `new` against the baseline and then makes `new` the baseline
    ///
    /// Without a baseline the snapshot is adopted and no events are produced,
    /// so a first poll never reports the whole machine as freshly installed.
    ///
    /// # Returns
    /// Install events (sorted by identity key) followed by uninstall events
    /// (sorted by identity key)
    pub fn diff(&mut self, new: Snapshot) -> Vec<InstallationEvent> {
        let events = match &self.baseline {
            Some(old) => compute_diff(old, &new, &self.policy),
            None => {
                tracing::debug!("No baseline yet; adopting snapshot without events");
                Vec::new()
            }
        };
        self.baseline = Some(new);
        events
    }
}

/// Pure set difference over identity keys.
///
/// Installs are risk-scored; uninstalls carry an unscored assessment.
pub fn compute_diff(old: &Snapshot, new: &Snapshot, policy: &RiskPolicy) -> Vec<InstallationEvent> {
    let mut installed: Vec<_> = new.records().filter(|r| !old.contains(r.key())).collect();
    installed.sort_by(|a, b| a.key().cmp(b.key()));

    let mut removed: Vec<_> = old.records().filter(|r| !new.contains(r.key())).collect();
    removed.sort_by(|a, b| a.key().cmp(b.key()));

    let installs = installed.into_iter().map(|record| {
        let assessment = policy.assess(record);
        InstallationEvent::install(record.clone(), DetectionMethod::PollDiff, assessment)
    });
    let uninstalls = removed
        .into_iter()
        .map(|record| InstallationEvent::uninstall(record.clone(), DetectionMethod::PollDiff));

    installs.chain(uninstalls).collect()
}
