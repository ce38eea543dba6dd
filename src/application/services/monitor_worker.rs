use super::shutdown::sleep_or_stop;
use crate::application::use_cases::{EnforcementCoordinator, ReportingDispatcher, VerificationGate};
use crate::monitoring::domain::{EventKind, InstallAttempt, InstallationEvent};
use crate::monitoring::services::InstallationWatcher;
use crate::ports::outbound::InventoryProvider;
use crate::shared::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorWorkerSettings {
    pub interval: Duration,
    /// Report the whole baseline once it is loaded
    pub report_on_start: bool,
    pub batch_size: usize,
}

impl Default for MonitorWorkerSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            report_on_start: true,
            batch_size: 10,
        }
    }
}

/// Counters for one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollReport {
    pub installs: usize,
    pub uninstalls: usize,
    pub denied: usize,
    pub reported: usize,
}

/// MonitorWorker turns periodic inventory snapshots into events and acts on them
///
/// With a verification gate attached every install is verified and
/// enforced; the verification call also serves as its report. Without one
/// the agent only observes and reports.
pub struct MonitorWorker {
    inventory: Arc<dyn InventoryProvider>,
    watcher: InstallationWatcher,
    gate: Option<Arc<VerificationGate>>,
    enforcer: Arc<EnforcementCoordinator>,
    reporter: Arc<ReportingDispatcher>,
    settings: MonitorWorkerSettings,
}

impl MonitorWorker {
    pub fn new(
        inventory: Arc<dyn InventoryProvider>,
        watcher: InstallationWatcher,
        enforcer: Arc<EnforcementCoordinator>,
        reporter: Arc<ReportingDispatcher>,
        settings: MonitorWorkerSettings,
    ) -> Self {
        Self {
            inventory,
            watcher,
            gate: None,
            enforcer,
            reporter,
            settings,
        }
    }

    /// Verifies and enforces every detected install.
    pub fn enforcing(mut self, gate: Arc<VerificationGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn watcher(&self) -> &InstallationWatcher {
        &self.watcher
    }

    /// Reads the first snapshot and adopts it as the baseline
    ///
    /// # Errors
    /// Returns the inventory error; the caller retries on the next tick
    pub async fn establish_baseline(&mut self) -> Result<()> {
        let snapshot = self.inventory.snapshot().await?;
        tracing::info!(applications = snapshot.len(), "Baseline inventory loaded");

        let records = snapshot.sorted_records().into_iter().cloned().collect::<Vec<_>>();
        self.watcher.load_baseline(snapshot);

        if self.settings.report_on_start && !records.is_empty() {
            self.reporter.report_batch(&records, self.settings.batch_size).await;
        }
        Ok(())
    }

    /// Takes one snapshot, diffs it and processes the events
    pub async fn poll_once(&mut self) -> PollReport {
        let snapshot = match self.inventory.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "Inventory snapshot failed; skipping this cycle");
                return PollReport::default();
            }
        };

        let mut report = PollReport::default();
        for event in self.watcher.diff(snapshot) {
            self.process(event, &mut report).await;
        }
        report
    }

    async fn process(&self, event: InstallationEvent, report: &mut PollReport) {
        tracing::info!(
            kind = event.kind().as_str(),
            software = %event.record().name(),
            key = %event.record().key(),
            risk = event.risk_level().as_str(),
            score = event.risk_flags().iter().map(|f| f.weight()).sum::<u32>(),
            "Installation change detected"
        );

        match event.kind() {
            EventKind::Uninstall => {
                report.uninstalls += 1;
                if self.reporter.report_event(&event).await {
                    report.reported += 1;
                }
            }
            EventKind::Install => {
                report.installs += 1;
                let attempt = InstallAttempt::from_event(&event);
                let _notice = self.enforcer.announce(event.clone());

                match &self.gate {
                    Some(gate) => {
                        let decision = gate.verify(&attempt).await;
                        if !decision.allow {
                            report.denied += 1;
                        }
                        self.enforcer.enforce(&attempt, &decision).await;
                    }
                    None => {
                        if self.reporter.report_event(&event).await {
                            report.reported += 1;
                        }
                    }
                }
            }
        }
    }

    /// Runs until the stop signal fires.
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) {
        tracing::info!(
            interval_secs = self.settings.interval.as_secs(),
            enforcing = self.gate.is_some(),
            "Installation monitor started"
        );

        while !self.watcher.has_baseline() {
            if let Err(e) = self.establish_baseline().await {
                tracing::warn!(error = %e, "Could not load baseline inventory");
            }
            if sleep_or_stop(&mut stop, self.settings.interval).await {
                tracing::info!("Installation monitor stopped");
                return;
            }
        }

        loop {
            let report = self.poll_once().await;
            if report != PollReport::default() {
                tracing::debug!(
                    installs = report.installs,
                    uninstalls = report.uninstalls,
                    denied = report.denied,
                    reported = report.reported,
                    "Monitor cycle finished"
                );
            }
            if sleep_or_stop(&mut stop, self.settings.interval).await {
                break;
            }
        }
        tracing::info!("Installation monitor stopped");
    }
}
