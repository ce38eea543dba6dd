use super::shutdown::sleep_or_stop;
use crate::application::use_cases::ReportingDispatcher;
use crate::ports::outbound::InventoryProvider;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingWorkerSettings {
    pub interval: Duration,
    pub email_domain: String,
    /// Full inventory send period; `None` disables it
    pub inventory_interval: Option<Duration>,
    pub batch_size: usize,
}

impl Default for PingWorkerSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            email_domain: "localhost".to_string(),
            inventory_interval: None,
            batch_size: 10,
        }
    }
}

/// PingWorker keeps the backend informed that this agent is alive and
/// periodically resends the full inventory.
pub struct PingWorker {
    reporter: Arc<ReportingDispatcher>,
    inventory: Option<Arc<dyn InventoryProvider>>,
    settings: PingWorkerSettings,
}

impl PingWorker {
    pub fn new(reporter: Arc<ReportingDispatcher>, settings: PingWorkerSettings) -> Self {
        Self {
            reporter,
            inventory: None,
            settings,
        }
    }

    pub fn with_inventory(mut self, inventory: Arc<dyn InventoryProvider>) -> Self {
        self.inventory = Some(inventory);
        self
    }

    /// One ping. Returns whether the backend answered.
    pub async fn ping_once(&self) -> bool {
        match self.reporter.send_ping(&self.settings.email_domain).await {
            Ok(_) => {
                tracing::debug!("Agent ping sent");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Agent ping failed");
                false
            }
        }
    }

    /// Sends the current inventory as one batch
    ///
    /// # Returns
    /// `(successful, failed)`, or `None` when no snapshot could be taken
    pub async fn send_inventory(&self) -> Option<(usize, usize)> {
        let inventory = self.inventory.as_ref()?;
        match inventory.snapshot().await {
            Ok(snapshot) => {
                let records = snapshot.into_records();
                Some(self.reporter.report_batch(&records, self.settings.batch_size).await)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Inventory snapshot for periodic report failed");
                None
            }
        }
    }

    pub async fn run(self, mut stop: watch::Receiver<bool>) {
        tracing::info!(interval_secs = self.settings.interval.as_secs(), "Ping worker started");
        let mut last_inventory = Instant::now();

        loop {
            self.ping_once().await;

            if let Some(period) = self.settings.inventory_interval {
                if last_inventory.elapsed() >= period {
                    self.send_inventory().await;
                    last_inventory = Instant::now();
                }
            }

            if sleep_or_stop(&mut stop, self.settings.interval).await {
                break;
            }
        }
        tracing::info!("Ping worker stopped");
    }
}
