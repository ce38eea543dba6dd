use crate::application::dto::{AgentPing, HostIdentity, PingResponse, SoftwareValidationRequest};
use crate::monitoring::domain::{ApplicationRecord, InstallationEvent};
use crate::ports::outbound::PolicyBackend;
use crate::shared::error::{PolicyError, ReportingError};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

/// Default number of records sent concurrently per chunk.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Default pause between chunks.
pub const DEFAULT_BATCH_PAUSE: Duration = Duration::from_secs(1);

/// ReportingDispatcher sends inventory records and events to the backend
///
/// Failures are counted and logged, never retried here and never escalated.
/// The next scheduled inventory send is the retry.
pub struct ReportingDispatcher {
    backend: Arc<dyn PolicyBackend>,
    identity: HostIdentity,
    batch_pause: Duration,
}

impl ReportingDispatcher {
    pub fn new(backend: Arc<dyn PolicyBackend>, identity: HostIdentity) -> Self {
        Self {
            backend,
            identity,
            batch_pause: DEFAULT_BATCH_PAUSE,
        }
    }

    pub fn with_batch_pause(mut self, pause: Duration) -> Self {
        self.batch_pause = pause;
        self
    }

    pub fn identity(&self) -> &HostIdentity {
        &self.identity
    }

    /// Reports one detected event. Returns false on any failure.
    pub async fn report_event(&self, event: &InstallationEvent) -> bool {
        tracing::debug!(
            kind = event.kind().as_str(),
            software = %event.record().name(),
            risk = event.risk_level().as_str(),
            "Reporting installation event"
        );
        self.report_application(event.record()).await
    }

    /// Reports one inventory record. Returns false on any failure.
    pub async fn report_application(&self, record: &ApplicationRecord) -> bool {
        match self.send(record).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Report failed");
                false
            }
        }
    }

    async fn send(&self, record: &ApplicationRecord) -> Result<(), ReportingError> {
        let request = SoftwareValidationRequest::from_record(record, &self.identity);
        self.backend
            .validate_software(&request)
            .await
            .map(|_| ())
            .map_err(|source| ReportingError::Rejected {
                software: record.name().to_string(),
                source,
            })
    }

    /// Reports every record in chunks of `batch_size`
    ///
    /// Records in one chunk are sent as concurrent futures on the calling
    /// task, so at most `batch_size` requests are in flight, and are joined
    /// before the next chunk starts. A pause separates chunks. A batch size of zero is treated
    /// as one.
    ///
    /// # Returns
    /// `(successful, failed)`, which always sum to `records.len()`
    pub async fn report_batch(&self, records: &[ApplicationRecord], batch_size: usize) -> (usize, usize) {
        let batch_size = batch_size.max(1);
        let total_chunks = records.len().div_ceil(batch_size);
        let mut successful = 0;
        let mut failed = 0;

        for (index, chunk) in records.chunks(batch_size).enumerate() {
            let outcomes = join_all(chunk.iter().map(|record| self.report_application(record))).await;
            let sent = outcomes.iter().filter(|ok| **ok).count();
            successful += sent;
            failed += outcomes.len() - sent;

            tracing::debug!(
                chunk = index + 1,
                total_chunks,
                sent,
                failed = outcomes.len() - sent,
                "Inventory chunk reported"
            );

            if index + 1 < total_chunks && !self.batch_pause.is_zero() {
                tokio::time::sleep(self.batch_pause).await;
            }
        }

        tracing::info!(successful, failed, total = records.len(), "Inventory report finished");
        (successful, failed)
    }

    /// Probes the backend health endpoint.
    pub async fn test_connectivity(&self) -> Result<(), PolicyError> {
        self.backend.health_check().await
    }

    /// Sends one liveness ping
    ///
    /// # Errors
    /// Propagates the backend failure; the ping loop logs and carries on
    pub async fn send_ping(&self, email_domain: &str) -> Result<PingResponse, PolicyError> {
        let ping = AgentPing::active(&self.identity, email_domain);
        let response = self.backend.send_ping(&ping).await?;
        if response.should_update {
            tracing::info!(device_id = %self.identity.device_id, "Backend reports an agent update is available");
        }
        Ok(response)
    }
}
