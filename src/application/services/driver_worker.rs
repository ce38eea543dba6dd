use super::cleanup_queue::CleanupScheduler;
use super::shutdown::sleep_or_stop;
use super::wire_channel::WireChannel;
use crate::application::use_cases::{EnforcementCoordinator, EnforcementOutcome, VerificationGate};
use crate::monitoring::domain::{CleanupRequest, InstallAttempt, WireCommand, WireMessage, WireResponse};
use crate::shared::error::ChannelError;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Timing knobs for the driver loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverWorkerSettings {
    /// Wait after a failed connect or a lost connection
    pub reconnect_delay: Duration,
    /// Upper bound for one read
    pub poll_interval: Duration,
    /// Pause after a read that returned nothing
    pub idle_backoff: Duration,
}

impl Default for DriverWorkerSettings {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_secs(5),
            poll_interval: Duration::from_millis(1000),
            idle_backoff: Duration::from_millis(100),
        }
    }
}

/// How one driver request was answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    Verified(EnforcementOutcome),
    CleanupAcknowledged,
    Rejected { code: u32 },
    ResponseFailed,
}

/// DriverWorker drives the read/verify/respond cycle on the wire channel
///
/// It is the only task that reads from or replies to the channel, and every
/// request it reads gets exactly one response.
pub struct DriverWorker {
    channel: Arc<WireChannel>,
    gate: Arc<VerificationGate>,
    enforcer: Arc<EnforcementCoordinator>,
    cleanup: CleanupScheduler,
    settings: DriverWorkerSettings,
}

impl DriverWorker {
    pub fn new(
        channel: Arc<WireChannel>,
        gate: Arc<VerificationGate>,
        enforcer: Arc<EnforcementCoordinator>,
        cleanup: CleanupScheduler,
        settings: DriverWorkerSettings,
    ) -> Self {
        Self {
            channel,
            gate,
            enforcer,
            cleanup,
            settings,
        }
    }

    /// Answers one request read from the channel.
    pub async fn handle(&self, message: WireMessage) -> RequestOutcome {
        match message.command {
            WireCommand::InstallRequest => {
                let attempt = InstallAttempt::from_wire(&message);
                tracing::info!(
                    request_id = message.request_id,
                    path = %attempt.path().display(),
                    process = %message.process_name,
                    pid = message.process_id,
                    "Install request received from driver"
                );
                let decision = self.gate.verify(&attempt).await;
                RequestOutcome::Verified(self.enforcer.enforce(&attempt, &decision).await)
            }
            WireCommand::CleanupRequest => {
                self.cleanup.schedule(CleanupRequest::new(
                    message.file_path.clone(),
                    message.timestamp_utc().unwrap_or_else(Utc::now),
                ));
                let ack = WireResponse::install_response(message.request_id, true, "cleanup scheduled");
                self.reply(ack, RequestOutcome::CleanupAcknowledged).await
            }
            WireCommand::InstallResponse | WireCommand::Unknown(_) => {
                let code = message.command.code();
                tracing::warn!(request_id = message.request_id, code, "Unexpected driver command");
                let deny = WireResponse::install_response(
                    message.request_id,
                    false,
                    format!("Unsupported command 0x{code:04X}"),
                );
                self.reply(deny, RequestOutcome::Rejected { code }).await
            }
        }
    }

    async fn reply(&self, response: WireResponse, outcome: RequestOutcome) -> RequestOutcome {
        match self.channel.send_response(&response).await {
            Ok(()) => outcome,
            Err(e) => {
                tracing::error!(request_id = response.request_id, error = %e, "Failed to send driver response");
                RequestOutcome::ResponseFailed
            }
        }
    }

    /// Runs until the stop signal fires
    ///
    /// Stop is only observed between requests, so a response already being
    /// computed is still written.
    pub async fn run(self, mut stop: watch::Receiver<bool>) {
        tracing::info!(port = %self.channel.port_name(), "Driver worker started");

        while !*stop.borrow() {
            if !self.channel.is_connected() {
                match self.channel.connect().await {
                    Ok(()) => {}
                    Err(e @ ChannelError::Unsupported { .. }) => {
                        tracing::error!(error = %e, "Driver channel unavailable; driver worker exiting");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            retry_secs = self.settings.reconnect_delay.as_secs(),
                            "Driver connect failed"
                        );
                        if sleep_or_stop(&mut stop, self.settings.reconnect_delay).await {
                            break;
                        }
                        continue;
                    }
                }
            }

            match self.channel.read_request(self.settings.poll_interval).await {
                Ok(Some(message)) => {
                    let outcome = self.handle(message).await;
                    tracing::debug!(?outcome, "Driver request handled");
                }
                Ok(None) => {
                    if sleep_or_stop(&mut stop, self.settings.idle_backoff).await {
                        break;
                    }
                }
                Err(_) => {
                    if sleep_or_stop(&mut stop, self.settings.reconnect_delay).await {
                        break;
                    }
                }
            }
        }

        self.channel.disconnect().await;
        tracing::info!("Driver worker stopped");
    }
}
