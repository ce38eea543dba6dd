mod cli;

use clap::Parser;
use cli::{Args, Command};
use install_guard::adapters::outbound::console::{ScanPresenter, TracingNotificationSink};
use install_guard::adapters::outbound::driver::platform_driver_port;
use install_guard::adapters::outbound::filesystem::{
    DirectoryInventory, DirectoryQuarantine, FsFileRemover, Sha256FileHasher,
};
use install_guard::adapters::outbound::network::HttpPolicyBackend;
use install_guard::adapters::outbound::system::detect_host_identity;
use install_guard::application::dto::HostIdentity;
use install_guard::application::services::{
    shutdown_signal, stop_channel, CleanupQueue, DriverWorker, DriverWorkerSettings,
    MonitorWorker, MonitorWorkerSettings, PingWorker, PingWorkerSettings, WireChannel,
};
use install_guard::application::use_cases::{
    EnforcementCoordinator, ReportingDispatcher, VerificationGate,
};
use install_guard::config::{load_settings, AgentSettings};
use install_guard::monitoring::domain::InstallAttempt;
use install_guard::monitoring::policies::RiskPolicy;
use install_guard::monitoring::services::InstallationWatcher;
use install_guard::ports::outbound::{InventoryProvider, PolicyBackend};
use install_guard::shared::error::{AgentError, ExitCode};
use install_guard::shared::Result;
use std::path::Path;
use std::process;
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() {
                ExitCode::InvalidArguments.as_i32()
            } else {
                ExitCode::Success.as_i32()
            };
            let _ = e.print();
            process::exit(code);
        }
    };

    init_tracing(args.log_level.as_directive());

    match run(args).await {
        Ok(code) => process::exit(code.as_i32()),
        Err(e) => {
            eprintln!("\n❌ An error occurred:\n");
            eprintln!("{}", e);

            // Display error chain
            let mut source = e.source();
            while let Some(err) = source {
                eprintln!("\nCaused by: {}", err);
                source = err.source();
            }

            eprintln!();
            process::exit(ExitCode::ApplicationError.as_i32());
        }
    }
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

async fn run(args: Args) -> Result<ExitCode> {
    let cwd = std::env::current_dir()?;
    let settings = load_settings(args.config.as_deref(), &cwd)?;
    tracing::debug!(?settings.watch_roots, driver = settings.driver_enabled, enforce = settings.enforce, "Settings resolved");

    match args.selected_command() {
        Command::Run => run_agent(settings).await,
        Command::Scan => scan(&settings).await,
        Command::Verify { path } => verify(&settings, &path).await,
        Command::Restore { path, to } => restore(&settings, &path, to.as_deref()).await,
        Command::Health => health(&settings).await,
    }
}

fn policy_backend(settings: &AgentSettings) -> Result<Arc<dyn PolicyBackend>> {
    let backend = HttpPolicyBackend::new(&settings.backend_url, &settings.api_key, settings.request_timeout)?;
    Ok(Arc::new(backend))
}

fn verification_gate(
    settings: &AgentSettings,
    backend: Arc<dyn PolicyBackend>,
    identity: HostIdentity,
) -> VerificationGate {
    VerificationGate::new(backend, identity, settings.request_timeout).with_hasher(Arc::new(Sha256FileHasher))
}

fn risk_policy(settings: &AgentSettings) -> RiskPolicy {
    RiskPolicy::new(settings.suspicious_roots.clone(), settings.suspicious_names.clone())
}

async fn run_agent(settings: AgentSettings) -> Result<ExitCode> {
    let identity = detect_host_identity().await;
    tracing::info!(
        device_id = %identity.device_id,
        user_id = %identity.user_id,
        backend = %settings.backend_url,
        "Starting install-guard agent"
    );

    let backend = policy_backend(&settings)?;
    let reporter = Arc::new(
        ReportingDispatcher::new(Arc::clone(&backend), identity.clone()).with_batch_pause(settings.batch_pause),
    );
    match reporter.test_connectivity().await {
        Ok(()) => tracing::info!("Policy backend is reachable"),
        Err(e) => tracing::warn!(error = %e, "Policy backend health check failed; installs will be denied until it recovers"),
    }

    let gate = Arc::new(verification_gate(&settings, Arc::clone(&backend), identity));
    let cleanup = Arc::new(CleanupQueue::new(Arc::new(FsFileRemover), settings.cleanup_delay));
    let mut enforcer = EnforcementCoordinator::new(
        Arc::new(DirectoryQuarantine::new(&settings.quarantine_dir)),
        cleanup.scheduler(),
    )
    .with_notifier(Arc::new(TracingNotificationSink::default()));

    let channel = if settings.driver_enabled {
        let channel = Arc::new(WireChannel::new(platform_driver_port(), settings.port_name.clone()));
        if settings.driver_required {
            channel
                .connect()
                .await
                .map_err(|source| AgentError::DriverRequired { source })?;
        }
        enforcer = enforcer.with_channel(Arc::clone(&channel));
        Some(channel)
    } else {
        None
    };
    let enforcer = Arc::new(enforcer);

    let (stop_tx, stop_rx) = stop_channel();
    let mut tasks = Vec::new();

    tasks.push(tokio::spawn(Arc::clone(&cleanup).run(settings.cleanup_tick, stop_rx.clone())));

    if let Some(channel) = channel {
        let worker = DriverWorker::new(
            channel,
            Arc::clone(&gate),
            Arc::clone(&enforcer),
            cleanup.scheduler(),
            DriverWorkerSettings {
                reconnect_delay: settings.reconnect_delay,
                poll_interval: settings.poll_interval,
                ..DriverWorkerSettings::default()
            },
        );
        tasks.push(tokio::spawn(worker.run(stop_rx.clone())));
    }

    let inventory: Arc<dyn InventoryProvider> = Arc::new(DirectoryInventory::new(settings.watch_roots.clone()));

    if settings.monitor_enabled {
        let worker = MonitorWorker::new(
            Arc::clone(&inventory),
            InstallationWatcher::new(risk_policy(&settings)),
            Arc::clone(&enforcer),
            Arc::clone(&reporter),
            MonitorWorkerSettings {
                interval: settings.monitor_interval,
                report_on_start: settings.report_inventory_on_start,
                batch_size: settings.batch_size,
            },
        );
        let worker = if settings.enforce {
            worker.enforcing(Arc::clone(&gate))
        } else {
            worker
        };
        tasks.push(tokio::spawn(worker.run(stop_rx.clone())));
    }

    if settings.ping_enabled {
        let mut worker = PingWorker::new(
            Arc::clone(&reporter),
            PingWorkerSettings {
                interval: settings.ping_interval,
                email_domain: settings.email_domain.clone(),
                inventory_interval: settings.inventory_interval,
                batch_size: settings.batch_size,
            },
        );
        if settings.inventory_interval.is_some() {
            worker = worker.with_inventory(Arc::clone(&inventory));
        }
        tasks.push(tokio::spawn(worker.run(stop_rx.clone())));
    }

    let shutdown = shutdown_signal();
    tracing::info!(workers = tasks.len(), "install-guard agent running");
    shutdown.await;
    let _ = stop_tx.send(true);

    for result in futures::future::join_all(tasks).await {
        if let Err(e) = result {
            tracing::error!(error = %e, "Background task ended abnormally");
        }
    }
    tracing::info!("install-guard agent stopped");
    Ok(ExitCode::Success)
}

async fn scan(settings: &AgentSettings) -> Result<ExitCode> {
    let inventory = DirectoryInventory::new(settings.watch_roots.clone());
    let snapshot = inventory.snapshot().await?;
    let policy = risk_policy(settings);

    let entries: Vec<_> = snapshot
        .sorted_records()
        .into_iter()
        .map(|record| (record.clone(), policy.assess(record)))
        .collect();
    ScanPresenter::for_stdout().present(&entries)?;
    Ok(ExitCode::Success)
}

async fn verify(settings: &AgentSettings, path: &Path) -> Result<ExitCode> {
    if !path.exists() {
        return Err(AgentError::InvalidPath {
            path: path.to_path_buf(),
            reason: "Path does not exist".to_string(),
        }
        .into());
    }

    let identity = detect_host_identity().await;
    let gate = verification_gate(settings, policy_backend(settings)?, identity);
    let decision = gate.verify(&InstallAttempt::from_path(path)).await;

    if decision.allow {
        println!("ALLOW {}: {}", path.display(), decision.reason);
        Ok(ExitCode::Success)
    } else {
        println!("DENY {}: {}", path.display(), decision.reason);
        Ok(ExitCode::Denied)
    }
}

async fn restore(settings: &AgentSettings, path: &Path, to: Option<&Path>) -> Result<ExitCode> {
    let destination = to.unwrap_or(&settings.restore_dir);
    let cleanup = CleanupQueue::new(Arc::new(FsFileRemover), settings.cleanup_delay);
    let enforcer = EnforcementCoordinator::new(
        Arc::new(DirectoryQuarantine::new(&settings.quarantine_dir)),
        cleanup.scheduler(),
    );

    let restored = enforcer.restore(path, destination).await?;
    println!("Restored {}", restored.display());
    Ok(ExitCode::Success)
}

async fn health(settings: &AgentSettings) -> Result<ExitCode> {
    let backend = policy_backend(settings)?;
    backend.health_check().await?;
    println!("Policy backend at {} is healthy", settings.backend_url);
    Ok(ExitCode::Success)
}
