//! wardend - The appwarden background service
//!
//! This is the main entry point for the wardend service.
//! It wires together all the components:
//! - Configuration loading (file plus command-line rules)
//! - Host adapter (procfs or ps)
//! - Enforcement engine and scheduler
//! - Signal handling and event reporting

mod cli;
mod report;
mod unit;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use warden_config::Policy;
use warden_core::{EnforcementEngine, Scheduler};
use warden_host_api::ProcessHost;
use warden_host_linux::LinuxHost;

use crate::cli::{describe_policy, log_policy, Args, LogFormat};
use crate::report::EventReporter;

/// Main service state
struct Service {
    engine: EnforcementEngine,
    interval: Duration,
}

impl Service {
    fn new(policy: Policy) -> Result<Self> {
        let host: Arc<dyn ProcessHost> = Arc::new(LinuxHost::new());
        let engine = EnforcementEngine::new(&policy, host.clone());

        // An unreadable process table at startup is fatal; later failures are not
        let process_count = engine
            .check_host()
            .with_context(|| format!("Cannot read the process table via {}", host.name()))?;

        info!(
            host = host.name(),
            process_count,
            "Process table readable"
        );

        Ok(Self {
            engine,
            interval: policy.daemon.poll_interval,
        })
    }

    async fn run(mut self) -> Result<()> {
        // Set up signal handlers
        let mut sigterm = signal(SignalKind::terminate())
            .context("Failed to create SIGTERM handler")?;
        let mut sigint = signal(SignalKind::interrupt())
            .context("Failed to create SIGINT handler")?;
        let mut sighup = signal(SignalKind::hangup())
            .context("Failed to create SIGHUP handler")?;
        let mut sigusr1 = signal(SignalKind::user_defined1())
            .context("Failed to create SIGUSR1 handler")?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (status_tx, status_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down gracefully");
                        break;
                    }
                    _ = sigint.recv() => {
                        info!("Received SIGINT, shutting down gracefully");
                        break;
                    }
                    _ = sighup.recv() => {
                        info!("Received SIGHUP, shutting down gracefully");
                        break;
                    }

                    // Signal: SIGUSR1 - log a status snapshot
                    _ = sigusr1.recv() => {
                        if status_tx.send(()).is_err() {
                            break;
                        }
                    }
                }
            }

            let _ = shutdown_tx.send(true);
        });

        info!(interval_ms = self.interval.as_millis() as u64, "Service running");

        let mut reporter = EventReporter::default();
        Scheduler::new(self.interval, shutdown_rx)
            .with_status_requests(status_rx)
            .run(&mut self.engine, &mut reporter)
            .await;

        info!(kills = reporter.kills(), "Shutdown complete");
        Ok(())
    }
}

fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    match args.log_format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_unit {
        let exe = std::env::current_exe().context("Failed to resolve the wardend executable")?;
        let config = args
            .config
            .as_deref()
            .map(std::path::absolute)
            .transpose()
            .context("Failed to resolve the config path")?;
        let daemon_args = unit::daemon_args(std::env::args_os(), config.as_deref())
            .map_err(|arg| anyhow!("Argument {:?} is not valid UTF-8 and cannot go into a unit file", arg))?;
        print!("{}", unit::render_user_unit(&exe, &daemon_args));
        return Ok(());
    }

    // Initialize logging
    init_logging(&args);

    let policy = args.load_policy()?;

    if args.check {
        println!("Configuration is valid");
        print!("{}", describe_policy(&policy));
        return Ok(());
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "wardend starting"
    );

    if warden_util::is_mock_time_active() {
        warn!(now = %warden_util::now(), "Mock time is active, wall clock is shifted");
    }

    log_policy(&policy);

    // Create and run the service
    let service = Service::new(policy)?;
    service.run().await
}
