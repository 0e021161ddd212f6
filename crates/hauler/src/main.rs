//! Hauler - Configurable event-ingestion and transformation pipeline
//!
//! # Usage
//!
//! ```bash
//! # Run a topology
//! hauler --config hauler.yml
//!
//! # Directory of config files, four workers per input, auto-reload
//! hauler --config conf.d/ --worker 4 --reload
//!
//! # Pipe mode: exit once stdin closes
//! cat events.jsonl | hauler --config pipe.yml --exit-when-nil
//! ```
//!
//! SIGINT/SIGTERM drain and terminate; SIGUSR1 reloads the configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use hauler_config::ConfigWatcher;
use hauler_pipeline::{Supervisor, SupervisorSettings};
use hauler_topology::Registry;

/// Configurable event-ingestion and transformation pipeline
#[derive(Parser, Debug)]
#[command(name = "hauler")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a configuration file or a directory of files
    #[arg(short, long, default_value = "hauler.yml")]
    config: PathBuf,

    /// Reload automatically when the configuration changes
    #[arg(long)]
    reload: bool,

    /// Worker chains per input box (positive)
    #[arg(short, long, default_value_t = 1)]
    worker: usize,

    /// Terminate the whole process when an input reports a nil event
    #[arg(long)]
    exit_when_nil: bool,

    /// Bound on waiting for a generation to drain, in seconds
    #[arg(long, default_value = "30")]
    drain_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    if cli.worker == 0 {
        anyhow::bail!("--worker must be a positive integer");
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        workers = cli.worker,
        "hauler starting"
    );

    let supervisor = Supervisor::new(
        &cli.config,
        Arc::new(builtin_registry()),
        SupervisorSettings {
            worker_count: cli.worker,
            exit_when_nil: cli.exit_when_nil,
            drain_deadline: Duration::from_secs(cli.drain_timeout),
        },
    );
    let cancel = supervisor.cancel_token();
    let reload = supervisor.reload_handle();

    tokio::spawn(listen_signals(cancel.clone(), reload.clone()));

    if cli.reload {
        info!(config = %cli.config.display(), "config auto-reload enabled");
        tokio::spawn(ConfigWatcher::new(&cli.config).run(reload, cancel.clone()));
    }

    supervisor.run().await?;

    info!("hauler shutdown complete");
    Ok(())
}

/// Every driver the binary ships with.
fn builtin_registry() -> Registry {
    let mut registry = Registry::new();
    hauler_inputs::register_builtins(&mut registry);
    hauler_filters::register_builtins(&mut registry);
    hauler_outputs::register_builtins(&mut registry);
    registry
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();

    Ok(())
}

/// Termination signals cancel the supervisor; SIGUSR1 triggers reload.
#[cfg(unix)]
async fn listen_signals(cancel: CancellationToken, reload: mpsc::Sender<()>) {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate =
        signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    let mut reload_signal =
        signal(SignalKind::user_defined1()).expect("failed to install SIGUSR1 handler");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, shutting down");
                cancel.cancel();
                return;
            }
            _ = terminate.recv() => {
                info!("terminate received, shutting down");
                cancel.cancel();
                return;
            }
            _ = reload_signal.recv() => {
                info!("SIGUSR1 received, triggering reload");
                // A full mailbox means a reload is already pending.
                let _ = reload.try_send(());
            }
        }
    }
}

#[cfg(not(unix))]
async fn listen_signals(cancel: CancellationToken, _reload: mpsc::Sender<()>) {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    info!("interrupt received, shutting down");
    cancel.cancel();
}
