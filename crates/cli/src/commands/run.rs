//! `run` command implementation.

use std::num::NonZeroUsize;
use std::time::Duration;

use anyhow::{Context, Result};
use contracts::{CancellationToken, MediatorConfig};
use dispatcher::{Dispatcher, HandlerRegistry};
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::workload::{self, WorkloadConfig};

/// Execute the `run` command
pub async fn run_workload(args: &RunArgs) -> Result<()> {
    let config = load_config(args)?;

    let metrics_port = match args.metrics_port {
        0 => config.observability.metrics_port,
        port => Some(port),
    };
    if let Some(port) = metrics_port {
        observability::init_metrics_only(port)?;
    }

    let workload_config = WorkloadConfig {
        handlers: args.handlers,
        notifications: args.notifications,
        delay: Duration::from_millis(args.delay_ms),
        fail_every: (args.fail_every > 0).then_some(args.fail_every),
    };

    let registry = HandlerRegistry::new();
    let invocations = workload::register_handlers(&registry, &workload_config)?;

    let mut builder = Dispatcher::builder(registry)
        .from_config(&config)
        .context("Invalid publisher configuration")?;
    if let Some(kind) = args.strategy {
        builder = builder.strategy(kind.into());
    }
    if let Some(cap) = args.max_concurrency {
        let cap = NonZeroUsize::new(cap).context("--max-concurrency must be greater than zero")?;
        builder = builder.max_concurrency(cap);
    }
    let dispatcher = dispatcher::install_global(builder.build())?;

    let cancel = CancellationToken::new();
    let signal = tokio::spawn(cancel_on_shutdown(cancel.clone()));

    info!(strategy = dispatcher.strategy_name(), "Starting workload...");
    let stats = workload::run(&dispatcher, &workload_config, &invocations, cancel).await;
    signal.abort();

    if stats.cancelled {
        warn!(published = stats.published, "Workload cancelled");
    }
    info!(
        published = stats.published,
        duration_secs = stats.duration.as_secs_f64(),
        throughput = format!("{:.2}", stats.throughput()),
        "Workload finished"
    );
    stats.print_summary();

    Ok(())
}

fn load_config(args: &RunArgs) -> Result<MediatorConfig> {
    let Some(path) = &args.config else {
        info!("No configuration file given, using defaults");
        return Ok(MediatorConfig::default());
    };

    info!(config = %path.display(), "Loading configuration");
    if !path.exists() {
        anyhow::bail!("Configuration file not found: {}", path.display());
    }

    config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Cancel `token` on Ctrl+C or SIGTERM
async fn cancel_on_shutdown(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    warn!("Received shutdown signal, cancelling in-flight publish");
    token.cancel();
}
