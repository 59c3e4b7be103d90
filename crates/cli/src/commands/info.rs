//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{LogFormat, MediatorConfig, StrategyKind};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    publisher: PublisherInfo,
    observability: ObservabilityInfo,
    available_strategies: Vec<StrategyKind>,
}

#[derive(Serialize)]
struct PublisherInfo {
    strategy: StrategyKind,
    concurrent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_concurrency: Option<usize>,
}

#[derive(Serialize)]
struct ObservabilityInfo {
    log_format: LogFormat,
    log_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics_port: Option<u16>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let json = serde_json::to_string_pretty(&build_config_info(&config))
            .context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config);
    }

    Ok(())
}

fn build_config_info(config: &MediatorConfig) -> ConfigInfo {
    ConfigInfo {
        version: format!("{:?}", config.version),
        publisher: PublisherInfo {
            strategy: config.publisher.strategy,
            concurrent: config.publisher.strategy.is_concurrent(),
            max_concurrency: config.publisher.max_concurrency,
        },
        observability: ObservabilityInfo {
            log_format: config.observability.log_format,
            log_level: config.observability.log_level.clone(),
            metrics_port: config.observability.metrics_port,
        },
        available_strategies: StrategyKind::ALL.to_vec(),
    }
}

fn print_config_info(config: &MediatorConfig) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  Mediator Configuration                      ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📨 Publisher");
    println!("   ├─ Version: {:?}", config.version);
    println!("   ├─ Strategy: {}", config.publisher.strategy);
    match config.publisher.max_concurrency {
        Some(cap) => println!("   └─ Max concurrency: {}", cap),
        None => println!("   └─ Max concurrency: unbounded"),
    }

    let obs = &config.observability;
    println!("\n📊 Observability");
    println!("   ├─ Log format: {:?}", obs.log_format);
    println!("   ├─ Log level: {}", obs.log_level);
    match obs.metrics_port {
        Some(port) => println!("   └─ Metrics: 0.0.0.0:{}", port),
        None => println!("   └─ Metrics: disabled"),
    }

    println!("\n⚙️  Available strategies");
    for (i, kind) in StrategyKind::ALL.iter().enumerate() {
        let prefix = if i == StrategyKind::ALL.len() - 1 { "└─" } else { "├─" };
        let marker = if *kind == config.publisher.strategy { " (active)" } else { "" };
        println!("   {} {}{}", prefix, kind, marker);
    }

    println!();
}
