//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::StrategyKind;
use std::path::{Path, PathBuf};

/// Mediator - in-process notification publish/handle engine
#[derive(Parser, Debug)]
#[command(
    name = "mediator",
    author,
    version,
    about = "In-process notification mediator",
    long_about = "Publishes notifications to every registered handler using a \n\
                  configurable strategy (sequential, concurrent, when_all).\n\n\
                  Use `run` to drive a synthetic workload against a configuration."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "MEDIATOR_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format (defaults to `[observability] log_format`)
    #[arg(long, value_enum, global = true, env = "MEDIATOR_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Publish a synthetic workload through the mediator
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

impl Commands {
    /// Configuration file the command operates on, if any
    pub fn config_path(&self) -> Option<&Path> {
        match self {
            Self::Run(args) => args.config.as_deref(),
            Self::Validate(args) => Some(&args.config),
            Self::Info(args) => Some(&args.config),
        }
    }
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); defaults apply when omitted
    #[arg(short, long, env = "MEDIATOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the publish strategy from configuration
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Override max_concurrency (when_all only)
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// Number of synthetic handlers to register
    #[arg(long, default_value = "3")]
    pub handlers: usize,

    /// Number of notifications to publish
    #[arg(long, default_value = "10")]
    pub notifications: u64,

    /// Simulated work per handler invocation in milliseconds
    #[arg(long, default_value = "0")]
    pub delay_ms: u64,

    /// Make handlers fail on every K-th notification (0 = never)
    #[arg(long, default_value = "0")]
    pub fail_every: u64,

    /// Metrics server port (0 = use configuration)
    #[arg(long, default_value = "0", env = "MEDIATOR_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "mediator.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "mediator.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for contracts::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => contracts::LogFormat::Json,
            LogFormat::Pretty => contracts::LogFormat::Pretty,
            LogFormat::Compact => contracts::LogFormat::Compact,
        }
    }
}

/// Publish strategy selectable from the command line
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum StrategyArg {
    /// One handler at a time, stop at first failure
    Sequential,
    /// Spawn every handler, collect every failure
    Concurrent,
    /// Await the whole batch together, optionally capped
    WhenAll,
}

impl From<StrategyArg> for StrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Sequential => StrategyKind::Sequential,
            StrategyArg::Concurrent => StrategyKind::Concurrent,
            StrategyArg::WhenAll => StrategyKind::WhenAll,
        }
    }
}
