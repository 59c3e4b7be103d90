//! Logging setup: `[observability]` settings with command-line overrides.

use anyhow::Result;
use contracts::ObservabilitySettings;
use observability::ObservabilityConfig;

use crate::cli::Cli;

/// Initialize tracing for the command about to run
///
/// The configuration file is read leniently here; a broken file falls back to
/// defaults and the command itself reports the load error.
pub fn init_logging(cli: &Cli) -> Result<()> {
    let settings = cli
        .command
        .config_path()
        .and_then(|path| config_loader::ConfigLoader::load_from_path(path).ok())
        .map(|config| config.observability)
        .unwrap_or_default();

    observability::init_with_config(logging_config(cli, &settings))
}

/// Merge file settings with `-v` / `-q` / `--log-format`
pub fn logging_config(cli: &Cli, settings: &ObservabilitySettings) -> ObservabilityConfig {
    let mut config = ObservabilityConfig::from_settings(settings);

    // `run` installs the exporter itself so `--metrics-port` can override it
    config.metrics_port = None;

    if let Some(format) = cli.log_format {
        config.log_format = format.into();
    }

    if cli.quiet {
        config.default_log_level = "warn".to_string();
    } else if cli.verbose > 0 {
        let level = if cli.verbose == 1 { "debug" } else { "trace" };
        config.default_log_level = level.to_string();
    }

    config
}
