//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{MediatorConfig, StrategyKind};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    strategy: StrategyKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_concurrency: Option<usize>,
    log_level: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: Vec::new(),
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => ValidationResult {
            valid: true,
            config_path,
            error: None,
            warnings: collect_warnings(&config),
            summary: Some(ConfigSummary {
                version: format!("{:?}", config.version),
                strategy: config.publisher.strategy,
                max_concurrency: config.publisher.max_concurrency,
                log_level: config.observability.log_level.clone(),
            }),
        },
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: Vec::new(),
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &MediatorConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    match (config.publisher.strategy, config.publisher.max_concurrency) {
        (StrategyKind::Concurrent, _) => warnings.push(
            "strategy 'concurrent' does not bound in-flight handlers; use when_all with max_concurrency to cap them"
                .to_string(),
        ),
        (StrategyKind::WhenAll, None) => {
            warnings.push("strategy 'when_all' without max_concurrency is unbounded".to_string())
        }
        _ => {}
    }

    if config.observability.log_level.eq_ignore_ascii_case("trace") {
        warnings.push("log_level 'trace' logs every handler start and finish".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Strategy: {}", summary.strategy);
            if let Some(cap) = summary.max_concurrency {
                println!("  Max concurrency: {}", cap);
            }
            println!("  Log level: {}", summary.log_level);
        }

        if !result.warnings.is_empty() {
            println!("\n⚠ Warnings:");
            for warning in &result.warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
