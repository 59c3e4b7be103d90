//! MediatorConfig - Config Loader output
//!
//! Describes the publish strategy and the observability settings of a process.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete mediator configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediatorConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Publish strategy selection
    #[serde(default)]
    pub publisher: PublisherConfig,

    /// Logging and metrics
    #[serde(default)]
    pub observability: ObservabilitySettings,
}

/// Publish strategy selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Strategy installed for the whole process
    #[serde(default)]
    pub strategy: StrategyKind,

    /// Upper bound on in-flight handlers (`when_all` only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,
}

/// Built-in publish strategies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Await each handler before starting the next, stop at the first failure
    #[default]
    Sequential,
    /// Spawn every handler at once and join them as they finish
    Concurrent,
    /// Submit the whole batch and await it as one unit
    WhenAll,
}

impl StrategyKind {
    /// All built-in strategies
    pub const ALL: [StrategyKind; 3] = [Self::Sequential, Self::Concurrent, Self::WhenAll];

    /// Stable snake_case name, identical to the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Concurrent => "concurrent",
            Self::WhenAll => "when_all",
        }
    }

    /// Whether handlers of one publish may run at the same time
    pub fn is_concurrent(&self) -> bool {
        !matches!(self, Self::Sequential)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown strategy '{s}', expected one of: sequential, concurrent, when_all"))
    }
}

/// Observability settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilitySettings {
    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,

    /// Default log level when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Prometheus exporter port (None = disabled)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_port: Option<u16>,
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            metrics_port: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// JSON structured logs
    Json,
    /// Human-readable format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_kind_names() {
        for kind in StrategyKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            assert_eq!(kind.as_str().parse::<StrategyKind>().unwrap(), kind);
        }
        assert!("parallel".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = MediatorConfig::default();
        assert_eq!(config.publisher.strategy, StrategyKind::Sequential);
        assert_eq!(config.publisher.max_concurrency, None);
        assert_eq!(config.observability.log_level, "info");
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_deserialize_empty_object() {
        let config: MediatorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.version, ConfigVersion::V1);
        assert!(!config.publisher.strategy.is_concurrent());
    }
}
