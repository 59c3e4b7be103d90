//! 配置校验模块
//!
//! 校验规则：
//! - max_concurrency > 0
//! - max_concurrency 仅适用于 when_all
//! - log_level 为已知级别

use contracts::{ConfigError, MediatorConfig, StrategyKind};

const KNOWN_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// 校验 MediatorConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &MediatorConfig) -> Result<(), ConfigError> {
    validate_publisher(config)?;
    validate_log_level(config)?;
    Ok(())
}

/// 校验 publisher 配置
fn validate_publisher(config: &MediatorConfig) -> Result<(), ConfigError> {
    let publisher = &config.publisher;
    let Some(cap) = publisher.max_concurrency else {
        return Ok(());
    };

    if cap == 0 {
        return Err(ConfigError::validation(
            "publisher.max_concurrency",
            "max_concurrency must be > 0",
        ));
    }

    if publisher.strategy != StrategyKind::WhenAll {
        return Err(ConfigError::validation(
            "publisher.max_concurrency",
            format!(
                "max_concurrency is only supported by when_all, strategy is '{}'",
                publisher.strategy
            ),
        ));
    }

    Ok(())
}

/// 校验日志级别
fn validate_log_level(config: &MediatorConfig) -> Result<(), ConfigError> {
    let level = config.observability.log_level.to_lowercase();
    if KNOWN_LEVELS.contains(&level.as_str()) {
        Ok(())
    } else {
        Err(ConfigError::validation(
            "observability.log_level",
            format!(
                "unknown log level '{}', expected one of: {}",
                config.observability.log_level,
                KNOWN_LEVELS.join(", ")
            ),
        ))
    }
}
