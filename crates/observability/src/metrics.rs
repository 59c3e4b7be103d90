//! Mediator 指标收集模块
//!
//! 记录 publish 调用的结果、耗时和 handler 扇出数量。

use std::collections::BTreeMap;

use metrics::{counter, histogram};

/// 成功 publish 的 outcome 标签
pub const OUTCOME_OK: &str = "ok";

/// 记录一次 publish 的结果
///
/// `outcome` 为 [`OUTCOME_OK`] 或 `PublishError::as_label()` 的返回值。
///
/// # Example
///
/// ```ignore
/// let started = Instant::now();
/// let result = strategy.publish(bindings, notification, cancel).await;
/// let label = result.as_ref().map_or_else(|e| e.as_label(), |_| OUTCOME_OK);
/// record_publish("OrderPlaced", "sequential", 3, label, elapsed_ms(started));
/// ```
pub fn record_publish(
    notification: &str,
    strategy: &str,
    handlers: usize,
    outcome: &str,
    elapsed_ms: f64,
) {
    counter!(
        "mediator_publish_total",
        "notification" => notification.to_string(),
        "strategy" => strategy.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        "mediator_publish_duration_ms",
        "strategy" => strategy.to_string()
    )
    .record(elapsed_ms);

    histogram!("mediator_publish_handlers", "strategy" => strategy.to_string())
        .record(handlers as f64);
}

/// 记录失败的 handler 数量
pub fn record_handler_failure(notification: &str, strategy: &str, failures: usize) {
    if failures == 0 {
        return;
    }
    counter!(
        "mediator_handler_failures_total",
        "notification" => notification.to_string(),
        "strategy" => strategy.to_string()
    )
    .increment(failures as u64);
}

/// 记录 handler 查找失败 (publish 未开始)
pub fn record_lookup_failure(notification: &str) {
    counter!(
        "mediator_lookup_failures_total",
        "notification" => notification.to_string()
    )
    .increment(1);
}

/// Publish 指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct PublishStatsAggregator {
    /// 总 publish 次数
    pub total_publishes: u64,

    /// 成功次数
    pub successes: u64,

    /// 失败的 handler 总数
    pub handler_failures: u64,

    /// 耗时统计 (毫秒)
    pub latency_stats: RunningStats,

    /// 每次 publish 的 handler 数量统计
    pub fanout_stats: RunningStats,

    /// 各 outcome 次数
    pub outcome_counts: BTreeMap<String, u64>,
}

impl PublishStatsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, handlers: usize, failures: usize, outcome: &str, elapsed_ms: f64) {
        self.total_publishes += 1;
        if outcome == OUTCOME_OK {
            self.successes += 1;
        }
        self.handler_failures += failures as u64;
        self.latency_stats.push(elapsed_ms);
        self.fanout_stats.push(handlers as f64);
        *self.outcome_counts.entry(outcome.to_string()).or_insert(0) += 1;
    }

    /// 生成摘要报告
    pub fn summary(&self) -> PublishSummary {
        PublishSummary {
            total_publishes: self.total_publishes,
            successes: self.successes,
            handler_failures: self.handler_failures,
            success_rate: if self.total_publishes > 0 {
                self.successes as f64 / self.total_publishes as f64 * 100.0
            } else {
                0.0
            },
            latency_ms: StatsSummary::from(&self.latency_stats),
            handlers_per_publish: StatsSummary::from(&self.fanout_stats),
            outcome_counts: self.outcome_counts.clone(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct PublishSummary {
    pub total_publishes: u64,
    pub successes: u64,
    pub handler_failures: u64,
    pub success_rate: f64,
    pub latency_ms: StatsSummary,
    pub handlers_per_publish: StatsSummary,
    pub outcome_counts: BTreeMap<String, u64>,
}

impl std::fmt::Display for PublishSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Publish Summary ===")?;
        writeln!(f, "Total publishes: {}", self.total_publishes)?;
        writeln!(
            f,
            "Successful: {} ({:.2}%)",
            self.successes, self.success_rate
        )?;
        writeln!(f, "Failed handlers: {}", self.handler_failures)?;
        writeln!(f, "Latency (ms): {}", self.latency_ms)?;
        writeln!(f, "Handlers per publish: {}", self.handlers_per_publish)?;

        if !self.outcome_counts.is_empty() {
            writeln!(f, "Outcomes:")?;
            for (outcome, count) in &self.outcome_counts {
                writeln!(f, "  {}: {}", outcome, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.mean }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for value in [2.0, 4.0, 6.0, 8.0] {
            stats.push(value);
        }

        assert_eq!(stats.count(), 4);
        assert!((stats.mean() - 5.0).abs() < 1e-10);
        assert!((stats.min() - 2.0).abs() < 1e-10);
        assert!((stats.max() - 8.0).abs() < 1e-10);
        assert!((stats.variance() - 20.0 / 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = PublishStatsAggregator::new();

        aggregator.update(3, 0, OUTCOME_OK, 1.5);
        aggregator.update(3, 2, "aggregate_failed", 4.0);
        aggregator.update(0, 0, "cancelled", 0.1);

        assert_eq!(aggregator.total_publishes, 3);
        assert_eq!(aggregator.successes, 1);
        assert_eq!(aggregator.handler_failures, 2);
        assert_eq!(aggregator.outcome_counts.get("cancelled"), Some(&1));

        let summary = aggregator.summary();
        assert!((summary.success_rate - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.handlers_per_publish.count, 3);
        assert!((summary.latency_ms.max - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = PublishStatsAggregator::new();
        for _ in 0..4 {
            aggregator.update(2, 0, OUTCOME_OK, 2.0);
        }
        aggregator.update(2, 1, "handler_failed", 2.0);

        let output = aggregator.summary().to_string();
        assert!(output.contains("Total publishes: 5"), "{output}");
        assert!(output.contains("80.00%"), "{output}");
        assert!(output.contains("handler_failed: 1"), "{output}");
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_publish("OrderPlaced", "sequential", 2, OUTCOME_OK, 0.5);
        record_handler_failure("OrderPlaced", "concurrent", 1);
        record_lookup_failure("OrderPlaced");
    }
}
