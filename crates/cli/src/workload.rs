//! Synthetic workload: registers handlers, publishes ticks, collects statistics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use contracts::{CancellationToken, HandlerError, Notification, NotificationHandler};
use dispatcher::{Dispatcher, HandlerRegistry, MetricsSnapshot};
use observability::{PublishStatsAggregator, OUTCOME_OK};
use tracing::{debug, info, warn};

/// Notification published by the workload
#[derive(Debug, Clone, Copy)]
pub struct Tick {
    pub seq: u64,
}

impl Notification for Tick {
    fn name(&self) -> &'static str {
        "Tick"
    }
}

/// Handler that simulates work and fails on a fixed cadence
pub struct SyntheticHandler {
    name: String,
    delay: Duration,
    fail_every: Option<u64>,
    invocations: Arc<AtomicU64>,
}

#[async_trait]
impl NotificationHandler<Tick> for SyntheticHandler {
    async fn handle(&self, tick: Arc<Tick>, cancel: CancellationToken) -> Result<(), HandlerError> {
        self.invocations.fetch_add(1, Ordering::Relaxed);

        if !self.delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return Err(HandlerError::Cancelled),
                _ = tokio::time::sleep(self.delay) => {}
            }
        }

        if let Some(k) = self.fail_every {
            if tick.seq % k == 0 {
                return Err(HandlerError::failed(format!(
                    "synthetic failure on tick {}",
                    tick.seq
                )));
            }
        }

        debug!(handler = %self.name, seq = tick.seq, "Tick handled");
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Workload parameters
#[derive(Debug, Clone)]
pub struct WorkloadConfig {
    pub handlers: usize,
    pub notifications: u64,
    pub delay: Duration,
    /// None = never fail
    pub fail_every: Option<u64>,
}

/// Statistics from a workload run
#[derive(Debug, Clone, Default)]
pub struct WorkloadStats {
    pub published: u64,
    pub cancelled: bool,
    pub handler_invocations: u64,
    pub duration: Duration,
    pub strategy: String,
    pub dispatcher: MetricsSnapshot,
    pub publishes: PublishStatsAggregator,
}

impl WorkloadStats {
    /// Publishes per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.published as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Workload Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Strategy: {}", self.strategy);
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Published: {}", self.published);
        println!("   ├─ Throughput: {:.2}/s", self.throughput());
        println!("   ├─ Handler invocations: {}", self.handler_invocations);
        println!("   └─ Cancelled: {}", self.cancelled);

        let snap = &self.dispatcher;
        println!("\n📈 Dispatcher Counters");
        println!("   ├─ Succeeded: {}", snap.success_count);
        println!("   ├─ Failed: {}", snap.failure_count);
        println!("   └─ Cancelled: {}", snap.cancelled_count);

        println!("\n{}", self.publishes.summary());
    }
}

/// Register the synthetic handlers on `registry`
pub fn register_handlers(
    registry: &HandlerRegistry,
    config: &WorkloadConfig,
) -> anyhow::Result<Arc<AtomicU64>> {
    let invocations = Arc::new(AtomicU64::new(0));
    for i in 0..config.handlers {
        registry.register::<Tick>(Arc::new(SyntheticHandler {
            name: format!("synthetic-{i}"),
            delay: config.delay,
            fail_every: config.fail_every,
            invocations: Arc::clone(&invocations),
        }))?;
    }
    Ok(invocations)
}

/// Publish `config.notifications` ticks, stopping early when `cancel` fires
pub async fn run(
    dispatcher: &Dispatcher,
    config: &WorkloadConfig,
    invocations: &AtomicU64,
    cancel: CancellationToken,
) -> WorkloadStats {
    let started = Instant::now();
    let mut stats = WorkloadStats {
        strategy: dispatcher.strategy_name().to_string(),
        ..Default::default()
    };

    info!(
        strategy = %stats.strategy,
        handlers = config.handlers,
        notifications = config.notifications,
        "Workload started"
    );

    for seq in 1..=config.notifications {
        if cancel.is_cancelled() {
            stats.cancelled = true;
            break;
        }

        let publish_started = Instant::now();
        let result = dispatcher.publish(Tick { seq }, cancel.clone()).await;
        let elapsed_ms = publish_started.elapsed().as_secs_f64() * 1000.0;
        stats.published += 1;

        match result {
            Ok(outcome) => {
                stats
                    .publishes
                    .update(outcome.handlers, 0, OUTCOME_OK, elapsed_ms);
            }
            Err(e) => {
                warn!(seq, error = %e, "Publish failed");
                stats.publishes.update(
                    config.handlers,
                    e.failures().len(),
                    e.as_label(),
                    elapsed_ms,
                );
                if e.is_cancelled() {
                    stats.cancelled = true;
                    break;
                }
            }
        }
    }

    stats.duration = started.elapsed();
    stats.handler_invocations = invocations.load(Ordering::Relaxed);
    stats.dispatcher = dispatcher.metrics();
    stats
}
