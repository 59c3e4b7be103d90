//! Publish metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

use contracts::PublishError;

/// Counters for one dispatcher
#[derive(Debug, Default)]
pub struct PublishMetrics {
    /// Total publish calls
    publish_count: AtomicU64,
    /// Total handlers resolved across all publishes
    handlers_resolved: AtomicU64,
    /// Publishes that completed successfully
    success_count: AtomicU64,
    /// Publishes that ended with a handler or lookup failure
    failure_count: AtomicU64,
    /// Publishes that ended with a cancellation outcome
    cancelled_count: AtomicU64,
}

impl PublishMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get total publish count
    pub fn publish_count(&self) -> u64 {
        self.publish_count.load(Ordering::Relaxed)
    }

    /// Record the start of a publish and the number of resolved handlers
    pub fn record_started(&self, handlers: usize) {
        self.publish_count.fetch_add(1, Ordering::Relaxed);
        self.handlers_resolved
            .fetch_add(handlers as u64, Ordering::Relaxed);
    }

    /// Record the outcome of a publish
    pub fn record_finished<T>(&self, result: &Result<T, PublishError>) {
        let counter = match result {
            Ok(_) => &self.success_count,
            Err(e) if e.is_cancelled() => &self.cancelled_count,
            Err(_) => &self.failure_count,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a lookup failure (the publish never started)
    pub fn record_lookup_failure(&self) {
        self.publish_count.fetch_add(1, Ordering::Relaxed);
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get handlers resolved count
    pub fn handlers_resolved(&self) -> u64 {
        self.handlers_resolved.load(Ordering::Relaxed)
    }

    /// Get success count
    pub fn success_count(&self) -> u64 {
        self.success_count.load(Ordering::Relaxed)
    }

    /// Get failure count
    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Get cancelled count
    pub fn cancelled_count(&self) -> u64 {
        self.cancelled_count.load(Ordering::Relaxed)
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            publish_count: self.publish_count(),
            handlers_resolved: self.handlers_resolved(),
            success_count: self.success_count(),
            failure_count: self.failure_count(),
            cancelled_count: self.cancelled_count(),
        }
    }
}

/// Snapshot of publish metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub publish_count: u64,
    pub handlers_resolved: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub cancelled_count: u64,
}
