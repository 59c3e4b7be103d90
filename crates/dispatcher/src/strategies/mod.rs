//! Publish strategies
//!
//! Contains SequentialPublisher, ConcurrentPublisher, and WhenAllPublisher.

mod concurrent;
mod sequential;
mod when_all;

use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use contracts::{Notification, PublishError, StrategyKind};

use crate::binding::HandlerBinding;

pub use self::concurrent::ConcurrentPublisher;
pub use self::sequential::SequentialPublisher;
pub use self::when_all::WhenAllPublisher;

/// Successful publish summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublishOutcome {
    /// Number of handlers that completed
    pub handlers: usize,
}

impl PublishOutcome {
    pub fn new(handlers: usize) -> Self {
        Self { handlers }
    }
}

/// Publish strategy trait
///
/// Decides how the bindings of one publish are executed. A strategy is
/// installed once per process and shared by every concurrent caller, so it
/// must not keep per-publish state.
#[async_trait]
pub trait PublishStrategy: Send + Sync + 'static {
    /// Strategy name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Drive every binding and return a single result
    ///
    /// # Errors
    /// [`PublishError::Cancelled`] when `cancel` fired before handlers were started,
    /// otherwise the handler failure(s) according to the strategy's policy.
    async fn publish(
        &self,
        bindings: Vec<HandlerBinding>,
        notification: Arc<dyn Notification>,
        cancel: CancellationToken,
    ) -> Result<PublishOutcome, PublishError>;
}

/// Create a built-in strategy
///
/// `max_concurrency` only applies to [`StrategyKind::WhenAll`].
pub fn create_strategy(
    kind: StrategyKind,
    max_concurrency: Option<NonZeroUsize>,
) -> Arc<dyn PublishStrategy> {
    match kind {
        StrategyKind::Sequential => Arc::new(SequentialPublisher::new()),
        StrategyKind::Concurrent => Arc::new(ConcurrentPublisher::new()),
        StrategyKind::WhenAll => match max_concurrency {
            Some(cap) => Arc::new(WhenAllPublisher::with_max_concurrency(cap)),
            None => Arc::new(WhenAllPublisher::new()),
        },
    }
}

/// Shared pre-flight check: a token cancelled before the fan-out starts
/// stops the publish with zero handler invocations.
fn ensure_not_cancelled(cancel: &CancellationToken) -> Result<(), PublishError> {
    if cancel.is_cancelled() {
        Err(PublishError::cancelled())
    } else {
        Ok(())
    }
}
