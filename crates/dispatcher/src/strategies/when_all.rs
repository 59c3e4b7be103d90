//! WhenAllPublisher - submits the whole batch and awaits it as one unit

use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use contracts::{Notification, PublishError};

use super::{ensure_not_cancelled, PublishOutcome, PublishStrategy};
use crate::binding::HandlerBinding;

/// Strategy that builds one future per handler and awaits the batch together
///
/// Outcome is the same as [`ConcurrentPublisher`](super::ConcurrentPublisher):
/// every handler runs, every failure is collected. The futures are polled on
/// the caller's task instead of being spawned, and an optional cap bounds how
/// many handlers are in flight at once.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhenAllPublisher {
    max_concurrency: Option<NonZeroUsize>,
}

impl WhenAllPublisher {
    /// Unbounded batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Batch with at most `cap` handlers in flight
    pub fn with_max_concurrency(cap: NonZeroUsize) -> Self {
        Self {
            max_concurrency: Some(cap),
        }
    }

    /// Configured concurrency cap
    pub fn max_concurrency(&self) -> Option<NonZeroUsize> {
        self.max_concurrency
    }
}

#[async_trait]
impl PublishStrategy for WhenAllPublisher {
    fn name(&self) -> &str {
        "when_all"
    }

    #[instrument(
        name = "when_all_publish",
        skip_all,
        fields(
            notification = _notification.name(),
            handlers = bindings.len(),
            max_concurrency = ?self.max_concurrency
        )
    )]
    async fn publish(
        &self,
        bindings: Vec<HandlerBinding>,
        _notification: Arc<dyn Notification>,
        cancel: CancellationToken,
    ) -> Result<PublishOutcome, PublishError> {
        ensure_not_cancelled(&cancel)?;

        let batch = bindings
            .into_iter()
            .map(|binding| binding.run(cancel.clone()));

        let results: Vec<Result<(), PublishError>> = match self.max_concurrency {
            None => join_all(batch).await,
            Some(cap) => stream::iter(batch).buffer_unordered(cap.get()).collect().await,
        };

        let mut completed = 0;
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(()) => completed += 1,
                Err(e) => {
                    warn!(error = %e, "Handler failed");
                    failures.push(e);
                }
            }
        }

        debug!(completed, failed = failures.len(), "Batch settled");

        match PublishError::from_failures(failures) {
            Some(e) => Err(e),
            None => Ok(PublishOutcome::new(completed)),
        }
    }
}
