//! SequentialPublisher - awaits each handler before starting the next

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};

use contracts::{Notification, PublishError};

use super::{ensure_not_cancelled, PublishOutcome, PublishStrategy};
use crate::binding::HandlerBinding;

/// Strategy that invokes handlers one at a time, in lookup order
///
/// - Handler N+1 starts only after handler N finished, so it observes N's side effects
/// - The first failure stops the publish; remaining handlers are never invoked
/// - The token is checked before every handler
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialPublisher;

impl SequentialPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PublishStrategy for SequentialPublisher {
    fn name(&self) -> &str {
        "sequential"
    }

    #[instrument(
        name = "sequential_publish",
        skip_all,
        fields(notification = _notification.name(), handlers = bindings.len())
    )]
    async fn publish(
        &self,
        bindings: Vec<HandlerBinding>,
        _notification: Arc<dyn Notification>,
        cancel: CancellationToken,
    ) -> Result<PublishOutcome, PublishError> {
        ensure_not_cancelled(&cancel)?;

        let mut completed = 0;
        for binding in bindings {
            ensure_not_cancelled(&cancel)?;

            let handler = binding.handler_name().to_string();
            if let Err(e) = binding.run(cancel.clone()).await {
                warn!(
                    handler = %handler,
                    completed,
                    error = %e,
                    "Handler failed, skipping remaining handlers"
                );
                return Err(e);
            }
            completed += 1;
        }

        Ok(PublishOutcome::new(completed))
    }
}
