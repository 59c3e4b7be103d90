//! ConcurrentPublisher - spawns every handler and joins them as they finish

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use contracts::{HandlerError, Notification, PublishError};

use super::{ensure_not_cancelled, PublishOutcome, PublishStrategy};
use crate::binding::HandlerBinding;

/// Strategy that runs all handlers at once on the tokio runtime
///
/// - No upper bound on in-flight handlers
/// - A failing handler never stops its siblings; every failure is collected
/// - No ordering among handlers
///
/// Must be called from within a tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConcurrentPublisher;

impl ConcurrentPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PublishStrategy for ConcurrentPublisher {
    fn name(&self) -> &str {
        "concurrent"
    }

    #[instrument(
        name = "concurrent_publish",
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

        let mut tasks = JoinSet::new();
        let mut names = HashMap::with_capacity(bindings.len());

        for binding in bindings {
            let name = binding.handler_name().to_string();
            let token = cancel.clone();
            let id = tasks.spawn(binding.run(token)).id();
            names.insert(id, name);
        }

        let mut completed = 0;
        let mut failures = Vec::new();

        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, Ok(()))) => completed += 1,
                Ok((id, Err(e))) => {
                    warn!(
                        handler = names.get(&id).map(String::as_str).unwrap_or("<unknown>"),
                        error = %e,
                        "Handler failed"
                    );
                    failures.push(e);
                }
                Err(join_error) => {
                    let handler = names
                        .remove(&join_error.id())
                        .unwrap_or_else(|| "<unknown>".to_string());
                    warn!(handler = %handler, error = %join_error, "Handler task did not complete");
                    failures.push(PublishError::from_handler(
                        handler,
                        HandlerError::failed(format!("handler task aborted: {join_error}")),
                    ));
                }
            }
        }

        debug!(completed, failed = failures.len(), "Concurrent publish settled");

        match PublishError::from_failures(failures) {
            Some(e) => Err(e),
            None => Ok(PublishOutcome::new(completed)),
        }
    }
}
