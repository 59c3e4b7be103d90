//! Dispatcher - resolves handlers for a notification and hands them to a strategy

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use contracts::{
    HandlerContract, HandlerLookup, MediatorConfig, Notification, PublishError, StrategyKind,
};

use crate::binding::HandlerBinding;
use crate::error::RegistrationError;
use crate::metrics::{MetricsSnapshot, PublishMetrics};
use crate::strategies::{create_strategy, PublishOutcome, PublishStrategy};

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder {
    lookup: Arc<dyn HandlerLookup>,
    kind: StrategyKind,
    max_concurrency: Option<NonZeroUsize>,
    custom: Option<Arc<dyn PublishStrategy>>,
}

impl DispatcherBuilder {
    /// Create a builder using the sequential strategy
    pub fn new(lookup: impl HandlerLookup) -> Self {
        Self::with_lookup(Arc::new(lookup))
    }

    /// Create a builder from an already shared lookup
    pub fn with_lookup(lookup: Arc<dyn HandlerLookup>) -> Self {
        Self {
            lookup,
            kind: StrategyKind::default(),
            max_concurrency: None,
            custom: None,
        }
    }

    /// Select a built-in strategy
    pub fn strategy(mut self, kind: StrategyKind) -> Self {
        self.kind = kind;
        self
    }

    /// Cap in-flight handlers (when_all only)
    pub fn max_concurrency(mut self, cap: NonZeroUsize) -> Self {
        self.max_concurrency = Some(cap);
        self
    }

    /// Install a caller-supplied strategy, overriding the built-in selection
    pub fn custom_strategy(mut self, strategy: Arc<dyn PublishStrategy>) -> Self {
        self.custom = Some(strategy);
        self
    }

    /// Apply the `[publisher]` section of a loaded configuration
    ///
    /// # Errors
    /// [`RegistrationError::InvalidConcurrency`] when the cap is zero or is set
    /// for a strategy other than `when_all`.
    pub fn from_config(mut self, config: &MediatorConfig) -> Result<Self, RegistrationError> {
        let publisher = &config.publisher;
        self.kind = publisher.strategy;
        self.max_concurrency = match publisher.max_concurrency {
            None => None,
            Some(value) => {
                if publisher.strategy != StrategyKind::WhenAll {
                    return Err(RegistrationError::invalid_concurrency(
                        value,
                        format!("only supported by when_all, not {}", publisher.strategy),
                    ));
                }
                Some(NonZeroUsize::new(value).ok_or_else(|| {
                    RegistrationError::invalid_concurrency(value, "must be greater than zero")
                })?)
            }
        };
        Ok(self)
    }

    /// Build the dispatcher
    #[instrument(name = "dispatcher_builder_build", skip(self), fields(strategy = %self.kind))]
    pub fn build(self) -> Dispatcher {
        let strategy = match self.custom {
            Some(strategy) => strategy,
            None => create_strategy(self.kind, self.max_concurrency),
        };

        info!(
            strategy = strategy.name(),
            max_concurrency = ?self.max_concurrency,
            "Dispatcher built"
        );

        Dispatcher {
            lookup: self.lookup,
            strategy,
            metrics: Arc::new(PublishMetrics::new()),
        }
    }
}

/// The mediator: publishes notifications to every handler registered for their type
///
/// Cheap to share behind an `Arc`; every method takes `&self` and may be
/// called from many tasks at once.
pub struct Dispatcher {
    lookup: Arc<dyn HandlerLookup>,
    strategy: Arc<dyn PublishStrategy>,
    metrics: Arc<PublishMetrics>,
}

impl Dispatcher {
    /// Create a dispatcher from a lookup and strategy
    pub fn new(lookup: Arc<dyn HandlerLookup>, strategy: Arc<dyn PublishStrategy>) -> Self {
        Self {
            lookup,
            strategy,
            metrics: Arc::new(PublishMetrics::new()),
        }
    }

    /// Start a builder for `lookup`
    pub fn builder(lookup: impl HandlerLookup) -> DispatcherBuilder {
        DispatcherBuilder::new(lookup)
    }

    /// Installed strategy name
    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    /// Get publish metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Publish a notification to every handler registered for its type
    ///
    /// # Errors
    /// Lookup failures unmodified, otherwise the strategy's result.
    pub async fn publish<N: Notification>(
        &self,
        notification: N,
        cancel: CancellationToken,
    ) -> Result<PublishOutcome, PublishError> {
        self.publish_arc(Arc::new(notification), cancel).await
    }

    /// Publish with a token that is never cancelled
    pub async fn publish_default<N: Notification>(
        &self,
        notification: N,
    ) -> Result<PublishOutcome, PublishError> {
        self.publish(notification, CancellationToken::new()).await
    }

    /// Publish an already shared notification
    #[instrument(
        name = "dispatcher_publish",
        skip_all,
        fields(notification = notification.name(), strategy = self.strategy.name())
    )]
    pub async fn publish_arc<N: Notification>(
        &self,
        notification: Arc<N>,
        cancel: CancellationToken,
    ) -> Result<PublishOutcome, PublishError> {
        let bindings = match self.bind::<N>(&notification) {
            Ok(bindings) => bindings,
            Err(e) => {
                error!(error = %e, "Handler lookup failed");
                self.metrics.record_lookup_failure();
                observability::metrics::record_lookup_failure(notification.name());
                return Err(e);
            }
        };

        let handlers = bindings.len();
        self.metrics.record_started(handlers);
        let started = Instant::now();

        let result = self
            .strategy
            .publish(bindings, notification.clone(), cancel)
            .await;

        self.metrics.record_finished(&result);
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        let label = match &result {
            Ok(_) => "ok",
            Err(e) => e.as_label(),
        };
        observability::metrics::record_publish(
            notification.name(),
            self.strategy.name(),
            handlers,
            label,
            elapsed_ms,
        );
        if let Err(e) = &result {
            observability::metrics::record_handler_failure(
                notification.name(),
                self.strategy.name(),
                e.failures().iter().filter(|f| !f.is_cancelled()).count(),
            );
        }

        result
    }

    /// Resolve, narrow and bind every handler for `N`
    fn bind<N: Notification>(
        &self,
        notification: &Arc<N>,
    ) -> Result<Vec<HandlerBinding>, PublishError> {
        let resolved = self.lookup.resolve(&HandlerContract::of::<N>())?;

        resolved
            .into_iter()
            .map(|instance| {
                let handler = HandlerContract::narrow::<N>(instance)?;
                Ok(HandlerBinding::bind(handler, Arc::clone(notification)))
            })
            .collect()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("strategy", &self.strategy.name())
            .field("metrics", &self.metrics.snapshot())
            .finish_non_exhaustive()
    }
}
