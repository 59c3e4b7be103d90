//! # Dispatcher
//!
//! In-process notification mediator.
//!
//! Responsibilities:
//! - Resolve every handler registered for a notification type
//! - Bind each handler to the notification without runtime type checks
//! - Execute the bindings through a pluggable [`PublishStrategy`]
//!
//! ```ignore
//! let registry = HandlerRegistry::new();
//! registry.register::<OrderPlaced>(Arc::new(SendReceipt))?;
//!
//! let dispatcher = Dispatcher::builder(registry)
//!     .strategy(StrategyKind::Concurrent)
//!     .build();
//! dispatcher.publish(OrderPlaced { id: 7 }, CancellationToken::new()).await?;
//! ```

pub mod binding;
pub mod dispatcher;
pub mod error;
pub mod global;
pub mod metrics;
pub mod registry;
pub mod strategies;

pub use binding::{HandlerBinding, HandlerFuture};
pub use contracts::{
    CancellationToken, HandlerError, HandlerLookup, Notification, NotificationHandler,
    PublishError, StrategyKind,
};
pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use error::RegistrationError;
pub use global::{global, install_global};
pub use metrics::{MetricsSnapshot, PublishMetrics};
pub use registry::HandlerRegistry;
pub use strategies::{
    create_strategy, ConcurrentPublisher, PublishOutcome, PublishStrategy, SequentialPublisher,
    WhenAllPublisher,
};
