//! HandlerBinding - one handler paired with its invocation callback for one publish

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use contracts::{HandlerContract, HandlerError, Notification, NotificationHandler, PublishError};

/// Future produced by invoking a binding
pub type HandlerFuture = BoxFuture<'static, Result<(), HandlerError>>;

type Invoke = Box<dyn FnOnce(CancellationToken) -> HandlerFuture + Send>;

/// Handler instance plus a type-erased callback
///
/// Created fresh for every publish and consumed by the strategy: invoking a
/// binding moves it, so a callback runs at most once.
pub struct HandlerBinding {
    /// Handler name
    handler: String,
    /// Opaque handle to the handler instance
    instance: Arc<dyn Any + Send + Sync>,
    /// Invocation callback
    invoke: Invoke,
}

impl HandlerBinding {
    /// Create a binding from an arbitrary callback
    pub fn new<F>(handler: impl Into<String>, instance: Arc<dyn Any + Send + Sync>, invoke: F) -> Self
    where
        F: FnOnce(CancellationToken) -> HandlerFuture + Send + 'static,
    {
        Self {
            handler: handler.into(),
            instance,
            invoke: Box::new(invoke),
        }
    }

    /// Bind a typed handler to a typed notification
    ///
    /// The callback closes over the concrete `N`, so invoking it needs no type
    /// inspection of the notification.
    pub fn bind<N: Notification>(
        handler: Arc<dyn NotificationHandler<N>>,
        notification: Arc<N>,
    ) -> Self {
        let name = handler.name().to_string();
        let instance = HandlerContract::erase(Arc::clone(&handler));

        Self::new(name, instance, move |cancel| {
            async move { handler.handle(notification, cancel).await }.boxed()
        })
    }

    /// Handler name
    pub fn handler_name(&self) -> &str {
        &self.handler
    }

    /// Opaque handler instance
    pub fn instance(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.instance
    }

    /// Invoke the callback, consuming the binding
    pub fn invoke(self, cancel: CancellationToken) -> HandlerFuture {
        (self.invoke)(cancel)
    }

    /// Invoke the callback and attribute any failure to this handler
    ///
    /// A panic inside the handler is reported as a handler failure.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), PublishError> {
        let handler = self.handler.clone();
        debug!(handler = %handler, "Handler started");

        let outcome = match AssertUnwindSafe(self.invoke(cancel)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(HandlerError::failed(format!(
                "handler panicked: {}",
                panic_message(panic.as_ref())
            ))),
        };

        debug!(handler = %handler, ok = outcome.is_ok(), "Handler finished");

        outcome.map_err(|e| PublishError::from_handler(handler, e))
    }
}

impl fmt::Debug for HandlerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerBinding")
            .field("handler", &self.handler)
            .finish_non_exhaustive()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}
