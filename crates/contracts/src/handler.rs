//! NotificationHandler trait - the unit of logic reacting to one notification type
//!
//! Handlers are stored as `Arc<dyn NotificationHandler<N>>`, so the trait is
//! object safe (`async_trait`). [`HandlerFn`] adapts a closure into a handler.

use std::borrow::Cow;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{HandlerError, Notification};

/// Handler for a specific notification type.
///
/// Implementations should poll `cancel` during long work and return
/// [`HandlerError::Cancelled`] when they stop early. The dispatcher never
/// aborts a running handler.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use contracts::{CancellationToken, HandlerError, Notification, NotificationHandler};
///
/// struct UserCreated;
/// impl Notification for UserCreated {}
///
/// struct SendWelcomeMail;
///
/// #[async_trait]
/// impl NotificationHandler<UserCreated> for SendWelcomeMail {
///     async fn handle(
///         &self,
///         _notification: Arc<UserCreated>,
///         cancel: CancellationToken,
///     ) -> Result<(), HandlerError> {
///         if cancel.is_cancelled() {
///             return Err(HandlerError::Cancelled);
///         }
///         Ok(())
///     }
///
///     fn name(&self) -> &str {
///         "send_welcome_mail"
///     }
/// }
/// ```
#[async_trait]
pub trait NotificationHandler<N: Notification>: Send + Sync + 'static {
    /// Handle one notification.
    async fn handle(&self, notification: Arc<N>, cancel: CancellationToken)
        -> Result<(), HandlerError>;

    /// Handler name used in logs, metrics and failure reports.
    ///
    /// The default is `type_name::<Self>()`; override it with something shorter when possible.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Closure-backed handler.
///
/// Wraps `F: Fn(Arc<N>, CancellationToken) -> Fut`, producing a fresh future per
/// notification. Shared state must be captured explicitly (e.g. via `Arc`).
///
/// ```
/// use std::sync::Arc;
/// use contracts::{CancellationToken, HandlerError, HandlerFn, Notification, NotificationHandler};
///
/// struct Tick;
/// impl Notification for Tick {}
///
/// let h = HandlerFn::arc("tick_logger", |_n: Arc<Tick>, _cancel: CancellationToken| async {
///     Ok::<_, HandlerError>(())
/// });
/// assert_eq!(h.name(), "tick_logger");
/// ```
pub struct HandlerFn<N, F> {
    name: Cow<'static, str>,
    f: F,
    _notification: PhantomData<fn(Arc<N>)>,
}

impl<N, F> HandlerFn<N, F>
where
    N: Notification,
{
    /// Create a new closure-backed handler
    pub fn new<Fut>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(Arc<N>, CancellationToken) -> Fut,
    {
        Self {
            name: name.into(),
            f,
            _notification: PhantomData,
        }
    }

    /// Create the handler behind an `Arc`, ready for registration
    pub fn arc<Fut>(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self>
    where
        F: Fn(Arc<N>, CancellationToken) -> Fut,
    {
        Arc::new(Self::new(name, f))
    }
}

impl<N, F> std::fmt::Debug for HandlerFn<N, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerFn").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<N, F, Fut> NotificationHandler<N> for HandlerFn<N, F>
where
    N: Notification,
    F: Fn(Arc<N>, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn handle(
        &self,
        notification: Arc<N>,
        cancel: CancellationToken,
    ) -> Result<(), HandlerError> {
        (self.f)(notification, cancel).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct Ping(u64);
    impl Notification for Ping {}

    #[tokio::test]
    async fn test_handler_fn_invokes_closure() {
        let seen = Arc::new(AtomicU64::new(0));
        let seen_clone = Arc::clone(&seen);

        let handler = HandlerFn::arc("ping", move |n: Arc<Ping>, _cancel: CancellationToken| {
            let seen = Arc::clone(&seen_clone);
            async move {
                seen.fetch_add(n.0, Ordering::SeqCst);
                Ok::<_, HandlerError>(())
            }
        });

        let result = handler
            .handle(Arc::new(Ping(5)), CancellationToken::new())
            .await;
        assert!(result.is_ok());
        assert_eq!(seen.load(Ordering::SeqCst), 5);
        assert_eq!(handler.name(), "ping");
    }

    #[tokio::test]
    async fn test_handler_fn_propagates_error() {
        let handler = HandlerFn::arc("broken", |_n: Arc<Ping>, _cancel: CancellationToken| async {
            Err::<(), _>(HandlerError::failed("boom"))
        });

        let err = handler
            .handle(Arc::new(Ping(1)), CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[tokio::test]
    async fn test_default_name_is_type_name() {
        struct Named;

        #[async_trait]
        impl NotificationHandler<Ping> for Named {
            async fn handle(
                &self,
                _notification: Arc<Ping>,
                _cancel: CancellationToken,
            ) -> Result<(), HandlerError> {
                Ok(())
            }
        }

        let h: Arc<dyn NotificationHandler<Ping>> = Arc::new(Named);
        assert!(h.name().ends_with("Named"), "got: {}", h.name());
    }
}
