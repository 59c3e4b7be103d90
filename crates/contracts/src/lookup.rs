//! HandlerLookup trait - dispatcher input interface
//!
//! The dispatcher never constructs handlers itself. It asks a lookup for every
//! instance registered under a [`HandlerContract`] and narrows the erased
//! instances back to `Arc<dyn NotificationHandler<N>>`.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::{LookupError, Notification, NotificationHandler};

/// Type-erased handler instance as returned by a [`HandlerLookup`].
///
/// For contract `handles N` the erased value must be an
/// `Arc<dyn NotificationHandler<N>>`; see [`HandlerContract::erase`].
pub type ResolvedHandler = Arc<dyn Any + Send + Sync>;

/// Handler contract key: "handles notifications of type N".
#[derive(Debug, Clone, Copy)]
pub struct HandlerContract {
    notification: TypeId,
    name: &'static str,
}

impl HandlerContract {
    /// Contract for handlers of notification type `N`
    pub fn of<N: Notification>() -> Self {
        Self {
            notification: TypeId::of::<N>(),
            name: std::any::type_name::<N>(),
        }
    }

    /// `TypeId` of the notification type
    pub fn notification_type(&self) -> TypeId {
        self.notification
    }

    /// Notification type name
    pub fn notification_name(&self) -> &'static str {
        self.name
    }

    /// Erase a typed handler so a lookup can store it next to other contracts.
    pub fn erase<N: Notification>(handler: Arc<dyn NotificationHandler<N>>) -> ResolvedHandler {
        Arc::new(handler)
    }

    /// Narrow an erased instance back to the typed handler.
    ///
    /// # Errors
    /// Returns [`LookupError::ContractMismatch`] when the lookup stored the
    /// instance under the wrong contract.
    pub fn narrow<N: Notification>(
        resolved: ResolvedHandler,
    ) -> Result<Arc<dyn NotificationHandler<N>>, LookupError> {
        resolved
            .downcast::<Arc<dyn NotificationHandler<N>>>()
            .map(|handler| Arc::clone(&*handler))
            .map_err(|_| LookupError::contract_mismatch(Self::of::<N>().to_string()))
    }
}

impl PartialEq for HandlerContract {
    fn eq(&self, other: &Self) -> bool {
        self.notification == other.notification
    }
}

impl Eq for HandlerContract {}

impl std::hash::Hash for HandlerContract {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.notification.hash(state);
    }
}

impl fmt::Display for HandlerContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NotificationHandler<{}>", self.name)
    }
}

/// Handler lookup trait
///
/// Must be safe to call repeatedly and concurrently. An empty result is a
/// valid answer, not an error. Order of the returned instances is the order
/// handlers are bound and, for sequential publishing, invoked.
pub trait HandlerLookup: Send + Sync + 'static {
    /// Resolve every instance registered for `contract`
    ///
    /// # Errors
    /// Collaborator failures; the dispatcher forwards them to the publisher unmodified.
    fn resolve(&self, contract: &HandlerContract) -> Result<Vec<ResolvedHandler>, LookupError>;
}

impl<L: HandlerLookup> HandlerLookup for Arc<L> {
    fn resolve(&self, contract: &HandlerContract) -> Result<Vec<ResolvedHandler>, LookupError> {
        (**self).resolve(contract)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CancellationToken, HandlerError, HandlerFn};

    struct Alpha;
    impl Notification for Alpha {}

    struct Beta;
    impl Notification for Beta {}

    #[test]
    fn test_contract_identity() {
        assert_eq!(HandlerContract::of::<Alpha>(), HandlerContract::of::<Alpha>());
        assert_ne!(HandlerContract::of::<Alpha>(), HandlerContract::of::<Beta>());
        assert!(HandlerContract::of::<Alpha>()
            .to_string()
            .starts_with("NotificationHandler<"));
    }

    #[test]
    fn test_erase_and_narrow() {
        let handler: Arc<dyn NotificationHandler<Alpha>> =
            HandlerFn::arc("alpha", |_n: Arc<Alpha>, _c: CancellationToken| async {
                Ok::<_, HandlerError>(())
            });

        let erased = HandlerContract::erase(Arc::clone(&handler));
        let narrowed: Arc<dyn NotificationHandler<Alpha>> =
            HandlerContract::narrow::<Alpha>(erased).unwrap();
        assert_eq!(narrowed.name(), "alpha");
        assert!(Arc::ptr_eq(&narrowed, &handler));
    }

    #[test]
    fn test_narrow_mismatch() {
        let handler: Arc<dyn NotificationHandler<Alpha>> =
            HandlerFn::arc("alpha", |_n: Arc<Alpha>, _c: CancellationToken| async {
                Ok::<_, HandlerError>(())
            });

        let erased = HandlerContract::erase(handler);
        let err = match HandlerContract::narrow::<Beta>(erased) {
            Ok(_) => panic!("narrowing to the wrong contract must fail"),
            Err(e) => e,
        };
        assert!(matches!(err, LookupError::ContractMismatch { .. }));
    }
}
