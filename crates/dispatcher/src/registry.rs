//! HandlerRegistry - in-memory handler lookup keyed by notification type
//!
//! Handlers are registered explicitly, either as a shared instance or as a
//! factory producing a fresh instance on every resolve. Resolution order is
//! registration order.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use contracts::{
    HandlerContract, HandlerLookup, LookupError, Notification, NotificationHandler,
    ResolvedHandler,
};

type Factory = Arc<dyn Fn() -> ResolvedHandler + Send + Sync>;

/// How a registration produces its instance
#[derive(Clone)]
enum Registration {
    /// One instance shared by every publish
    Shared(ResolvedHandler),
    /// New instance per resolve
    Factory(Factory),
}

impl Registration {
    fn instance(&self) -> ResolvedHandler {
        match self {
            Self::Shared(handler) => Arc::clone(handler),
            Self::Factory(factory) => factory(),
        }
    }
}

struct ContractEntry {
    contract: HandlerContract,
    registrations: Vec<Registration>,
}

/// Thread-safe handler registry
#[derive(Default)]
pub struct HandlerRegistry {
    entries: RwLock<HashMap<TypeId, ContractEntry>>,
}

impl HandlerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a shared handler instance for notification type `N`
    ///
    /// # Errors
    /// Returns [`LookupError::Poisoned`] if a previous writer panicked.
    pub fn register<N: Notification>(
        &self,
        handler: Arc<dyn NotificationHandler<N>>,
    ) -> Result<(), LookupError> {
        let name = handler.name().to_string();
        self.insert(
            HandlerContract::of::<N>(),
            Registration::Shared(HandlerContract::erase(handler)),
        )?;
        info!(handler = %name, notification = std::any::type_name::<N>(), "Handler registered");
        Ok(())
    }

    /// Register a factory producing a fresh handler for every publish of `N`
    ///
    /// # Errors
    /// Returns [`LookupError::Poisoned`] if a previous writer panicked.
    pub fn register_factory<N, F>(&self, factory: F) -> Result<(), LookupError>
    where
        N: Notification,
        F: Fn() -> Arc<dyn NotificationHandler<N>> + Send + Sync + 'static,
    {
        self.insert(
            HandlerContract::of::<N>(),
            Registration::Factory(Arc::new(move || HandlerContract::erase(factory()))),
        )?;
        info!(
            notification = std::any::type_name::<N>(),
            "Handler factory registered"
        );
        Ok(())
    }

    /// Number of registrations for `N`
    pub fn handler_count<N: Notification>(&self) -> Result<usize, LookupError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| LookupError::poisoned("handler_count"))?;
        Ok(entries
            .get(&TypeId::of::<N>())
            .map_or(0, |entry| entry.registrations.len()))
    }

    /// Notification type names that have at least one registration
    pub fn contracts(&self) -> Result<Vec<&'static str>, LookupError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| LookupError::poisoned("contracts"))?;
        let mut names: Vec<_> = entries
            .values()
            .map(|entry| entry.contract.notification_name())
            .collect();
        names.sort_unstable();
        Ok(names)
    }

    fn insert(
        &self,
        contract: HandlerContract,
        registration: Registration,
    ) -> Result<(), LookupError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| LookupError::poisoned("register"))?;

        entries
            .entry(contract.notification_type())
            .or_insert_with(|| ContractEntry {
                contract,
                registrations: Vec::new(),
            })
            .registrations
            .push(registration);
        Ok(())
    }
}

impl HandlerLookup for HandlerRegistry {
    fn resolve(&self, contract: &HandlerContract) -> Result<Vec<ResolvedHandler>, LookupError> {
        // Factories run after the guard is released so they may touch the registry.
        let registrations: Vec<Registration> = {
            let entries = self
                .entries
                .read()
                .map_err(|_| LookupError::poisoned("resolve"))?;
            entries
                .get(&contract.notification_type())
                .map(|entry| entry.registrations.clone())
                .unwrap_or_default()
        };

        let resolved: Vec<_> = registrations.iter().map(Registration::instance).collect();

        debug!(contract = %contract, handlers = resolved.len(), "Resolved handlers");
        Ok(resolved)
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let contracts = self.entries.read().map(|e| e.len()).unwrap_or_default();
        f.debug_struct("HandlerRegistry")
            .field("contracts", &contracts)
            .finish()
    }
}
