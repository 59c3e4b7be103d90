//! Process-wide dispatcher slot

use std::sync::{Arc, OnceLock};

use tracing::info;

use crate::dispatcher::Dispatcher;
use crate::error::RegistrationError;

static GLOBAL: OnceLock<Arc<Dispatcher>> = OnceLock::new();

/// Install the process-wide dispatcher
///
/// # Errors
/// [`RegistrationError::AlreadyInstalled`] if a dispatcher was installed before;
/// the existing one stays in place.
pub fn install_global(dispatcher: Dispatcher) -> Result<Arc<Dispatcher>, RegistrationError> {
    let dispatcher = Arc::new(dispatcher);
    match GLOBAL.set(Arc::clone(&dispatcher)) {
        Ok(()) => {
            info!(strategy = dispatcher.strategy_name(), "Global dispatcher installed");
            Ok(dispatcher)
        }
        Err(_) => Err(RegistrationError::AlreadyInstalled {
            strategy: GLOBAL
                .get()
                .map(|d| d.strategy_name().to_string())
                .unwrap_or_default(),
        }),
    }
}

/// The installed process-wide dispatcher, if any
pub fn global() -> Option<Arc<Dispatcher>> {
    GLOBAL.get().cloned()
}
