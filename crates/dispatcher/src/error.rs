//! Registration error types

use thiserror::Error;

/// Errors raised while wiring the dispatcher into a process
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// A process-wide dispatcher is already installed
    #[error("a global dispatcher is already installed (strategy '{strategy}')")]
    AlreadyInstalled { strategy: String },

    /// Concurrency cap out of range
    #[error("invalid max_concurrency {value}: {message}")]
    InvalidConcurrency { value: usize, message: String },
}

impl RegistrationError {
    /// Create an invalid concurrency error
    pub fn invalid_concurrency(value: usize, message: impl Into<String>) -> Self {
        Self::InvalidConcurrency {
            value,
            message: message.into(),
        }
    }
}
