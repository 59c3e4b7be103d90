//! Layered error definitions
//!
//! Categorized by source: handler / publish / lookup / config

use thiserror::Error;

/// Boxed error accepted as the source of a handler failure
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error returned by a single handler invocation
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler's unit of work terminated abnormally
    #[error("{message}")]
    Failed {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The handler observed the cancellation token and stopped early
    #[error("handler observed cancellation")]
    Cancelled,
}

impl HandlerError {
    /// Create a handler failure from a message
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a handler failure wrapping an underlying error
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Failed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Outcome of a failed publish
///
/// - `Handler`: one handler failed (sequential short-circuit, or a single concurrent failure)
/// - `Cancelled`: the strategy or a handler observed the cancellation token
/// - `Aggregate`: two or more handlers failed during a concurrent publish
/// - `Lookup`: the handler lookup itself failed; no handler ran
#[derive(Debug, Error)]
pub enum PublishError {
    /// Handler failure
    #[error("handler '{handler}' failed: {source}")]
    Handler {
        handler: String,
        #[source]
        source: HandlerError,
    },

    /// Cancellation outcome
    #[error("{}", describe_cancellation(.handler.as_deref()))]
    Cancelled { handler: Option<String> },

    /// Every failure observed by a concurrent publish
    #[error("{} handlers failed: [{}]", .0.len(), join_failures(.0))]
    Aggregate(Vec<PublishError>),

    /// Handler lookup failure
    #[error("handler lookup failed: {0}")]
    Lookup(#[from] LookupError),
}

impl PublishError {
    /// Attribute a handler error to the named handler
    ///
    /// [`HandlerError::Cancelled`] becomes [`PublishError::Cancelled`] so callers
    /// can tell "cancelled" from "errored".
    pub fn from_handler(handler: impl Into<String>, error: HandlerError) -> Self {
        match error {
            HandlerError::Cancelled => Self::Cancelled {
                handler: Some(handler.into()),
            },
            source => Self::Handler {
                handler: handler.into(),
                source,
            },
        }
    }

    /// Cancellation observed by the strategy before invoking a handler
    pub fn cancelled() -> Self {
        Self::Cancelled { handler: None }
    }

    /// Fold the failures of a concurrent publish into a single result
    ///
    /// No failure gives `None`, one failure is returned as is, two or more are aggregated.
    pub fn from_failures(mut failures: Vec<PublishError>) -> Option<Self> {
        match failures.len() {
            0 => None,
            1 => failures.pop(),
            _ => Some(Self::Aggregate(failures)),
        }
    }

    /// True when every contained failure is a cancellation outcome
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled { .. } => true,
            Self::Aggregate(failures) => failures.iter().all(Self::is_cancelled),
            _ => false,
        }
    }

    /// Individual failures (the entries of an aggregate, or the error itself)
    pub fn failures(&self) -> Vec<&PublishError> {
        match self {
            Self::Aggregate(failures) => failures.iter().flat_map(Self::failures).collect(),
            other => vec![other],
        }
    }

    /// Names of the handlers that reported a failure or a cancellation
    pub fn handler_names(&self) -> Vec<&str> {
        self.failures()
            .into_iter()
            .filter_map(|f| match f {
                Self::Handler { handler, .. } => Some(handler.as_str()),
                Self::Cancelled { handler } => handler.as_deref(),
                _ => None,
            })
            .collect()
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Handler { .. } => "handler_failed",
            Self::Cancelled { .. } => "cancelled",
            Self::Aggregate(_) => "aggregate_failed",
            Self::Lookup(_) => "lookup_failed",
        }
    }
}

fn describe_cancellation(handler: Option<&str>) -> String {
    match handler {
        Some(name) => format!("handler '{name}' cancelled"),
        None => "publish cancelled".to_string(),
    }
}

fn join_failures(failures: &[PublishError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Handler lookup errors
#[derive(Debug, Error)]
pub enum LookupError {
    /// Lock guarding the registrations was poisoned
    #[error("lock poisoned during {operation}")]
    Poisoned { operation: String },

    /// Resolved instance does not implement the requested contract
    #[error("resolved instance does not implement {contract}")]
    ContractMismatch { contract: String },

    /// Other collaborator failure
    #[error("{0}")]
    Other(String),
}

impl LookupError {
    /// Create lock poisoned error
    pub fn poisoned(operation: impl Into<String>) -> Self {
        Self::Poisoned {
            operation: operation.into(),
        }
    }

    /// Create contract mismatch error
    pub fn contract_mismatch(contract: impl Into<String>) -> Self {
        Self::ContractMismatch {
            contract: contract.into(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration parse error
    #[error("config parse error: {message}")]
    Parse {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    Validation { field: String, message: String },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Create configuration parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}
