//! Error types for simulated calls and simulator configuration
//!
//! Two families live here. [`CallError`] is what a single invocation resolves
//! to when it does not produce a value; [`NetSimError`] covers configuration
//! and registry faults that happen outside any invocation.

use std::fmt;
use std::sync::Arc;

/// Shared failure cause.
///
/// Failures are reference counted so the exact instance a test supplied (or
/// configured as the injected failure) can be recovered and compared with
/// [`Arc::ptr_eq`].
pub type FailureCause = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Outcome error of a single simulated invocation
#[derive(Debug, Clone, thiserror::Error)]
pub enum CallError {
    /// The call was executed or enqueued more than once
    #[error("Already executed")]
    AlreadyExecuted,

    /// Cancellation was observed before a terminal outcome was committed
    #[error("canceled")]
    Canceled,

    /// The canned failure supplied for this invocation
    #[error("{0}")]
    Failed(FailureCause),

    /// The configured failure injected by the behavior engine
    #[error("{0}")]
    Injected(FailureCause),
}

impl CallError {
    /// Wrap a canned failure
    pub fn failed(cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Failed(Arc::new(cause))
    }

    /// True for the canonical cancellation failure
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    /// True when the failure was injected rather than canned
    pub fn is_injected(&self) -> bool {
        matches!(self, Self::Injected(_))
    }

    /// The underlying failure cause, if this is a canned or injected failure
    pub fn cause(&self) -> Option<&FailureCause> {
        match self {
            Self::Failed(cause) | Self::Injected(cause) => Some(cause),
            Self::AlreadyExecuted | Self::Canceled => None,
        }
    }

    /// True when this error carries exactly `expected` (same allocation)
    pub fn is_same_cause(&self, expected: &FailureCause) -> bool {
        self.cause()
            .is_some_and(|cause| Arc::ptr_eq(cause, expected))
    }
}

impl From<CallError> for std::io::Error {
    fn from(err: CallError) -> Self {
        match err {
            CallError::Canceled => std::io::Error::new(std::io::ErrorKind::Interrupted, "canceled"),
            CallError::AlreadyExecuted => std::io::Error::other("Already executed"),
            CallError::Failed(cause) | CallError::Injected(cause) => std::io::Error::other(cause),
        }
    }
}

/// Failure injected when no explicit failure exception is configured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockFailure {
    message: String,
}

impl MockFailure {
    /// Default message carried by injected failures
    pub const DEFAULT_MESSAGE: &'static str = "Mock failure!";

    /// Create a failure with a custom message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The failure message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Default for MockFailure {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MESSAGE)
    }
}

impl fmt::Display for MockFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for MockFailure {}

/// Simulator setup error
#[derive(Debug, Clone, thiserror::Error)]
pub enum NetSimError {
    /// Invalid input or configuration value
    #[error("Invalid: {message}")]
    Invalid {
        /// Description of the rejected value
        message: String,
    },

    /// Unknown operation or resource
    #[error("Not found: {message}")]
    NotFound {
        /// Description of what was missing
        message: String,
    },

    /// Configuration file could not be read or parsed
    #[error("Config error: {message}")]
    Config {
        /// Description of the load failure
        message: String,
    },
}

impl NetSimError {
    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a configuration load error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for NetSimError {
    fn from(err: std::io::Error) -> Self {
        Self::config(err.to_string())
    }
}

impl From<toml::de::Error> for NetSimError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(err.to_string())
    }
}

/// Standard result type for simulator setup
pub type Result<T> = std::result::Result<T, NetSimError>;
