use std::time::Duration;

use thiserror::Error;

/// Failures raised by the built-in middlewares and the dispatcher.
///
/// Handlers return `anyhow::Result<()>`, so these travel as `anyhow::Error`;
/// use `err.downcast_ref::<ChainError>()` to classify them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("handler timed out after {0:?}")]
    Timeout(Duration),

    #[error("execution context cancelled")]
    Cancelled,

    #[error("execution context deadline exceeded")]
    DeadlineExceeded,

    #[error("no handler for routing key: {0}")]
    NoRoute(String),

    /// The delivery itself is unusable; another attempt cannot succeed.
    #[error("delivery rejected: {0}")]
    Rejected(String),
}

impl ChainError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ChainError::RateLimited | ChainError::Timeout(_))
    }
}

/// Whether a handler error is worth another attempt.
///
/// Errors that are not a [`ChainError`] come from application handlers and are
/// treated as transient.
pub fn is_retryable(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ChainError>()
        .is_none_or(ChainError::is_retryable)
}
