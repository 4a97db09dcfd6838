//! Error types for lease lock operations.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during lock operations.
///
/// Losing a race for a held lease and releasing a lease that is no longer
/// ours are *not* errors; both surface as `Ok(false)` from the protocol.
#[derive(Error, Debug)]
pub enum LockError {
    /// Lock acquisition did not succeed within the allowed wait.
    #[error("lock acquisition timed out after {0:?}")]
    Timeout(Duration),

    /// Lock operation was cancelled by the caller.
    #[error("lock operation was cancelled")]
    Cancelled,

    /// The store could not be reached or did not answer in time.
    #[error("store unavailable: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Invalid lock key.
    #[error("invalid lock name: {0}")]
    InvalidName(String),

    /// Invalid argument (non-positive TTL, empty token, unbounded polling...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The store answered, but not in a way the protocol understands.
    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl LockError {
    /// Builds a [`LockError::Connection`] from a message.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Connection(Box::new(std::io::Error::other(message.into())))
    }

    /// Builds a [`LockError::Backend`] from a message.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(Box::new(std::io::Error::other(message.into())))
    }

    /// True when the lock state could not be determined because the store
    /// was unreachable.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// True for caller mistakes that were rejected before touching the store.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::InvalidName(_) | Self::InvalidArgument(_))
    }
}

/// Result type for lock operations.
pub type LockResult<T> = Result<T, LockError>;
