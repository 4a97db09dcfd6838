//! Ownership tokens.

use std::fmt;

use uuid::Uuid;

use crate::error::{LockError, LockResult};

/// Proof that one specific acquisition attempt owns a lease.
///
/// A token identifies an attempt, not a process: every attempt generates a
/// fresh one, so two attempts from the same process never share a token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockToken(String);

impl LockToken {
    /// Generates a fresh random token (UUID v4, hyphenated).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    /// Wraps a token received from elsewhere, e.g. one handed out by
    /// [`try_acquire_raw`](crate::provider::LeaseLockProvider::try_acquire_raw).
    pub fn new(value: impl Into<String>) -> LockResult<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(LockError::InvalidArgument(
                "ownership token must not be empty".to_string(),
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for LockToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
