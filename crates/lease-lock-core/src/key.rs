//! Lock key construction and validation.
//!
//! A lock key names the protected resource in the store. The lock name given
//! by the caller is prefixed with a namespace so lock keys never collide with
//! unrelated data living in the same keyspace.

use std::fmt;

use crate::error::{LockError, LockResult};

/// Default namespace prepended to lock names.
pub const DEFAULT_KEY_PREFIX: &str = "lease-lock:";

/// A validated, non-empty store key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockKey(String);

impl LockKey {
    /// Uses `key` verbatim as the store key.
    pub fn new(key: impl Into<String>) -> LockResult<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(LockError::InvalidName("lock key must not be empty".to_string()));
        }
        Ok(Self(key))
    }

    /// Builds `{prefix}{name}`. The name itself must be non-empty.
    pub fn with_prefix(prefix: &str, name: &str) -> LockResult<Self> {
        if name.is_empty() {
            return Err(LockError::InvalidName("lock name must not be empty".to_string()));
        }
        Ok(Self(format!("{prefix}{name}")))
    }

    /// Skips validation. Used by infallible constructors; the protocol
    /// re-checks emptiness before every store call.
    pub(crate) fn unchecked(key: String) -> Self {
        Self(key)
    }

    pub(crate) fn ensure_valid(&self) -> LockResult<()> {
        if self.0.is_empty() {
            return Err(LockError::InvalidName("lock key must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The lock name with `prefix` removed, if present.
    pub fn name<'a>(&'a self, prefix: &str) -> &'a str {
        self.0.strip_prefix(prefix).unwrap_or(&self.0)
    }
}

impl AsRef<str> for LockKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
