//! The store adapter contract.
//!
//! The protocol never talks to the backing store except through
//! [`LeaseStore`]. Every operation must be atomic *at the store*: the store
//! is the only coordination point shared by the contending processes.

use std::future::Future;
use std::time::Duration;

use crate::error::LockResult;

/// Atomic primitives a backing key-value store must provide.
///
/// Implementations report transport failures (refused connections, command
/// timeouts) as [`LockError::Connection`](crate::LockError::Connection) and
/// never fold them into a `false` result.
pub trait LeaseStore: Send + Sync + 'static {
    /// Short backend name used in tracing spans.
    fn backend(&self) -> &'static str;

    /// Sets `key` to `value` with the given time-to-live, only if `key`
    /// does not currently exist.
    ///
    /// Returns `true` iff the key was newly set.
    fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> impl Future<Output = LockResult<bool>> + Send;

    /// Deletes `key` only if its current value equals `expected`.
    ///
    /// Returns `true` iff the key was deleted.
    fn compare_and_delete(
        &self,
        key: &str,
        expected: &str,
    ) -> impl Future<Output = LockResult<bool>> + Send;

    /// Replaces the remaining time-to-live of `key` with `ttl`, only if its
    /// current value equals `expected`.
    ///
    /// Returns `true` iff the time-to-live was updated.
    fn compare_and_expire(
        &self,
        key: &str,
        expected: &str,
        ttl: Duration,
    ) -> impl Future<Output = LockResult<bool>> + Send;

    /// Replaces the remaining time-to-live of `key` without an ownership
    /// check. No-op (returns `false`) if the key is absent.
    fn expire(&self, key: &str, ttl: Duration) -> impl Future<Output = LockResult<bool>> + Send;

    /// Reads the token currently stored at `key`, if any.
    fn owner(&self, key: &str) -> impl Future<Output = LockResult<Option<String>>> + Send;
}
