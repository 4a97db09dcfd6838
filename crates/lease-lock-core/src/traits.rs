//! Core traits for lease locks.

use std::future::Future;
use std::time::Duration;

use crate::error::LockResult;
use crate::token::LockToken;

// ============================================================================
// Lock Handle Trait
// ============================================================================

/// Handle to a held lease.
///
/// Dropping an unreleased handle releases the lease in the background. For
/// proper error handling in async contexts, call `release()` explicitly.
///
/// # Example
///
/// ```rust,ignore
/// let handle = lock.acquire(None).await?;
/// // Critical section - we hold the lease
/// do_work().await;
/// // Explicit release; `false` means the lease expired under us
/// let still_ours = handle.release().await?;
/// ```
pub trait LockHandle: Send + Sync + Sized {
    /// The ownership token proving this acquisition.
    fn token(&self) -> &LockToken;

    /// Explicitly releases the lease.
    ///
    /// Returns `Ok(false)` if the lease was no longer owned by this handle.
    fn release(self) -> impl Future<Output = LockResult<bool>> + Send;
}

// ============================================================================
// Distributed Lock Trait
// ============================================================================

/// A mutual exclusion lock shared by independent processes through a store.
///
/// # Example
///
/// ```rust,ignore
/// use lease_lock_core::DistributedLock;
///
/// async fn protected_operation(lock: &impl DistributedLock) -> Result<(), Error> {
///     // Acquire with 5 second timeout
///     let handle = lock.acquire(Some(Duration::from_secs(5))).await?;
///
///     // We have exclusive access
///     perform_critical_section().await?;
///
///     handle.release().await?;
///     Ok(())
/// }
/// ```
pub trait DistributedLock: Send + Sync {
    /// The handle type returned when the lock is acquired.
    type Handle: LockHandle + Send;

    /// Returns the unique name identifying this lock.
    fn name(&self) -> &str;

    /// Acquires the lock, polling for up to `timeout`.
    ///
    /// # Arguments
    ///
    /// * `timeout` - Maximum time to wait. `None` defers to the lock's
    ///   configured attempt bound.
    ///
    /// # Returns
    ///
    /// * `Ok(handle)` - Lock acquired successfully
    /// * `Err(LockError::Timeout)` - Gave up before the lock was acquired
    /// * `Err(LockError::Connection)` - Store unreachable
    fn acquire(
        &self,
        timeout: Option<Duration>,
    ) -> impl Future<Output = LockResult<Self::Handle>> + Send;

    /// Attempts to acquire the lock exactly once.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(handle))` - Lock acquired successfully
    /// * `Ok(None)` - Lock is held by another owner
    /// * `Err(...)` - Error occurred during attempt
    fn try_acquire(&self) -> impl Future<Output = LockResult<Option<Self::Handle>>> + Send;
}

// ============================================================================
// Provider Traits
// ============================================================================

/// Factory for creating locks by name.
///
/// Providers own the store connection and default options, allowing
/// application code to stay backend-agnostic.
///
/// # Example
///
/// ```rust,ignore
/// // Configure once at startup
/// let provider = RedisLockProvider::new("redis://localhost:6379").await?;
///
/// // Create locks by name anywhere in the application
/// let lock = provider.create_lock("my-resource");
/// let handle = lock.acquire(None).await?;
/// ```
pub trait LockProvider: Send + Sync {
    /// The lock type created by this provider.
    type Lock: DistributedLock;

    /// Creates a lock with the given name.
    fn create_lock(&self, name: &str) -> Self::Lock;
}

// ============================================================================
// Convenience Extensions
// ============================================================================

/// Extension trait providing convenience methods for lock providers.
pub trait LockProviderExt: LockProvider {
    /// Acquires a lock by name, returning the handle.
    fn acquire_lock(
        &self,
        name: &str,
        timeout: Option<Duration>,
    ) -> impl Future<Output = LockResult<<Self::Lock as DistributedLock>::Handle>> + Send
    where
        Self: Sync,
    {
        async move {
            let lock = self.create_lock(name);
            lock.acquire(timeout).await
        }
    }

    /// Tries once to acquire a lock by name.
    fn try_acquire_lock(
        &self,
        name: &str,
    ) -> impl Future<Output = LockResult<Option<<Self::Lock as DistributedLock>::Handle>>> + Send
    where
        Self: Sync,
    {
        async move {
            let lock = self.create_lock(name);
            lock.try_acquire().await
        }
    }
}

impl<T: LockProvider> LockProviderExt for T {}
