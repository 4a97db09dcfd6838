//! Store-backed lease lock.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{Span, error, instrument};

use crate::error::{LockError, LockResult};
use crate::key::LockKey;
use crate::options::LockOptions;
use crate::retry::{RetryPolicy, acquire_with_retry};
use crate::session::LeaseGuard;
use crate::store::LeaseStore;
use crate::traits::{DistributedLock, LockHandle};

/// Result of running a critical section under a lease.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Execution<T> {
    /// The lease was acquired and the body ran to completion with this result.
    Ran(T),
    /// The lease could not be acquired within the retry bounds; the body did
    /// not run.
    Skipped,
}

impl<T> Execution<T> {
    pub fn ran(&self) -> bool {
        matches!(self, Self::Ran(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Ran(value) => Some(value),
            Self::Skipped => None,
        }
    }
}

/// A named lock whose lease lives in a [`LeaseStore`].
///
/// The store is handed in at construction; the lock never looks one up on
/// its own.
pub struct LeaseLock<S: LeaseStore> {
    name: String,
    key: LockKey,
    store: Arc<S>,
    options: LockOptions,
}

impl<S: LeaseStore> fmt::Debug for LeaseLock<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeaseLock")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("backend", &self.store.backend())
            .field("options", &self.options)
            .finish()
    }
}

impl<S: LeaseStore> LeaseLock<S> {
    /// Creates a lock using `key` verbatim as the store key.
    pub fn new(store: Arc<S>, key: impl Into<String>, options: LockOptions) -> LockResult<Self> {
        let key = LockKey::new(key)?;
        options.validate()?;
        Ok(Self {
            name: key.as_str().to_string(),
            key,
            store,
            options,
        })
    }

    pub(crate) fn from_parts(name: String, key: LockKey, store: Arc<S>, options: LockOptions) -> Self {
        Self {
            name,
            key,
            store,
            options,
        }
    }

    pub fn key(&self) -> &LockKey {
        &self.key
    }

    pub fn options(&self) -> &LockOptions {
        &self.options
    }

    /// Returns a copy of this lock using different options.
    pub fn with_options(&self, options: LockOptions) -> LockResult<Self> {
        options.validate()?;
        Ok(Self {
            name: self.name.clone(),
            key: self.key.clone(),
            store: self.store.clone(),
            options,
        })
    }

    async fn acquire_with_policy(
        &self,
        policy: &RetryPolicy,
        cancel: &watch::Receiver<bool>,
    ) -> LockResult<Option<LeaseGuard<S>>> {
        self.options.validate()?;
        let session = acquire_with_retry(
            self.store.as_ref(),
            &self.key,
            self.options.expiry_duration(),
            self.options.release_mode(),
            policy,
            cancel,
        )
        .await?;
        Ok(session.map(|session| LeaseGuard::new(self.store.clone(), session)))
    }

    /// Acquires using the configured retry policy, abandoning the wait when
    /// `cancel` becomes `true`.
    pub async fn acquire_with(&self, cancel: &watch::Receiver<bool>) -> LockResult<Option<LeaseGuard<S>>> {
        self.acquire_with_policy(&self.options.retry_policy(), cancel).await
    }

    /// Runs `body` while holding the lease.
    ///
    /// Acquires with the configured retry policy; if the lease cannot be
    /// acquired the body is skipped. Once acquired, release is always
    /// attempted after the body, whatever it returned. A body error is logged
    /// and handed back inside [`Execution::Ran`]; a release failure is logged
    /// and never replaces the body's result.
    ///
    /// Acquisition errors (store unreachable, invalid options, cancellation)
    /// are returned as `Err` and the body does not run.
    #[instrument(skip(self, body, cancel), fields(lock.name = %self.name, lock.key = %self.key, backend = self.store.backend(), ran, released))]
    pub async fn run_exclusive_with<F, Fut, T, E>(
        &self,
        cancel: &watch::Receiver<bool>,
        body: F,
    ) -> LockResult<Execution<Result<T, E>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let Some(guard) = self.acquire_with(cancel).await? else {
            Span::current().record("ran", false);
            return Ok(Execution::Skipped);
        };

        let outcome = body().await;
        Span::current().record("ran", true);
        if let Err(e) = &outcome {
            error!(lock.key = %self.key, error = %e, "critical section failed");
        }

        match guard.release().await {
            Ok(released) => {
                Span::current().record("released", released);
            }
            Err(e) => {
                Span::current().record("released", false);
                error!(lock.key = %self.key, error = %e, "failed to release lease");
            }
        }

        Ok(Execution::Ran(outcome))
    }

    /// [`run_exclusive_with`](Self::run_exclusive_with) without a
    /// cancellation signal.
    pub async fn run_exclusive<F, Fut, T, E>(&self, body: F) -> LockResult<Execution<Result<T, E>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let (_cancel_sender, cancel_receiver) = watch::channel(false);
        self.run_exclusive_with(&cancel_receiver, body).await
    }
}

impl<S: LeaseStore> DistributedLock for LeaseLock<S> {
    type Handle = LeaseGuard<S>;

    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self), fields(lock.name = %self.name, lock.key = %self.key, timeout = ?timeout, backend = self.store.backend()))]
    async fn acquire(&self, timeout: Option<Duration>) -> LockResult<Self::Handle> {
        let configured = self.options.retry_policy();
        let policy = match timeout {
            // An explicit timeout polls at the configured interval until the
            // timeout passes, regardless of the configured attempt limit.
            Some(timeout) => RetryPolicy::polling(configured.interval, None, Some(timeout)),
            None => configured,
        };

        let (_cancel_sender, cancel_receiver) = watch::channel(false);
        match self.acquire_with_policy(&policy, &cancel_receiver).await? {
            Some(guard) => Ok(guard),
            None => Err(LockError::Timeout(timeout.unwrap_or(Duration::ZERO))),
        }
    }

    #[instrument(skip(self), fields(lock.name = %self.name, lock.key = %self.key, backend = self.store.backend()))]
    async fn try_acquire(&self) -> LockResult<Option<Self::Handle>> {
        let (_cancel_sender, cancel_receiver) = watch::channel(false);
        self.acquire_with_policy(&RetryPolicy::ONCE, &cancel_receiver).await
    }
}
