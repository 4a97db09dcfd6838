//! Store-agnostic lock provider.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{LockError, LockResult};
use crate::key::{DEFAULT_KEY_PREFIX, LockKey};
use crate::lock::LeaseLock;
use crate::options::{LockOptions, ReleaseMode};
use crate::protocol;
use crate::store::LeaseStore;
use crate::token::LockToken;
use crate::traits::LockProvider;

/// Hands out [`LeaseLock`]s that share one store and one set of defaults.
pub struct LeaseLockProvider<S: LeaseStore> {
    store: Arc<S>,
    key_prefix: String,
    options: LockOptions,
}

impl<S: LeaseStore> Clone for LeaseLockProvider<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            key_prefix: self.key_prefix.clone(),
            options: self.options.clone(),
        }
    }
}

impl<S: LeaseStore> LeaseLockProvider<S> {
    /// Creates a provider with default options and key prefix.
    pub fn new(store: S) -> Self {
        Self::from_arc(Arc::new(store))
    }

    pub fn from_arc(store: Arc<S>) -> Self {
        Self {
            store,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            options: LockOptions::default(),
        }
    }

    /// Sets the namespace prepended to every lock name.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Sets the options used by [`create_lock`](LockProvider::create_lock).
    pub fn with_options(mut self, options: LockOptions) -> LockResult<Self> {
        options.validate()?;
        self.options = options;
        Ok(self)
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    pub fn options(&self) -> &LockOptions {
        &self.options
    }

    /// Creates a lock with explicit options, validating both name and options.
    pub fn lock_with(&self, name: &str, options: LockOptions) -> LockResult<LeaseLock<S>> {
        let key = LockKey::with_prefix(&self.key_prefix, name)?;
        options.validate()?;
        Ok(LeaseLock::from_parts(name.to_string(), key, self.store.clone(), options))
    }

    /// Single acquisition attempt on `name`, returning the generated token
    /// and whether the lease was taken.
    ///
    /// The caller is responsible for passing the token back to
    /// [`release_raw`](Self::release_raw) when `acquired` is `true`.
    pub async fn try_acquire_raw(&self, name: &str, ttl: Duration) -> LockResult<(LockToken, bool)> {
        let key = LockKey::with_prefix(&self.key_prefix, name)?;
        let token = LockToken::generate();
        let acquired = protocol::try_acquire(self.store.as_ref(), &key, &token, ttl).await?;
        Ok((token, acquired))
    }

    /// Releases the lease on `name` held by `token`.
    ///
    /// With `delayed` set the lease is shortened to `lease` instead of being
    /// deleted; `lease` is ignored otherwise.
    pub async fn release_raw(
        &self,
        name: &str,
        token: &str,
        delayed: bool,
        lease: Option<Duration>,
    ) -> LockResult<bool> {
        let key = LockKey::with_prefix(&self.key_prefix, name)?;
        let token = LockToken::new(token)?;
        let mode = if delayed {
            let lease = lease.ok_or_else(|| {
                LockError::InvalidArgument("delayed release requires a lease time".to_string())
            })?;
            ReleaseMode::Delayed { lease }
        } else {
            ReleaseMode::Immediate
        };
        protocol::release(self.store.as_ref(), &key, &token, mode).await
    }
}

impl<S: LeaseStore> LockProvider for LeaseLockProvider<S> {
    type Lock = LeaseLock<S>;

    /// Creates a lock with the provider's default options.
    ///
    /// An empty name is not rejected here; it surfaces as
    /// [`LockError::InvalidName`] on the first acquisition attempt.
    fn create_lock(&self, name: &str) -> Self::Lock {
        let key = LockKey::with_prefix(&self.key_prefix, name)
            .unwrap_or_else(|_| LockKey::unchecked(String::new()));
        LeaseLock::from_parts(name.to_string(), key, self.store.clone(), self.options.clone())
    }
}
