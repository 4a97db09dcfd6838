//! Redis lock provider implementation.

use std::sync::Arc;
use std::time::Duration;

use fred::prelude::*;
use lease_lock_core::error::LockResult;
use lease_lock_core::key::DEFAULT_KEY_PREFIX;
use lease_lock_core::lock::LeaseLock;
use lease_lock_core::options::LockOptions;
use lease_lock_core::provider::LeaseLockProvider;
use lease_lock_core::token::LockToken;
use lease_lock_core::traits::LockProvider;

use crate::options::RedisStoreOptions;
use crate::store::RedisLeaseStore;

/// Builder for Redis lock provider configuration.
pub struct RedisLockProviderBuilder {
    store_options: RedisStoreOptions,
    pool: Option<RedisPool>,
    lock_options: LockOptions,
    key_prefix: String,
}

impl RedisLockProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            store_options: RedisStoreOptions::default(),
            pool: None,
            lock_options: LockOptions::default(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }

    /// Sets the Redis server URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.store_options.url = Some(url.into());
        self
    }

    /// Replaces all connection settings.
    pub fn store_options(mut self, options: RedisStoreOptions) -> Self {
        self.store_options = options;
        self
    }

    /// Uses an existing, already connected pool instead of opening one.
    pub fn pool(mut self, pool: RedisPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Sets the number of pooled connections.
    pub fn pool_size(mut self, size: usize) -> Self {
        self.store_options.pool_size = size;
        self
    }

    /// Sets the per-command timeout.
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.store_options.command_timeout_millis = timeout.as_millis() as u64;
        self
    }

    /// Sets the default options for locks created by the provider.
    pub fn lock_options(mut self, options: LockOptions) -> Self {
        self.lock_options = options;
        self
    }

    /// Sets the lease time-to-live.
    pub fn expiry(mut self, expiry: Duration) -> Self {
        self.lock_options = self.lock_options.expiry(expiry);
        self
    }

    /// Sets the namespace prepended to every lock name.
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Builds the provider, connecting to Redis unless a pool was supplied.
    pub async fn build(self) -> LockResult<RedisLockProvider> {
        self.lock_options.validate()?;

        let store = match self.pool {
            Some(pool) => RedisLeaseStore::from_pool(pool, self.store_options.command_timeout()),
            None => RedisLeaseStore::connect(&self.store_options).await?,
        };

        let inner = LeaseLockProvider::new(store)
            .with_key_prefix(self.key_prefix)
            .with_options(self.lock_options)?;
        Ok(RedisLockProvider { inner })
    }
}

impl Default for RedisLockProviderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Provider for Redis-backed lease locks.
#[derive(Clone)]
pub struct RedisLockProvider {
    inner: LeaseLockProvider<RedisLeaseStore>,
}

impl RedisLockProvider {
    /// Returns a new builder for configuring the provider.
    pub fn builder() -> RedisLockProviderBuilder {
        RedisLockProviderBuilder::new()
    }

    /// Creates a provider using the specified Redis URL.
    pub async fn new(url: impl Into<String>) -> LockResult<Self> {
        Self::builder().url(url).build().await
    }

    /// Creates a provider from `REDIS_URL`.
    pub async fn from_env() -> LockResult<Self> {
        Self::builder()
            .store_options(RedisStoreOptions::from_env())
            .build()
            .await
    }

    pub fn store(&self) -> &Arc<RedisLeaseStore> {
        self.inner.store()
    }

    /// Creates a lock with options other than the provider defaults.
    pub fn lock_with(&self, name: &str, options: LockOptions) -> LockResult<LeaseLock<RedisLeaseStore>> {
        self.inner.lock_with(name, options)
    }

    /// Single acquisition attempt; see [`LeaseLockProvider::try_acquire_raw`].
    pub async fn try_acquire_raw(&self, name: &str, ttl: Duration) -> LockResult<(LockToken, bool)> {
        self.inner.try_acquire_raw(name, ttl).await
    }

    /// Token-checked release; see [`LeaseLockProvider::release_raw`].
    pub async fn release_raw(
        &self,
        name: &str,
        token: &str,
        delayed: bool,
        lease: Option<Duration>,
    ) -> LockResult<bool> {
        self.inner.release_raw(name, token, delayed, lease).await
    }
}

impl LockProvider for RedisLockProvider {
    type Lock = LeaseLock<RedisLeaseStore>;

    fn create_lock(&self, name: &str) -> Self::Lock {
        self.inner.create_lock(name)
    }
}
