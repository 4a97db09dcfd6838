//! Redis implementation of the lease store contract.

use std::future::Future;
use std::time::Duration;

use fred::prelude::*;
use fred::types::CustomCommand;
use lease_lock_core::error::{LockError, LockResult};
use lease_lock_core::store::LeaseStore;
use tracing::info;

use crate::options::RedisStoreOptions;

/// Lua script to release the lock.
const RELEASE_SCRIPT_LUA: &str = r#"
    if redis.call('get', KEYS[1]) == ARGV[1] then
        return redis.call('del', KEYS[1])
    end
    return 0
"#;

/// Lua script to replace the remaining lifetime of an owned lease.
const EXPIRE_SCRIPT_LUA: &str = r#"
    if redis.call('get', KEYS[1]) == ARGV[1] then
        return redis.call('pexpire', KEYS[1], ARGV[2])
    end
    return 0
"#;

/// Maps a fred error onto the lock taxonomy: anything that means "could
/// not talk to Redis" becomes [`LockError::Connection`].
fn map_redis_error(operation: &str, e: RedisError) -> LockError {
    let message = format!("Redis {} failed: {}", operation, e);
    match e.kind() {
        RedisErrorKind::IO
        | RedisErrorKind::Timeout
        | RedisErrorKind::Canceled
        | RedisErrorKind::Backpressure
        | RedisErrorKind::Cluster => LockError::unavailable(message),
        _ => LockError::backend(message),
    }
}

fn ttl_millis(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
}

/// Lease store backed by a pool of fred Redis clients.
///
/// Each operation borrows one client from the pool for a single command; a
/// command that does not complete within the configured command timeout is
/// reported as the store being unavailable.
#[derive(Clone)]
pub struct RedisLeaseStore {
    pool: RedisPool,
    command_timeout: Duration,
}

impl RedisLeaseStore {
    /// Connects a new pool using `options`.
    pub async fn connect(options: &RedisStoreOptions) -> LockResult<Self> {
        options.validate()?;
        let config = options.to_config()?;

        let mut builder = Builder::from_config(config);
        let connect_timeout = options.connect_timeout();
        builder.with_connection_config(|connection| {
            connection.connection_timeout = connect_timeout;
        });
        if let Some(policy) = options.reconnect_policy() {
            builder.set_policy(policy);
        }

        let pool = builder
            .build_pool(options.pool_size)
            .map_err(|e| LockError::InvalidArgument(format!("invalid Redis configuration: {}", e)))?;

        pool.connect();
        tokio::time::timeout(connect_timeout, pool.wait_for_connect())
            .await
            .map_err(|_| {
                LockError::unavailable(format!(
                    "timed out connecting to Redis at {} after {:?}",
                    options.server_label(),
                    connect_timeout
                ))
            })?
            .map_err(|e| map_redis_error("connect", e))?;

        info!(
            server = %options.server_label(),
            pool_size = options.pool_size,
            "connected lease lock store to Redis"
        );

        Ok(Self::from_pool(pool, options.command_timeout()))
    }

    /// Wraps an already connected pool.
    pub fn from_pool(pool: RedisPool, command_timeout: Duration) -> Self {
        Self {
            pool,
            command_timeout,
        }
    }

    pub fn pool(&self) -> &RedisPool {
        &self.pool
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        command: impl Future<Output = Result<T, RedisError>>,
    ) -> LockResult<T> {
        match tokio::time::timeout(self.command_timeout, command).await {
            Ok(result) => result.map_err(|e| map_redis_error(operation, e)),
            Err(_) => Err(LockError::unavailable(format!(
                "Redis {} timed out after {:?}",
                operation, self.command_timeout
            ))),
        }
    }

    async fn eval(&self, operation: &str, script: &'static str, key: &str, args: Vec<RedisValue>) -> LockResult<bool> {
        let mut command_args: Vec<RedisValue> = vec![
            script.into(),
            1_i64.into(), // numkeys
            key.to_string().into(),
        ];
        command_args.extend(args);

        let cmd = CustomCommand::new_static("EVAL", None, false);
        let client = self.pool.next();
        let result: i64 = self.bounded(operation, client.custom(cmd, command_args)).await?;
        Ok(result == 1)
    }
}

impl LeaseStore for RedisLeaseStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> LockResult<bool> {
        let client = self.pool.next();
        // SET NX PX returns the OK reply if the key was set, nil if it exists
        let result: Option<String> = self
            .bounded(
                "SET NX",
                client.set(
                    key,
                    value,
                    Some(Expiration::PX(ttl_millis(ttl))),
                    Some(SetOptions::NX),
                    false,
                ),
            )
            .await?;
        Ok(result.is_some())
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> LockResult<bool> {
        self.eval(
            "EVAL (release)",
            RELEASE_SCRIPT_LUA,
            key,
            vec![expected.to_string().into()],
        )
        .await
    }

    async fn compare_and_expire(&self, key: &str, expected: &str, ttl: Duration) -> LockResult<bool> {
        self.eval(
            "EVAL (expire)",
            EXPIRE_SCRIPT_LUA,
            key,
            vec![expected.to_string().into(), ttl_millis(ttl).into()],
        )
        .await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> LockResult<bool> {
        let cmd = CustomCommand::new_static("PEXPIRE", None, false);
        let args: Vec<RedisValue> = vec![key.to_string().into(), ttl_millis(ttl).into()];
        let client = self.pool.next();
        let result: i64 = self.bounded("PEXPIRE", client.custom(cmd, args)).await?;
        Ok(result == 1)
    }

    async fn owner(&self, key: &str) -> LockResult<Option<String>> {
        let client = self.pool.next();
        self.bounded("GET", client.get(key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_errors_are_unavailable() {
        let err = map_redis_error("SET NX", RedisError::new(RedisErrorKind::IO, "connection reset"));
        assert!(err.is_store_unavailable());

        let err = map_redis_error("SET NX", RedisError::new(RedisErrorKind::Timeout, "timed out"));
        assert!(err.is_store_unavailable());
    }

    #[test]
    fn test_reply_errors_are_backend() {
        let err = map_redis_error("EVAL (release)", RedisError::new(RedisErrorKind::Parse, "bad reply"));
        assert!(matches!(err, LockError::Backend(_)));
    }

    #[test]
    fn test_ttl_millis_saturates() {
        assert_eq!(ttl_millis(Duration::from_millis(5000)), 5000);
        assert_eq!(ttl_millis(Duration::MAX), i64::MAX);
    }

    #[test]
    fn test_scripts_check_ownership_first() {
        for script in [RELEASE_SCRIPT_LUA, EXPIRE_SCRIPT_LUA] {
            assert!(script.contains("redis.call('get', KEYS[1]) == ARGV[1]"));
        }
    }
}
