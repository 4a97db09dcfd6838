//! Redis connection settings.

use std::time::Duration;

use fred::prelude::*;
use lease_lock_core::error::{LockError, LockResult};
use serde::Deserialize;

/// Environment variable consulted by [`RedisStoreOptions::from_env`].
pub const REDIS_URL_ENV: &str = "REDIS_URL";

/// How to reach the Redis server holding the leases.
///
/// Either `url` or `host`/`port` names the server; a password or database
/// given alongside a URL overrides the one embedded in it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RedisStoreOptions {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<u8>,
    /// Number of multiplexed connections in the pool.
    #[serde(alias = "maxIdle")]
    pub pool_size: usize,
    /// Time allowed for establishing a connection.
    #[serde(alias = "maxWaitMillis")]
    pub connect_timeout_millis: u64,
    /// Time allowed for a single command round-trip.
    #[serde(alias = "timeout")]
    pub command_timeout_millis: u64,
    pub reconnect_max_attempts: u32,
    pub reconnect_delay_millis: u32,
}

impl Default for RedisStoreOptions {
    fn default() -> Self {
        Self {
            url: None,
            host: "127.0.0.1".to_string(),
            port: 6379,
            username: None,
            password: None,
            database: None,
            pool_size: 8,
            connect_timeout_millis: 5_000,
            command_timeout_millis: 2_000,
            reconnect_max_attempts: 0,
            reconnect_delay_millis: 500,
        }
    }
}

impl RedisStoreOptions {
    /// Options pointing at `url`.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Options from `REDIS_URL`, falling back to `redis://127.0.0.1:6379`.
    pub fn from_env() -> Self {
        match std::env::var(REDIS_URL_ENV) {
            Ok(url) if !url.is_empty() => Self::from_url(url),
            _ => Self::default(),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_millis)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_millis)
    }

    /// Human-readable server address for logs (never includes credentials).
    pub fn server_label(&self) -> String {
        match &self.url {
            Some(url) => match url.rsplit_once('@') {
                Some((_, host)) => host.to_string(),
                None => url.trim_start_matches("redis://").to_string(),
            },
            None => format!("{}:{}", self.host, self.port),
        }
    }

    pub fn validate(&self) -> LockResult<()> {
        if self.pool_size == 0 {
            return Err(LockError::InvalidArgument(
                "redis pool size must be at least 1".to_string(),
            ));
        }
        if self.command_timeout_millis == 0 {
            return Err(LockError::InvalidArgument(
                "redis command timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn to_config(&self) -> LockResult<RedisConfig> {
        let mut config = match &self.url {
            Some(url) => RedisConfig::from_url(url).map_err(|e| {
                LockError::InvalidArgument(format!("invalid Redis URL: {}", e))
            })?,
            None => RedisConfig {
                server: ServerConfig::new_centralized(self.host.clone(), self.port),
                ..RedisConfig::default()
            },
        };

        if self.username.is_some() {
            config.username = self.username.clone();
        }
        if self.password.is_some() {
            config.password = self.password.clone();
        }
        if self.database.is_some() {
            config.database = self.database;
        }
        Ok(config)
    }

    pub(crate) fn reconnect_policy(&self) -> Option<ReconnectPolicy> {
        (self.reconnect_max_attempts > 0).then(|| {
            ReconnectPolicy::new_constant(self.reconnect_max_attempts, self.reconnect_delay_millis)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_store_properties() {
        let options: RedisStoreOptions = serde_json::from_str(
            r#"{ "host": "redis.internal", "port": 6380, "password": "s3cret",
                 "timeout": 1500, "maxIdle": 4, "maxWaitMillis": 3000 }"#,
        )
        .unwrap();

        assert_eq!(options.host, "redis.internal");
        assert_eq!(options.port, 6380);
        assert_eq!(options.command_timeout(), Duration::from_millis(1500));
        assert_eq!(options.pool_size, 4);
        assert_eq!(options.connect_timeout(), Duration::from_secs(3));
        options.validate().unwrap();
    }

    #[test]
    fn test_server_label_hides_credentials() {
        let options = RedisStoreOptions::from_url("redis://user:pw@cache:6379/2");
        assert_eq!(options.server_label(), "cache:6379/2");

        let options = RedisStoreOptions::default();
        assert_eq!(options.server_label(), "127.0.0.1:6379");
    }

    #[test]
    fn test_host_port_config() {
        let options = RedisStoreOptions {
            host: "cache".to_string(),
            port: 7000,
            password: Some("pw".to_string()),
            ..RedisStoreOptions::default()
        };
        let config = options.to_config().unwrap();
        assert_eq!(config.password.as_deref(), Some("pw"));
    }

    #[test]
    fn test_zero_pool_rejected() {
        let options = RedisStoreOptions {
            pool_size: 0,
            ..RedisStoreOptions::default()
        };
        assert!(options.validate().unwrap_err().is_usage_error());
    }
}
