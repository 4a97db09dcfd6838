//! Declarative per-lock configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{LockError, LockResult};
use crate::retry::RetryPolicy;

/// How a held lease is given up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseMode {
    /// Delete the lease as soon as the critical section ends.
    Immediate,
    /// Keep the lease for a short grace window, then let it expire.
    Delayed { lease: Duration },
}

/// Configuration for one protected critical section.
///
/// Field names follow the store-agnostic declarative form; camelCase aliases
/// are accepted so existing configuration files can be reused as-is.
///
/// ```
/// use lease_lock_core::options::LockOptions;
///
/// let options: LockOptions = serde_json::from_str(
///     r#"{ "expireTimeMillis": 5000, "isPolling": true, "pollingIntervalMillis": 200 }"#,
/// ).unwrap();
/// assert!(options.polling);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LockOptions {
    /// Lease time-to-live set on acquisition.
    #[serde(alias = "expireTimeMillis", alias = "expireTime")]
    pub expire_time_millis: u64,
    /// Release by shortening the lease instead of deleting it.
    #[serde(alias = "isDelayReleaseLock")]
    pub delay_release: bool,
    /// Remaining lease after a delayed release.
    #[serde(alias = "leaseTimeSeconds", alias = "leaseTime")]
    pub lease_time_seconds: u64,
    /// Re-attempt acquisition after a failed attempt.
    #[serde(alias = "isPolling")]
    pub polling: bool,
    /// Sleep between polling attempts.
    #[serde(alias = "pollingIntervalMillis", alias = "pollingIntervalTime")]
    pub polling_interval_millis: u64,
    /// Upper bound on acquisition attempts while polling.
    #[serde(alias = "maxAttempts")]
    pub max_attempts: Option<u32>,
    /// Upper bound on total time spent polling.
    #[serde(alias = "maxWaitMillis")]
    pub max_wait_millis: Option<u64>,
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            expire_time_millis: 30_000,
            delay_release: false,
            lease_time_seconds: 1,
            polling: false,
            polling_interval_millis: 100,
            max_attempts: Some(100),
            max_wait_millis: None,
        }
    }
}

impl LockOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expiry(mut self, expiry: Duration) -> Self {
        self.expire_time_millis = saturating_millis(expiry);
        self
    }

    /// Switches to delayed release with the given grace lease, rounded up
    /// to whole seconds.
    pub fn delayed_release(mut self, lease: Duration) -> Self {
        self.delay_release = true;
        self.lease_time_seconds = lease.as_secs().saturating_add(u64::from(lease.subsec_nanos() > 0));
        self
    }

    /// Enables polling every `interval`.
    pub fn polling(mut self, interval: Duration) -> Self {
        self.polling = true;
        self.polling_interval_millis = saturating_millis(interval);
        self
    }

    pub fn max_attempts(mut self, attempts: Option<u32>) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn max_wait(mut self, wait: Option<Duration>) -> Self {
        self.max_wait_millis = wait.map(saturating_millis);
        self
    }

    /// Lease time-to-live requested at acquisition.
    pub fn expiry_duration(&self) -> Duration {
        Duration::from_millis(self.expire_time_millis)
    }

    pub fn release_mode(&self) -> ReleaseMode {
        if self.delay_release {
            ReleaseMode::Delayed {
                lease: Duration::from_secs(self.lease_time_seconds),
            }
        } else {
            ReleaseMode::Immediate
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            polling: self.polling,
            interval: Duration::from_millis(self.polling_interval_millis),
            max_attempts: self.max_attempts,
            max_wait: self.max_wait_millis.map(Duration::from_millis),
        }
    }

    /// Rejects configurations the protocol cannot honour.
    pub fn validate(&self) -> LockResult<()> {
        if self.expire_time_millis == 0 {
            return Err(LockError::InvalidArgument(
                "expire time must be greater than zero".to_string(),
            ));
        }
        if self.delay_release && self.lease_time_seconds == 0 {
            return Err(LockError::InvalidArgument(
                "delayed release requires a lease time greater than zero".to_string(),
            ));
        }
        self.retry_policy().validate()
    }
}
