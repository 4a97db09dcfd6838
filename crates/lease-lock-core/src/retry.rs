//! Polling around failed acquisitions.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{Span, debug, instrument};

use crate::error::{LockError, LockResult};
use crate::key::LockKey;
use crate::options::ReleaseMode;
use crate::protocol;
use crate::session::LockSession;
use crate::store::LeaseStore;
use crate::timeout::Deadline;
use crate::token::LockToken;

/// When and how often to re-attempt a failed acquisition.
///
/// Polling is always bounded: by attempt count, by total wait, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub polling: bool,
    pub interval: Duration,
    /// Total attempts including the first one.
    pub max_attempts: Option<u32>,
    pub max_wait: Option<Duration>,
}

impl RetryPolicy {
    /// A single attempt, no polling.
    pub const ONCE: Self = Self {
        polling: false,
        interval: Duration::ZERO,
        max_attempts: Some(1),
        max_wait: None,
    };

    pub fn polling(interval: Duration, max_attempts: Option<u32>, max_wait: Option<Duration>) -> Self {
        Self {
            polling: true,
            interval,
            max_attempts,
            max_wait,
        }
    }

    pub fn validate(&self) -> LockResult<()> {
        if !self.polling {
            return Ok(());
        }
        if self.interval.is_zero() {
            return Err(LockError::InvalidArgument(
                "polling interval must be greater than zero".to_string(),
            ));
        }
        match (self.max_attempts, self.max_wait) {
            (None, None) => Err(LockError::InvalidArgument(
                "polling requires max_attempts or max_wait".to_string(),
            )),
            (Some(0), _) => Err(LockError::InvalidArgument(
                "max_attempts must be at least 1".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn attempts_exhausted(&self, attempts: u32) -> bool {
        !self.polling || self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::ONCE
    }
}

/// Tries to acquire `key`, polling according to `policy`.
///
/// Each attempt uses a freshly generated token. Returns `Ok(None)` when the
/// lock was not acquired within the policy's bounds, and
/// [`LockError::Cancelled`] if `cancel` flips to `true` while waiting between
/// attempts. Store failures end the loop immediately.
#[instrument(skip(store, policy, cancel), fields(lock.key = %key, backend = store.backend(), attempts, acquired))]
pub async fn acquire_with_retry<S: LeaseStore>(
    store: &S,
    key: &LockKey,
    expiry: Duration,
    release_mode: ReleaseMode,
    policy: &RetryPolicy,
    cancel: &watch::Receiver<bool>,
) -> LockResult<Option<LockSession>> {
    policy.validate()?;

    let deadline = Deadline::after(policy.max_wait);
    let mut cancel = cancel.clone();
    let mut attempts = 0u32;

    loop {
        if *cancel.borrow_and_update() {
            return Err(LockError::Cancelled);
        }

        attempts += 1;
        let token = LockToken::generate();
        let started = Instant::now();
        if protocol::try_acquire(store, key, &token, expiry).await? {
            Span::current().record("attempts", attempts);
            Span::current().record("acquired", true);
            return Ok(Some(LockSession::new(
                key.clone(),
                token,
                expiry,
                release_mode,
                started,
                attempts,
            )));
        }

        if policy.attempts_exhausted(attempts) || deadline.is_expired() {
            Span::current().record("attempts", attempts);
            Span::current().record("acquired", false);
            return Ok(None);
        }

        let sleep = deadline.clamp(policy.interval);
        debug!(lock.key = %key, attempt = attempts, sleep = ?sleep, "lock held elsewhere, polling");

        tokio::select! {
            _ = tokio::time::sleep(sleep) => {}
            changed = cancel.changed() => match changed {
                Ok(()) if *cancel.borrow() => return Err(LockError::Cancelled),
                Ok(()) => {}
                // Sender dropped: nobody can cancel any more.
                Err(_) => tokio::time::sleep(sleep).await,
            },
        }
    }
}
