//! Lock sessions and the guard that owns a held lease.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{error, instrument, warn};

use crate::error::LockResult;
use crate::key::LockKey;
use crate::options::ReleaseMode;
use crate::protocol;
use crate::store::LeaseStore;
use crate::token::LockToken;
use crate::traits::LockHandle;

/// Everything one successful acquisition needs to later prove and give up
/// its ownership. Key and token never change for the life of the session.
#[derive(Debug, Clone)]
pub struct LockSession {
    key: LockKey,
    token: LockToken,
    expiry: Duration,
    release_mode: ReleaseMode,
    acquired_at: Instant,
    attempts: u32,
}

impl LockSession {
    pub(crate) fn new(
        key: LockKey,
        token: LockToken,
        expiry: Duration,
        release_mode: ReleaseMode,
        acquired_at: Instant,
        attempts: u32,
    ) -> Self {
        Self {
            key,
            token,
            expiry,
            release_mode,
            acquired_at,
            attempts,
        }
    }

    pub fn key(&self) -> &LockKey {
        &self.key
    }

    pub fn token(&self) -> &LockToken {
        &self.token
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    pub fn release_mode(&self) -> ReleaseMode {
        self.release_mode
    }

    /// Number of attempts it took to acquire, including the successful one.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether the lease has outlived its ttl as seen by this process.
    ///
    /// Measured from just before the acquiring command was sent, so it errs
    /// on the side of reporting expiry early.
    pub fn is_expired(&self) -> bool {
        self.acquired_at.elapsed() >= self.expiry
    }
}

/// Handle to a held lease.
///
/// Call [`LockHandle::release`] to give the lease up and learn whether
/// it was still ours. A guard dropped without an explicit release (early
/// return, `?`, panic, cancelled future) schedules the release on the
/// current tokio runtime; outside a runtime the lease is left to expire.
pub struct LeaseGuard<S: LeaseStore> {
    store: Arc<S>,
    session: LockSession,
    released: bool,
}

impl<S: LeaseStore> fmt::Debug for LeaseGuard<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeaseGuard")
            .field("session", &self.session)
            .field("released", &self.released)
            .finish()
    }
}

impl<S: LeaseStore> LeaseGuard<S> {
    pub(crate) fn new(store: Arc<S>, session: LockSession) -> Self {
        Self {
            store,
            session,
            released: false,
        }
    }

    pub fn key(&self) -> &LockKey {
        self.session.key()
    }

    pub fn lock_session(&self) -> &LockSession {
        &self.session
    }

    async fn release_now(&mut self) -> LockResult<bool> {
        let result = protocol::release(
            self.store.as_ref(),
            &self.session.key,
            &self.session.token,
            self.session.release_mode,
        )
        .await;
        // Marked only once the attempt finished: a release future dropped
        // mid-flight still falls back to the background release.
        self.released = true;
        result
    }
}

impl<S: LeaseStore> LockHandle for LeaseGuard<S> {
    fn token(&self) -> &LockToken {
        self.session.token()
    }

    /// Releases the lease according to its release mode.
    ///
    /// Returns `Ok(false)` if the lease had already expired or been taken
    /// over by another owner.
    #[instrument(skip(self), fields(lock.key = %self.session.key, backend = self.store.backend()))]
    async fn release(mut self) -> LockResult<bool> {
        self.release_now().await
    }
}

impl<S: LeaseStore> Drop for LeaseGuard<S> {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                warn!(lock.key = %self.session.key, "lease guard dropped without release; releasing in background");
                let store = self.store.clone();
                let session = self.session.clone();
                runtime.spawn(async move {
                    if let Err(e) = protocol::release(
                        store.as_ref(),
                        &session.key,
                        &session.token,
                        session.release_mode,
                    )
                    .await
                    {
                        error!(lock.key = %session.key, error = %e, "background release failed");
                    }
                });
            }
            Err(_) => {
                warn!(
                    lock.key = %self.session.key,
                    expiry = ?self.session.expiry,
                    "lease guard dropped outside a runtime; lease will expire on its own"
                );
            }
        }
    }
}
