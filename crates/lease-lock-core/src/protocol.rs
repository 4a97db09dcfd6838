//! Single-shot acquire and release.
//!
//! Both operations issue exactly one atomic store command. Neither retries:
//! re-attempting a failed acquisition is the job of [`crate::retry`].

use std::time::Duration;

use tracing::{Span, instrument, warn};

use crate::error::{LockError, LockResult};
use crate::key::LockKey;
use crate::options::ReleaseMode;
use crate::store::LeaseStore;
use crate::token::LockToken;

fn validate_ttl(ttl: Duration, what: &str) -> LockResult<()> {
    // The store works in whole milliseconds; anything below one would be
    // sent as a zero TTL.
    if ttl.as_millis() == 0 {
        return Err(LockError::InvalidArgument(format!(
            "{what} must be greater than zero, got {ttl:?}"
        )));
    }
    Ok(())
}

/// Attempts once to create the lease `key -> token` with the given TTL.
///
/// Returns `Ok(true)` if the lease was created, `Ok(false)` if another
/// unexpired lease already exists. A zero TTL is rejected before the store
/// is contacted.
#[instrument(skip(store, token), fields(lock.key = %key, ttl = ?ttl, backend = store.backend(), acquired))]
pub async fn try_acquire<S: LeaseStore>(
    store: &S,
    key: &LockKey,
    token: &LockToken,
    ttl: Duration,
) -> LockResult<bool> {
    key.ensure_valid()?;
    validate_ttl(ttl, "lease ttl")?;

    let acquired = store.set_if_absent(key.as_str(), token.as_str(), ttl).await?;
    Span::current().record("acquired", acquired);
    Ok(acquired)
}

/// Gives up the lease `key -> token`, if `token` still owns it.
///
/// In [`ReleaseMode::Immediate`] the lease is deleted; in
/// [`ReleaseMode::Delayed`] its remaining lifetime is replaced by the grace
/// lease. Either way the ownership check and the mutation happen in one
/// atomic store operation. Returns `Ok(false)` without mutating anything if
/// the lease expired or belongs to someone else.
#[instrument(skip(store, token), fields(lock.key = %key, mode = ?mode, backend = store.backend(), released))]
pub async fn release<S: LeaseStore>(
    store: &S,
    key: &LockKey,
    token: &LockToken,
    mode: ReleaseMode,
) -> LockResult<bool> {
    key.ensure_valid()?;
    let released = match mode {
        ReleaseMode::Immediate => store.compare_and_delete(key.as_str(), token.as_str()).await?,
        ReleaseMode::Delayed { lease } => {
            validate_ttl(lease, "release lease")?;
            store
                .compare_and_expire(key.as_str(), token.as_str(), lease)
                .await?
        }
    };

    Span::current().record("released", released);
    if !released {
        warn!(
            lock.key = %key,
            "lease was no longer owned at release; the critical section may have outlived its ttl"
        );
    }
    Ok(released)
}
