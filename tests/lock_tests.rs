//! Tests for lease locks, guards and the critical-section runner.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use lease_lock_core::prelude::*;
use tokio::sync::watch;

mod common;
use common::fixtures::{init_tracing, memory_provider, memory_provider_with};

/// Lets spawned background releases run.
async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_run_exclusive_releases_after_body() {
    init_tracing();
    let (provider, store) = memory_provider();
    let lock = provider.create_lock("report");

    let observed = lock
        .run_exclusive(|| {
            let store = store.clone();
            async move { store.owner("lease-lock:report").await }
        })
        .await
        .unwrap();

    let owner = observed.into_option().unwrap().unwrap();
    assert!(owner.is_some(), "body must run while the lease is held");
    assert_eq!(store.owner("lease-lock:report").await.unwrap(), None);
}

#[tokio::test]
async fn test_run_exclusive_releases_when_body_fails() {
    let (provider, store) = memory_provider();
    let lock = provider.create_lock("failing");

    let execution = lock
        .run_exclusive(|| async { Err::<(), _>(std::io::Error::other("boom")) })
        .await
        .unwrap();

    match execution {
        Execution::Ran(Err(e)) => assert_eq!(e.to_string(), "boom"),
        other => panic!("unexpected execution: {other:?}"),
    }
    assert_eq!(store.owner("lease-lock:failing").await.unwrap(), None);
}

#[tokio::test]
async fn test_run_exclusive_skips_when_held() {
    let (provider, _store) = memory_provider();
    let holder = provider.try_acquire_lock("busy").await.unwrap().unwrap();

    let ran = Arc::new(AtomicBool::new(false));
    let flag = ran.clone();
    let execution = provider
        .create_lock("busy")
        .run_exclusive(move || async move {
            flag.store(true, Ordering::SeqCst);
            Ok::<_, LockError>(())
        })
        .await
        .unwrap();

    assert!(matches!(execution, Execution::Skipped));
    assert!(!ran.load(Ordering::SeqCst));
    assert!(holder.release().await.unwrap());
}

#[tokio::test]
async fn test_release_failure_keeps_body_result() {
    let (provider, store) = memory_provider();
    let lock = provider.create_lock("flaky-release");

    let execution = lock
        .run_exclusive(|| {
            let store = store.clone();
            async move {
                // The store goes away while the critical section runs.
                store.set_unavailable(true);
                Ok::<_, LockError>(7)
            }
        })
        .await
        .unwrap();

    assert!(execution.ran());
    assert_eq!(execution.into_option().unwrap().unwrap(), 7);
}

#[tokio::test]
async fn test_run_exclusive_surfaces_store_outage() {
    let (provider, store) = memory_provider();
    store.set_unavailable(true);
    let ran = Arc::new(AtomicBool::new(false));
    let flag = ran.clone();

    let err = provider
        .create_lock("outage")
        .run_exclusive(move || async move {
            flag.store(true, Ordering::SeqCst);
            Ok::<_, LockError>(())
        })
        .await
        .unwrap_err();

    assert!(err.is_store_unavailable());
    assert!(!ran.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn test_run_exclusive_polls_until_free() {
    let options = LockOptions::new()
        .polling(Duration::from_millis(100))
        .max_attempts(Some(20));
    let (provider, _store) = memory_provider_with(options);

    let holder = provider.try_acquire_lock("queue").await.unwrap().unwrap();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(350)).await;
        holder.release().await.unwrap();
    });

    let execution = provider
        .create_lock("queue")
        .run_exclusive(|| async { Ok::<_, LockError>("done") })
        .await
        .unwrap();

    assert_eq!(execution.into_option().unwrap().unwrap(), "done");
}

#[tokio::test(start_paused = true)]
async fn test_run_exclusive_cancelled_while_waiting() {
    let options = LockOptions::new()
        .polling(Duration::from_secs(1))
        .max_attempts(Some(60));
    let (provider, _store) = memory_provider_with(options);
    let _holder = provider.try_acquire_lock("stuck").await.unwrap().unwrap();

    let (cancel, cancelled) = watch::channel(false);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(2500)).await;
        let _ = cancel.send(true);
    });

    let err = provider
        .create_lock("stuck")
        .run_exclusive_with(&cancelled, || async { Ok::<_, LockError>(()) })
        .await
        .unwrap_err();

    assert!(matches!(err, LockError::Cancelled));
}

#[tokio::test]
async fn test_dropped_guard_releases_in_background() {
    let (provider, store) = memory_provider();
    let lock = provider.create_lock("dropped");

    let guard = lock.try_acquire().await.unwrap().unwrap();
    assert!(store.owner("lease-lock:dropped").await.unwrap().is_some());
    drop(guard);

    settle().await;
    assert_eq!(store.owner("lease-lock:dropped").await.unwrap(), None);
}

#[tokio::test]
async fn test_explicit_release_is_the_only_release() {
    let (provider, store) = memory_provider();
    let guard = provider.try_acquire_lock("once").await.unwrap().unwrap();
    let before = store.operations();

    assert!(guard.release().await.unwrap());
    settle().await;
    settle().await;

    assert_eq!(store.operations() - before, 1);
}

#[tokio::test]
async fn test_panicking_section_still_releases() {
    let (provider, store) = memory_provider();
    let provider = Arc::new(provider);

    let task = {
        let provider = provider.clone();
        tokio::spawn(async move {
            let _guard = provider.try_acquire_lock("panics").await.unwrap().unwrap();
            panic!("critical section blew up");
        })
    };
    assert!(task.await.unwrap_err().is_panic());

    settle().await;
    assert_eq!(store.owner("lease-lock:panics").await.unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn test_acquire_times_out_while_held() {
    let (provider, _store) = memory_provider();
    let lock = provider.create_lock("timeout");
    let holder = lock.try_acquire().await.unwrap().unwrap();

    let err = lock.acquire(Some(Duration::from_millis(500))).await.unwrap_err();
    assert!(matches!(err, LockError::Timeout(t) if t == Duration::from_millis(500)));

    assert!(holder.release().await.unwrap());
    let handle = lock.acquire(Some(Duration::from_millis(500))).await.unwrap();
    assert!(handle.release().await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_acquire_with_unbounded_timeout() {
    let (provider, _store) = memory_provider();
    let lock = provider.create_lock("forever");

    let handle = lock.acquire(Some(Duration::MAX)).await.unwrap();
    assert!(handle.release().await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_delayed_release_guard_keeps_grace_lease() {
    let options = LockOptions::new()
        .expiry(Duration::from_secs(30))
        .delayed_release(Duration::from_secs(2));
    let (provider, store) = memory_provider_with(options);

    let guard = provider.create_lock("grace").try_acquire().await.unwrap().unwrap();
    let token = guard.token().clone();
    assert!(guard.release().await.unwrap());

    assert_eq!(
        store.owner("lease-lock:grace").await.unwrap().as_deref(),
        Some(token.as_str())
    );
    assert_eq!(store.ttl("lease-lock:grace"), Some(Duration::from_secs(2)));

    tokio::time::advance(Duration::from_secs(2)).await;
    assert!(provider.try_acquire_lock("grace").await.unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_guard_reports_lost_lease() {
    let options = LockOptions::new().expiry(Duration::from_millis(200));
    let (provider, _store) = memory_provider_with(options);

    let guard = provider.try_acquire_lock("overrun").await.unwrap().unwrap();
    tokio::time::advance(Duration::from_millis(250)).await;
    assert!(guard.lock_session().is_expired());

    let successor = provider.try_acquire_lock("overrun").await.unwrap().unwrap();
    assert!(!guard.release().await.unwrap());
    assert!(successor.release().await.unwrap());
}

#[tokio::test]
async fn test_lock_with_explicit_key() {
    let store = Arc::new(MemoryLeaseStore::new());
    let lock = LeaseLock::new(store.clone(), "billing.Invoices.close", LockOptions::default()).unwrap();
    assert_eq!(lock.name(), "billing.Invoices.close");

    let guard = lock.try_acquire().await.unwrap().unwrap();
    assert_eq!(
        store.owner("billing.Invoices.close").await.unwrap().as_deref(),
        Some(guard.token().as_str())
    );
    assert!(guard.release().await.unwrap());

    assert!(matches!(
        LeaseLock::new(store, "", LockOptions::default()),
        Err(LockError::InvalidName(_))
    ));
}

#[tokio::test]
async fn test_invalid_options_rejected() {
    let store = Arc::new(MemoryLeaseStore::new());
    let options = LockOptions::new().expiry(Duration::ZERO);
    assert!(LeaseLock::new(store.clone(), "k", options.clone()).is_err());

    let lock = LeaseLock::new(store, "k", LockOptions::default()).unwrap();
    assert!(lock.with_options(options).unwrap_err().is_usage_error());
}
