//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use lease_lock_core::prelude::*;

/// Installs a test-friendly tracing subscriber once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("lease_lock_core=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// A provider over a fresh in-memory store, plus a handle on that store.
pub fn memory_provider() -> (LeaseLockProvider<MemoryLeaseStore>, Arc<MemoryLeaseStore>) {
    let store = Arc::new(MemoryLeaseStore::new());
    (LeaseLockProvider::from_arc(store.clone()), store)
}

/// A memory-backed provider whose locks use `options`.
pub fn memory_provider_with(
    options: LockOptions,
) -> (LeaseLockProvider<MemoryLeaseStore>, Arc<MemoryLeaseStore>) {
    let (provider, store) = memory_provider();
    (provider.with_options(options).unwrap(), store)
}

pub fn key(name: &str) -> LockKey {
    LockKey::new(name).unwrap()
}

pub const TTL: Duration = Duration::from_millis(5000);
