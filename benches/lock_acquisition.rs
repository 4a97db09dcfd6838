//! Benchmarks for lease acquisition latency

use std::sync::Arc;
use std::time::Duration;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use lease_lock_core::prelude::*;

fn bench_memory_lease_acquisition(c: &mut Criterion) {
    let store = Arc::new(MemoryLeaseStore::new());
    let provider = LeaseLockProvider::from_arc(store);
    let lock = provider.create_lock("bench-lock");

    let mut group = c.benchmark_group("memory_lease");
    group.bench_function("try_acquire_release", |b| {
        b.to_async(tokio::runtime::Runtime::new().unwrap())
            .iter(|| async {
                if let Ok(Some(handle)) = lock.try_acquire().await {
                    let _ = black_box(handle.release().await);
                }
            });
    });

    group.bench_function("acquire_no_wait", |b| {
        b.to_async(tokio::runtime::Runtime::new().unwrap())
            .iter(|| async {
                if let Ok(handle) = lock.acquire(Some(Duration::from_millis(1))).await {
                    let _ = handle.release().await;
                }
            });
    });

    group.bench_function("run_exclusive", |b| {
        b.to_async(tokio::runtime::Runtime::new().unwrap())
            .iter(|| async {
                let execution = lock
                    .run_exclusive(|| async { Ok::<_, LockError>(black_box(1u64)) })
                    .await;
                black_box(execution)
            });
    });

    group.bench_function("raw_acquire_release", |b| {
        b.to_async(tokio::runtime::Runtime::new().unwrap())
            .iter(|| async {
                let (token, acquired) = provider
                    .try_acquire_raw("bench-raw", Duration::from_secs(5))
                    .await
                    .unwrap();
                if acquired {
                    let _ = provider.release_raw("bench-raw", token.as_str(), false, None).await;
                }
            });
    });

    group.finish();
}

criterion_group!(benches, bench_memory_lease_acquisition);
criterion_main!(benches);
