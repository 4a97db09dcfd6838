//! Example: Lease locks over the in-memory store
//!
//! Run with: `cargo run --example memory_lock`
//!
//! Several workers race for the same job; each round exactly one of them
//! runs it while the others poll or give up.

use std::sync::Arc;
use std::time::Duration;

use lease_lock::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("lease_lock_core=debug")),
        )
        .init();

    let store = Arc::new(MemoryLeaseStore::new());
    let provider = LeaseLockProvider::from_arc(store.clone()).with_options(
        LockOptions::new()
            .expiry(Duration::from_secs(2))
            .polling(Duration::from_millis(50))
            .max_attempts(Some(3)),
    )?;

    let mut workers = Vec::new();
    for worker in 0..4 {
        let provider = provider.clone();
        workers.push(tokio::spawn(async move {
            let lock = provider.create_lock("job-42");
            lock.run_exclusive(|| async move {
                println!("worker {worker} is running job-42");
                tokio::time::sleep(Duration::from_millis(300)).await;
                Ok::<_, LockError>(worker)
            })
            .await
        }));
    }

    for worker in workers {
        match worker.await?? {
            Execution::Ran(result) => println!("job-42 ran on worker {}", result?),
            Execution::Skipped => println!("a worker gave up waiting for job-42"),
        }
    }

    // Tokens are checked on release: a stale token cannot free the lease.
    let (token, acquired) = provider.try_acquire_raw("manual", Duration::from_secs(1)).await?;
    println!("manual acquire: {acquired}");
    println!("release with wrong token: {}", provider.release_raw("manual", "stale", false, None).await?);
    println!("release with our token: {}", provider.release_raw("manual", token.as_str(), false, None).await?);
    println!("store operations performed: {}", store.operations());

    Ok(())
}
