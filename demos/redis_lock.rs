//! Example: Using Redis lease locks
//!
//! Run with: `cargo run --example redis_lock`
//!
//! Requires a Redis server. Set REDIS_URL environment variable
//! or modify the URL below.

use std::time::Duration;

use lease_lock::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Get Redis URL from environment or use default
    let redis_url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

    println!("Connecting to Redis...");
    let provider = RedisLockProvider::builder()
        .url(&redis_url)
        .expiry(Duration::from_secs(10))
        .build()
        .await?;

    // Create a lock by name
    let lock = provider.create_lock("example-resource");
    println!("Created lock: {}", lock.name());

    // Acquire the lock with a timeout
    println!("Acquiring lock with 5 second timeout...");
    let handle = lock.acquire(Some(Duration::from_secs(5))).await?;
    println!("Lock acquired with token {}", handle.token());

    // The lease must outlive the work; nothing extends it
    println!("Doing work...");
    tokio::time::sleep(Duration::from_secs(2)).await;

    if handle.release().await? {
        println!("Lock released");
    } else {
        println!("Lease expired before release; another owner may have run");
    }

    // A delayed release keeps the key for a short grace period, so a job
    // triggered twice in quick succession only runs once.
    let options = LockOptions::new()
        .expiry(Duration::from_secs(30))
        .delayed_release(Duration::from_secs(3));
    let nightly = provider.lock_with("nightly-report", options)?;

    for run in 1..=2 {
        match nightly.run_exclusive(|| async { Ok::<_, LockError>("report built") }).await? {
            Execution::Ran(result) => println!("run {run}: {result:?}"),
            Execution::Skipped => println!("run {run}: skipped, lease still in its grace period"),
        }
    }

    Ok(())
}
