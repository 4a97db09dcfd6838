//! Store-backed mutual exclusion leases for Rust.
//!
//! A lease lock serializes a critical section across independent processes
//! that share nothing but a key-value store. Ownership is a random token
//! written with an atomic set-if-absent and a time-to-live; release deletes
//! the key (or shortens its TTL) only if the token still matches, in a single
//! atomic store operation. A crashed owner's lease simply expires.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use lease_lock::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = RedisLockProvider::builder()
//!         .url("redis://localhost:6379")
//!         .expiry(Duration::from_secs(5))
//!         .build()
//!         .await?;
//!
//!     let lock = provider.create_lock("nightly-report");
//!
//!     // Poll for up to two seconds
//!     let handle = lock.acquire(Some(Duration::from_secs(2))).await?;
//!
//!     // Critical section - we hold the lease
//!     println!("Doing critical work...");
//!
//!     if !handle.release().await? {
//!         eprintln!("lease expired before the work finished");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Running a critical section
//!
//! [`LeaseLock::run_exclusive`] wraps acquire, body and release; release is
//! attempted whatever the body returns.
//!
//! ```rust,no_run
//! use lease_lock::*;
//! use std::time::Duration;
//!
//! # async fn demo(provider: RedisLockProvider) -> LockResult<()> {
//! let options = LockOptions::new()
//!     .expiry(Duration::from_secs(10))
//!     .polling(Duration::from_millis(200))
//!     .max_attempts(Some(25));
//! let lock = provider.lock_with("invoice-sync", options)?;
//!
//! match lock.run_exclusive(|| async { Ok::<_, std::io::Error>(42) }).await? {
//!     Execution::Ran(result) => println!("ran: {result:?}"),
//!     Execution::Skipped => println!("someone else is running it"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Crate Organization
//!
//! This is a meta-crate that re-exports types from:
//! - `lease-lock-core`: protocol, traits, in-memory store
//! - `lease-lock-redis`: Redis store and provider (modules under [`redis`])

// Re-export core types and traits
pub use lease_lock_core::*;
// Module names shared with the redis crate resolve to the core modules
pub use lease_lock_core::{options, provider, store};

// Re-export redis backend; its modules stay reachable under `redis::`
pub use lease_lock_redis as redis;
pub use lease_lock_redis::*;
