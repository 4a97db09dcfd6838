//! Redis backend for lease locks.
//!
//! Leases are plain string keys: `SET key token NX PX ttl` acquires, and Lua
//! scripts perform the ownership-checked delete and TTL shortening.

pub mod options;
pub mod provider;
pub mod store;

pub use options::RedisStoreOptions;
pub use provider::{RedisLockProvider, RedisLockProviderBuilder};
pub use store::RedisLeaseStore;
