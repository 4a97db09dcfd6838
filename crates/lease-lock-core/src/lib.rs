//! Core protocol and traits for store-backed lease locks.
//!
//! A lease is a key in a shared store whose value is the ownership token of
//! the attempt that created it. Acquisition is a conditional
//! set-if-absent with a time-to-live; release is an ownership-checked delete
//! (or TTL shortening) executed atomically by the store.

pub mod error;
pub mod key;
pub mod lock;
pub mod memory;
pub mod options;
pub mod prelude;
pub mod protocol;
pub mod provider;
pub mod retry;
pub mod session;
pub mod store;
pub mod timeout;
pub mod token;
pub mod traits;

pub use error::{LockError, LockResult};
pub use prelude::*;
