//! Convenience prelude for lease lock types.

pub use crate::error::{LockError, LockResult};
pub use crate::key::LockKey;
pub use crate::lock::{Execution, LeaseLock};
pub use crate::memory::MemoryLeaseStore;
pub use crate::options::{LockOptions, ReleaseMode};
pub use crate::provider::LeaseLockProvider;
pub use crate::retry::RetryPolicy;
pub use crate::session::{LeaseGuard, LockSession};
pub use crate::store::LeaseStore;
pub use crate::token::LockToken;
pub use crate::traits::{DistributedLock, LockHandle, LockProvider, LockProviderExt};
