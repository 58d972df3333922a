//! Pool locking for concurrent training rounds.

mod pool_lock;

pub use pool_lock::{LockInfo, PoolLock, cleanup_all_locks, register_lock, unregister_lock};
