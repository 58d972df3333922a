//! Single-writer lock over a shared hard-negative pool directory.
//!
//! Concurrent training rounds for different wake phrases may share the
//! negative pool; only one of them may allocate filenames at a time.

use crate::constants::POOL_LOCK_FILE;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Lock file content for debugging.
#[derive(Debug, Serialize, Deserialize)]
pub struct LockInfo {
    /// Process ID that holds the lock.
    pub pid: u32,
    /// Hostname of the machine.
    pub hostname: String,
    /// When the lock was acquired.
    pub started: DateTime<Utc>,
    /// Pool directory being written.
    pub pool: PathBuf,
}

/// RAII guard for a pool lock.
pub struct PoolLock {
    lock_path: PathBuf,
}

impl PoolLock {
    /// Attempt to acquire the write lock for a pool directory.
    pub fn acquire(pool_dir: &Path) -> Result<Self> {
        let lock_path = Self::lock_path_for(pool_dir);

        // Exclusive creation is the claim
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path);

        match file {
            Ok(mut f) => {
                let info = LockInfo {
                    pid: std::process::id(),
                    hostname: hostname::get().map_or_else(
                        |_| "unknown".to_string(),
                        |h| h.to_string_lossy().into_owned(),
                    ),
                    started: Utc::now(),
                    pool: pool_dir.to_path_buf(),
                };

                let json = serde_json::to_string_pretty(&info).unwrap_or_else(|_| "{}".to_string());
                let _ = f.write_all(json.as_bytes());

                // Register for cleanup on signal
                register_lock(&lock_path);

                Ok(Self { lock_path })
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(Error::PoolLocked { path: lock_path })
            }
            Err(e) => Err(Error::LockCreate {
                path: lock_path,
                source: e,
            }),
        }
    }

    /// Get the lock file path for a pool directory.
    pub fn lock_path_for(pool_dir: &Path) -> PathBuf {
        pool_dir.join(POOL_LOCK_FILE)
    }

    /// Check if a pool is locked.
    pub fn is_locked(pool_dir: &Path) -> bool {
        Self::lock_path_for(pool_dir).exists()
    }

    /// Check if a pool lock is stale (older than `max_age`).
    pub fn is_stale(pool_dir: &Path, max_age: Duration) -> bool {
        let lock_path = Self::lock_path_for(pool_dir);

        if let Ok(metadata) = fs::metadata(&lock_path)
            && let Ok(modified) = metadata.modified()
        {
            return modified.elapsed().unwrap_or_default() > max_age;
        }
        false
    }

    /// Remove a stale lock left behind by a dead process.
    pub fn remove_stale(pool_dir: &Path) -> Result<()> {
        let lock_path = Self::lock_path_for(pool_dir);
        fs::remove_file(&lock_path).map_err(|e| Error::LockRemove {
            path: lock_path,
            source: e,
        })
    }
}

impl Drop for PoolLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
        unregister_lock(&self.lock_path);
    }
}

/// Global registry of active lock paths for cleanup on signal.
static ACTIVE_LOCKS: std::sync::LazyLock<std::sync::Mutex<Vec<PathBuf>>> =
    std::sync::LazyLock::new(|| std::sync::Mutex::new(Vec::new()));

/// Register a lock path for cleanup on signal.
pub fn register_lock(path: &Path) {
    if let Ok(mut locks) = ACTIVE_LOCKS.lock() {
        locks.push(path.to_path_buf());
    }
}

/// Unregister a lock path after normal cleanup.
pub fn unregister_lock(path: &Path) {
    if let Ok(mut locks) = ACTIVE_LOCKS.lock() {
        locks.retain(|p| p != path);
    }
}

/// Clean up all registered locks. Called on signal.
pub fn cleanup_all_locks() {
    if let Ok(locks) = ACTIVE_LOCKS.lock() {
        for lock_path in locks.iter() {
            let _ = fs::remove_file(lock_path);
        }
    }
}
