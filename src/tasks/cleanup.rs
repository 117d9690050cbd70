//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries from
//! the index and deletes their backing files.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Spawns a background task that periodically cleans up expired cache entries.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between cleanup runs. It acquires a write lock on the cache store to
/// remove expired entries. Expired entries are also dropped lazily on read,
/// so this sweep only bounds how long dead files linger on disk.
///
/// # Arguments
/// * `cache` - Shared reference to the cache store
/// * `cleanup_interval_secs` - Interval in seconds between cleanup runs
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_cleanup_task(
    cache: Arc<RwLock<CacheStore>>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            cleanup_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let mut cache_guard = cache.write().await;
                cache_guard.cleanup_expired()
            };

            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheEntry, CachedOutcome};
    use std::time::Duration;
    use tempfile::TempDir;

    fn value_entry(value: f64, ttl: Option<u64>) -> CacheEntry {
        CacheEntry::new(CachedOutcome::Value(value), ttl)
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(RwLock::new(CacheStore::open(dir.path(), 100).unwrap()));

        {
            let mut cache_guard = cache.write().await;
            cache_guard
                .put("expire_soon", value_entry(1.0, Some(1)))
                .unwrap();
        }

        let handle = spawn_cleanup_task(cache.clone(), 1);

        // Wait for the entry to expire and the sweep to run
        tokio::time::sleep(Duration::from_millis(2500)).await;

        {
            let cache_guard = cache.read().await;
            assert!(cache_guard.is_empty(), "Expired entry should have been cleaned up");
        }
        assert!(!dir.path().join("expire_soon.json").exists());

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(RwLock::new(CacheStore::open(dir.path(), 100).unwrap()));

        {
            let mut cache_guard = cache.write().await;
            cache_guard
                .put("long_lived", value_entry(2.0, Some(3600)))
                .unwrap();
        }

        let handle = spawn_cleanup_task(cache.clone(), 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;

        {
            let mut cache_guard = cache.write().await;
            let entry = cache_guard.get("long_lived");
            assert!(entry.is_some(), "Valid entry should not be removed");
        }

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(RwLock::new(CacheStore::open(dir.path(), 100).unwrap()));

        let handle = spawn_cleanup_task(cache, 1);

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
