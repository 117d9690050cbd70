//! Cache Store Module
//!
//! Durable result store: an in-memory index with LRU tracking and TTL
//! expiration, backed by one JSON file per fingerprint under a directory
//! the store exclusively owns. Entries survive process restarts.
//!
//! Commits are atomic: write to a temp file, fsync, then rename over the
//! final path. A `put` that returned Ok is recoverable after an unclean
//! shutdown.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheStats, LruTracker};
use crate::error::{CalcError, Result};

// == Cache Store ==
/// File-backed cache of evaluation outcomes keyed by request fingerprint.
#[derive(Debug)]
pub struct CacheStore {
    /// Directory holding one `<fingerprint>.json` file per entry
    dir: PathBuf,
    /// In-memory index of the directory contents
    entries: HashMap<String, CacheEntry>,
    /// LRU access tracker
    lru: LruTracker,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_entries: usize,
}

impl CacheStore {
    // == Open ==
    /// Opens a store rooted at `dir`, creating the directory if needed and
    /// rebuilding the index from the files already present.
    ///
    /// Entries that are expired, unreadable or corrupt are deleted during
    /// the scan. If the directory holds more than `max_entries` valid
    /// entries, the excess is evicted immediately.
    pub fn open(dir: impl Into<PathBuf>, max_entries: usize) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| storage_error("create cache directory", &dir, e))?;

        let mut entries = HashMap::new();
        let mut lru = LruTracker::new();

        let listing =
            fs::read_dir(&dir).map_err(|e| storage_error("read cache directory", &dir, e))?;
        for dirent in listing {
            let path = match dirent {
                Ok(d) => d.path(),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            match path.extension().and_then(|e| e.to_str()) {
                Some("json") => {}
                Some("tmp") => {
                    // leftover from an interrupted commit
                    let _ = fs::remove_file(&path);
                    continue;
                }
                _ => continue,
            }
            let fingerprint = match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => stem.to_string(),
                None => continue,
            };
            match read_entry(&path) {
                Some(entry) if !entry.is_expired() => {
                    lru.touch(&fingerprint);
                    entries.insert(fingerprint, entry);
                }
                _ => {
                    // expired or corrupt, drop the file
                    let _ = fs::remove_file(&path);
                }
            }
        }

        let mut store = Self {
            dir,
            entries,
            lru,
            stats: CacheStats::new(),
            max_entries,
        };

        while store.entries.len() > store.max_entries && store.evict_one() {}
        store.stats.set_total_entries(store.entries.len());
        debug!(entries = store.entries.len(), dir = %store.dir.display(), "cache store opened");

        Ok(store)
    }

    // == Get ==
    /// Looks up an entry by fingerprint.
    ///
    /// Returns None on absence or expiry; an expired entry is removed
    /// (index and file) as a side effect. Hits refresh the LRU order.
    pub fn get(&mut self, fingerprint: &str) -> Option<CacheEntry> {
        if let Some(entry) = self.entries.get(fingerprint) {
            if entry.is_expired() {
                self.discard(fingerprint);
                self.stats.record_miss();
                return None;
            }

            let entry = entry.clone();
            self.stats.record_hit();
            self.lru.touch(fingerprint);
            Some(entry)
        } else {
            self.stats.record_miss();
            None
        }
    }

    // == Put ==
    /// Stores an entry under a fingerprint, committing it durably before
    /// updating the index. At capacity the least recently used entry is
    /// evicted first.
    ///
    /// Concurrent writers for the same fingerprint are last-writer-wins at
    /// the file layer; correct writers always carry the same outcome, so
    /// the race is benign.
    pub fn put(&mut self, fingerprint: &str, entry: CacheEntry) -> Result<()> {
        let is_overwrite = self.entries.contains_key(fingerprint);
        if !is_overwrite && self.entries.len() >= self.max_entries {
            self.evict_one();
        }

        self.commit(fingerprint, &entry)?;

        self.entries.insert(fingerprint.to_string(), entry);
        self.lru.touch(fingerprint);
        self.stats.set_total_entries(self.entries.len());
        Ok(())
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Counts an evaluator invocation. Called by the coordinator when a
    /// resolve actually runs the evaluator.
    pub fn record_evaluation(&mut self) {
        self.stats.record_evaluation();
    }

    // == Cleanup Expired ==
    /// Removes all expired entries (index and files).
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(fingerprint, _)| fingerprint.clone())
            .collect();

        let count = expired.len();
        for fingerprint in expired {
            self.discard(&fingerprint);
        }
        count
    }

    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Internals ==

    fn entry_path(&self, fingerprint: &str) -> PathBuf {
        self.dir.join(format!("{}.json", fingerprint))
    }

    /// Durably writes an entry file: temp file, fsync, atomic rename.
    fn commit(&self, fingerprint: &str, entry: &CacheEntry) -> Result<()> {
        let final_path = self.entry_path(fingerprint);
        let tmp_path = self.dir.join(format!("{}.json.tmp", fingerprint));

        let bytes = serde_json::to_vec(entry)
            .map_err(|e| CalcError::Storage(format!("serialize cache entry: {}", e)))?;

        let mut file = fs::File::create(&tmp_path)
            .map_err(|e| storage_error("create temp file", &tmp_path, e))?;
        file.write_all(&bytes)
            .map_err(|e| storage_error("write temp file", &tmp_path, e))?;
        file.sync_all()
            .map_err(|e| storage_error("sync temp file", &tmp_path, e))?;
        drop(file);

        fs::rename(&tmp_path, &final_path)
            .map_err(|e| storage_error("rename into place", &final_path, e))
    }

    /// Drops an entry from the index, the LRU order and the disk.
    fn discard(&mut self, fingerprint: &str) {
        self.entries.remove(fingerprint);
        self.lru.remove(fingerprint);
        let path = self.entry_path(fingerprint);
        if let Err(e) = fs::remove_file(&path) {
            debug!(path = %path.display(), error = %e, "entry file already gone");
        }
        self.stats.set_total_entries(self.entries.len());
    }

    /// Evicts the least recently used entry. Returns false when there is
    /// nothing left to evict.
    fn evict_one(&mut self) -> bool {
        match self.lru.evict_oldest() {
            Some(evicted) => {
                self.entries.remove(&evicted);
                let _ = fs::remove_file(self.entry_path(&evicted));
                self.stats.record_eviction();
                self.stats.set_total_entries(self.entries.len());
                true
            }
            None => false,
        }
    }
}

fn read_entry(path: &Path) -> Option<CacheEntry> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read cache file");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(entry) => Some(entry),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupt cache file");
            None
        }
    }
}

fn storage_error(action: &str, path: &Path, err: std::io::Error) -> CalcError {
    CalcError::Storage(format!("{} {}: {}", action, path.display(), err))
}
