//! Writable index handle
//!
//! One handle per indexing task, wrapping the persistent store shared
//! across the whole project. Access is mediated through scoped lock
//! acquisition: the parse phase holds a read-lock scope, which admits
//! concurrent readers and serializes against other writers, while per-file
//! commits remain individually atomic sub-operations at the storage layer
//! ("many readers + one appender", not a global mutex).

use crate::index::location::IndexFileLocation;
use crate::index::record::FileRecord;
use crate::index::storage::{IndexError, IndexStorage};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};
use tracing::trace;

/// Cache hit/miss totals since the last reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Hit ratio in [0, 1]; zero when nothing was looked up
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}

#[derive(Default)]
struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
}

struct Inner {
    storage: Arc<dyn IndexStorage>,
    /// Reader/writer discipline for the store as a whole
    lock: Arc<RwLock<()>>,
    /// Record cache fronting the storage backend
    cache: Mutex<HashMap<IndexFileLocation, Arc<FileRecord>>>,
    counters: CacheCounters,
    /// Commit generation, monotonically increasing per store handle chain
    generation: AtomicU64,
}

/// Scoped read lock over the index
///
/// Held across the parse-and-commit loop; dropping it on any exit path
/// (success, cancellation, error) releases the lock.
pub type ReadLockGuard = OwnedRwLockReadGuard<()>;

/// Scoped write lock over the index
pub type WriteLockGuard = OwnedRwLockWriteGuard<()>;

/// Handle to the project's writable index
#[derive(Clone)]
pub struct WritableIndex {
    inner: Arc<Inner>,
}

impl WritableIndex {
    /// Wrap a storage backend in a writable handle
    pub fn new(storage: Arc<dyn IndexStorage>) -> Self {
        Self {
            inner: Arc::new(Inner {
                storage,
                lock: Arc::new(RwLock::new(())),
                cache: Mutex::new(HashMap::new()),
                counters: CacheCounters::default(),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Zero the hit/miss instrumentation so end-of-run statistics reflect
    /// only the current pass
    pub fn reset_cache_counters(&self) {
        self.inner.counters.hits.store(0, Ordering::Relaxed);
        self.inner.counters.misses.store(0, Ordering::Relaxed);
    }

    /// Current cache statistics
    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.inner.counters.hits.load(Ordering::Relaxed),
            misses: self.inner.counters.misses.load(Ordering::Relaxed),
        }
    }

    /// Acquire the read lock; concurrent readers are admitted, writers wait
    pub async fn read_lock(&self) -> ReadLockGuard {
        Arc::clone(&self.inner.lock).read_owned().await
    }

    /// Acquire the write lock; exclusive against readers and writers
    pub async fn write_lock(&self) -> WriteLockGuard {
        Arc::clone(&self.inner.lock).write_owned().await
    }

    /// Look up a file record, safe to call while holding a read lock
    pub async fn get_file(
        &self,
        location: &IndexFileLocation,
    ) -> Result<Option<Arc<FileRecord>>, IndexError> {
        {
            let cache = self.inner.cache.lock().unwrap();
            if let Some(record) = cache.get(location) {
                self.inner.counters.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Some(Arc::clone(record)));
            }
        }
        self.inner.counters.misses.fetch_add(1, Ordering::Relaxed);

        match self.inner.storage.get(location).await? {
            Some(record) => {
                let record = Arc::new(record);
                let mut cache = self.inner.cache.lock().unwrap();
                let entry = cache
                    .entry(location.clone())
                    .or_insert_with(|| Arc::clone(&record));
                Ok(Some(Arc::clone(entry)))
            }
            None => Ok(None),
        }
    }

    /// Atomically commit a freshly parsed file's record
    ///
    /// Callable while the committing task holds the read lock: atomicity of
    /// the replace is the storage backend's obligation, so commits do not
    /// need (and must not take) the write lock. Old records stay visible to
    /// concurrent readers until the replace lands.
    pub async fn commit_file(&self, mut record: FileRecord) -> Result<(), IndexError> {
        record.generation = self.inner.generation.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(
            "Committing {} (generation {})",
            record.location, record.generation
        );

        self.inner.storage.put(record.clone()).await?;
        let mut cache = self.inner.cache.lock().unwrap();
        cache.insert(record.location.clone(), Arc::new(record));
        Ok(())
    }

    /// Atomically delete a file's record under a write-lock scope
    ///
    /// Returns whether a record existed.
    pub async fn remove_file(&self, location: &IndexFileLocation) -> Result<bool, IndexError> {
        let _guard = self.write_lock().await;
        let existed = self.inner.storage.remove(location).await?;
        self.inner.cache.lock().unwrap().remove(location);
        trace!("Removed {} (existed: {})", location, existed);
        Ok(existed)
    }

    /// All locations known to the store
    pub async fn known_locations(&self) -> Result<Vec<IndexFileLocation>, IndexError> {
        self.inner.storage.locations().await
    }
}
