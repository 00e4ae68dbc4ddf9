//! Shared code reader cache
//!
//! Caches translation-unit text so a file included from several sources is
//! read from disk once. The cache has no per-entry invalidation mechanism;
//! an indexing run flushes it wholesale before parsing so re-parsing a path
//! never returns stale content.

use crate::io::file_system::FileSystemTrait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::trace;

/// Cache of file contents keyed by absolute path
///
/// Uses the manager-owned filesystem pattern: the cache owns the filesystem
/// instance used to fault entries in. Contents are shared as `Arc<str>` so
/// callers can hold a buffer across the parse of a single unit without
/// pinning the cache lock.
#[derive(Debug)]
pub struct ReaderCache<F: FileSystemTrait> {
    entries: Mutex<HashMap<PathBuf, Arc<str>>>,
    filesystem: F,
}

impl<F: FileSystemTrait> ReaderCache<F> {
    /// Create an empty cache backed by the given filesystem
    pub fn new(filesystem: F) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            filesystem,
        }
    }

    /// Get the contents of a file, reading it on first access
    pub fn get(&self, path: &Path) -> Result<Arc<str>, std::io::Error> {
        {
            let entries = self.entries.lock().unwrap();
            if let Some(content) = entries.get(path) {
                trace!("Reader cache hit: {:?}", path);
                return Ok(Arc::clone(content));
            }
        }

        let content: Arc<str> = Arc::from(self.filesystem.read_to_string(path)?);
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.entry(path.to_path_buf()).or_insert(content);
        Ok(Arc::clone(entry))
    }

    /// Drop every cached entry
    ///
    /// There is no way to evict single dirty entries, so runs flush the
    /// whole cache up front.
    pub fn flush(&self) {
        let mut entries = self.entries.lock().unwrap();
        trace!("Flushing reader cache ({} entries)", entries.len());
        entries.clear();
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
