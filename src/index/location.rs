//! Index file locations and the memoizing resolver
//!
//! A location is the canonical, hashable identity of a unit of indexable
//! content and serves as the index's primary key. Resolution normalizes the
//! path so that logically identical spellings (`a/./b.h`, `a/../a/b.h`)
//! collapse to one key.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use tracing::trace;

/// Canonical identity of one indexable file
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexFileLocation(String);

impl IndexFileLocation {
    /// Build a location from an already-normalized path
    ///
    /// Callers should go through `LocationResolver::resolve`; this is for
    /// reconstructing keys from persisted records.
    pub fn from_normalized(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_path(&self) -> PathBuf {
        PathBuf::from(&self.0)
    }
}

impl std::fmt::Display for IndexFileLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lexically normalize a path: drop `.`, fold `..` into its parent
///
/// Normalization is lexical rather than symlink-resolving so that keys are
/// deterministic regardless of the machine the index is opened on.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() && !normalized.has_root() {
                    normalized.push(Component::ParentDir);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Memoizing path-to-location resolver
///
/// The first call for a given path spelling performs the (possibly
/// expensive) normalization; later calls return the cached key. The cache
/// is owned by one indexing task and discarded with it; paths are stable
/// for the duration of a run, so no invalidation is needed.
#[derive(Debug, Default)]
pub struct LocationResolver {
    cache: HashMap<String, IndexFileLocation>,
}

impl LocationResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a path to its canonical location key
    pub fn resolve(&mut self, path: &Path) -> IndexFileLocation {
        let spelling = path.to_string_lossy().into_owned();
        if let Some(location) = self.cache.get(&spelling) {
            return location.clone();
        }

        let location =
            IndexFileLocation(normalize(path).to_string_lossy().into_owned());
        trace!("Resolved {:?} -> {}", path, location);
        self.cache.insert(spelling, location.clone());
        location
    }

    /// Number of cached spellings
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}
