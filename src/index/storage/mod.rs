//! Index storage abstraction and implementations
//!
//! Storage backends persist file records keyed by location and must provide
//! point lookup, atomic per-file replace and atomic per-file delete. A
//! storage fault is unrecoverable for the running task; the backend's only
//! obligation on failure is that committed records are never left
//! half-written.

pub mod filesystem;
#[cfg(test)]
pub mod memory;

use crate::index::location::IndexFileLocation;
use crate::index::record::FileRecord;
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by index storage operations
///
/// These abort the indexing run; per-file parse failures are a different,
/// recoverable category handled in the task loop.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Index directory could not be created: {path}")]
    DirectoryCreation { path: PathBuf },

    #[error("Index record corrupted: {path} - {reason}")]
    CorruptedRecord { path: PathBuf, reason: String },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage fault: {0}")]
    Fault(String),
}

impl IndexError {
    /// Create a corrupted record error
    pub fn corrupted(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CorruptedRecord {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Trait for index storage backends
///
/// Replace and delete are individually atomic: a concurrent reader sees
/// either the old complete record or the new complete record, never a
/// partial one.
#[async_trait]
pub trait IndexStorage: Send + Sync {
    /// Point lookup of a file record by location
    async fn get(&self, location: &IndexFileLocation) -> Result<Option<FileRecord>, IndexError>;

    /// Atomically replace (or create) the record for its location
    async fn put(&self, record: FileRecord) -> Result<(), IndexError>;

    /// Atomically delete the record for a location
    ///
    /// Returns whether a record existed.
    async fn remove(&self, location: &IndexFileLocation) -> Result<bool, IndexError>;

    /// All locations with a stored record
    async fn locations(&self) -> Result<Vec<IndexFileLocation>, IndexError>;
}
