//! Filesystem implementation of index storage
//!
//! One JSON record file per location, named by the SHA-256 of the location
//! key. Replace goes through a temp file and rename so a crash or a
//! concurrent reader never observes a partially written record; delete is a
//! single unlink.

use super::{IndexError, IndexStorage};
use crate::index::location::IndexFileLocation;
use crate::index::record::{FileRecord, to_hex};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

const RECORD_EXTENSION: &str = "json";

/// Filesystem-backed index storage
///
/// The state directory holds exactly one store per project.
pub struct FilesystemStorage {
    /// Directory containing the record files
    state_dir: PathBuf,
}

impl FilesystemStorage {
    /// Open a store at the given directory, creating it if needed
    pub fn open(state_dir: PathBuf) -> Result<Self, IndexError> {
        std::fs::create_dir_all(&state_dir).map_err(|_| IndexError::DirectoryCreation {
            path: state_dir.clone(),
        })?;
        debug!("Opened index store at {:?}", state_dir);
        Ok(Self { state_dir })
    }

    /// Record file path for a location
    fn record_path(&self, location: &IndexFileLocation) -> PathBuf {
        let digest = Sha256::digest(location.as_str().as_bytes());
        self.state_dir
            .join(format!("{}.{}", to_hex(&digest[..16]), RECORD_EXTENSION))
    }

    fn read_record(path: &Path) -> Result<FileRecord, IndexError> {
        let bytes = std::fs::read(path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::PermissionDenied {
                IndexError::PermissionDenied {
                    path: path.to_path_buf(),
                }
            } else {
                IndexError::Io(err)
            }
        })?;
        serde_json::from_slice(&bytes).map_err(|e| IndexError::corrupted(path, e.to_string()))
    }
}

#[async_trait]
impl IndexStorage for FilesystemStorage {
    async fn get(&self, location: &IndexFileLocation) -> Result<Option<FileRecord>, IndexError> {
        let path = self.record_path(location);
        let result = tokio::task::spawn_blocking(move || {
            if !path.exists() {
                return Ok(None);
            }
            Self::read_record(&path).map(Some)
        })
        .await
        .map_err(|e| IndexError::Fault(e.to_string()))?;

        trace!(
            "Storage get {} -> {}",
            location,
            if matches!(result, Ok(Some(_))) { "hit" } else { "miss" }
        );
        result
    }

    async fn put(&self, record: FileRecord) -> Result<(), IndexError> {
        let path = self.record_path(&record.location);
        let tmp = path.with_extension("tmp");

        tokio::task::spawn_blocking(move || {
            let json = serde_json::to_vec(&record)
                .map_err(|e| IndexError::Serialization(e.to_string()))?;
            std::fs::write(&tmp, &json)?;
            // Rename makes the replace atomic within the state directory.
            std::fs::rename(&tmp, &path)?;
            trace!("Committed record for {} ({} bytes)", record.location, json.len());
            Ok(())
        })
        .await
        .map_err(|e| IndexError::Fault(e.to_string()))?
    }

    async fn remove(&self, location: &IndexFileLocation) -> Result<bool, IndexError> {
        let path = self.record_path(location);
        tokio::task::spawn_blocking(move || match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(IndexError::Io(err)),
        })
        .await
        .map_err(|e| IndexError::Fault(e.to_string()))?
    }

    async fn locations(&self) -> Result<Vec<IndexFileLocation>, IndexError> {
        let state_dir = self.state_dir.clone();
        tokio::task::spawn_blocking(move || {
            let mut locations = Vec::new();
            for entry in std::fs::read_dir(&state_dir)? {
                let path = entry?.path();
                if path.extension().and_then(|e| e.to_str()) == Some(RECORD_EXTENSION) {
                    let record = Self::read_record(&path)?;
                    locations.push(record.location);
                }
            }
            Ok(locations)
        })
        .await
        .map_err(|e| IndexError::Fault(e.to_string()))?
    }
}
