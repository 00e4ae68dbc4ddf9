//! File system abstraction layer
//!
//! Provides trait-based abstractions for file system operations, enabling
//! dependency injection and deterministic tests through an in-memory
//! implementation.
#![allow(dead_code)]

use std::path::Path;
use std::time::SystemTime;

// ============================================================================
// File Metadata
// ============================================================================

/// Custom file metadata abstraction
///
/// Provides a simplified, testable alternative to std::fs::Metadata
/// with controllable modification times and file sizes.
#[derive(Debug, Clone, PartialEq)]
pub struct FileMetadata {
    /// Last modification time
    pub modified: SystemTime,
    /// File size in bytes
    pub size: u64,
}

impl FileMetadata {
    /// Create new file metadata
    pub fn new(modified: SystemTime, size: u64) -> Self {
        Self { modified, size }
    }

    /// Convert from standard library metadata
    pub fn from_std_metadata(metadata: &std::fs::Metadata) -> Result<Self, std::io::Error> {
        Ok(Self {
            modified: metadata.modified()?,
            size: metadata.len(),
        })
    }

    /// Modification time as milliseconds since the Unix epoch
    ///
    /// Pre-epoch timestamps clamp to zero; fingerprints only need a
    /// stable ordering, not signed time.
    pub fn modified_millis(&self) -> u64 {
        self.modified
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

// ============================================================================
// File System Trait
// ============================================================================

/// Trait for file system operations
///
/// Enables dependency injection and testing through in-memory implementations.
/// All operations return custom types for enhanced testability.
pub trait FileSystemTrait: Clone + Send + Sync {
    /// Check if a file exists
    fn exists(&self, path: &Path) -> bool;

    /// Read file contents as bytes
    fn read(&self, path: &Path) -> Result<Vec<u8>, std::io::Error>;

    /// Read file contents as a UTF-8 string
    ///
    /// Invalid UTF-8 sequences are replaced rather than rejected; source
    /// files with stray bytes should still be indexable.
    fn read_to_string(&self, path: &Path) -> Result<String, std::io::Error> {
        let bytes = self.read(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Get file metadata (modification time, size)
    fn metadata(&self, path: &Path) -> Result<FileMetadata, std::io::Error>;
}

// ============================================================================
// Real File System Implementation
// ============================================================================

/// Real file system implementation using std::fs
#[derive(Debug, Clone)]
pub struct RealFileSystem;

impl FileSystemTrait for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, std::io::Error> {
        std::fs::read(path)
    }

    fn metadata(&self, path: &Path) -> Result<FileMetadata, std::io::Error> {
        let metadata = std::fs::metadata(path)?;
        FileMetadata::from_std_metadata(&metadata)
    }
}

// ============================================================================
// Test File System Implementation
// ============================================================================

#[cfg(test)]
mod test_filesystem {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    /// In-memory filesystem state for testing scenarios
    type TestFileData = HashMap<PathBuf, (Vec<u8>, SystemTime)>;

    #[derive(Clone)]
    pub struct TestFileSystem {
        state: Arc<Mutex<TestFileData>>,
    }

    impl TestFileSystem {
        pub fn new() -> Self {
            Self {
                state: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        pub fn set_file_content<P: Into<PathBuf>>(
            &self,
            path: P,
            content: &str,
            modified: SystemTime,
        ) {
            let mut state = self.state.lock().unwrap();
            state.insert(path.into(), (content.as_bytes().to_vec(), modified));
        }

        pub fn remove_file<P: AsRef<Path>>(&self, path: P) {
            let mut state = self.state.lock().unwrap();
            state.remove(path.as_ref());
        }

        /// Bump a file's modification time without changing its content
        pub fn touch<P: AsRef<Path>>(&self, path: P, modified: SystemTime) {
            let mut state = self.state.lock().unwrap();
            if let Some(entry) = state.get_mut(path.as_ref()) {
                entry.1 = modified;
            }
        }
    }

    impl FileSystemTrait for TestFileSystem {
        fn exists(&self, path: &Path) -> bool {
            let state = self.state.lock().unwrap();
            state.contains_key(path)
        }

        fn read(&self, path: &Path) -> Result<Vec<u8>, std::io::Error> {
            let state = self.state.lock().unwrap();
            state
                .get(path)
                .map(|(content, _)| content.clone())
                .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "File not found"))
        }

        fn metadata(&self, path: &Path) -> Result<FileMetadata, std::io::Error> {
            let state = self.state.lock().unwrap();
            state
                .get(path)
                .map(|(content, modified)| FileMetadata {
                    modified: *modified,
                    size: content.len() as u64,
                })
                .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "File not found"))
        }
    }
}

#[cfg(test)]
pub use test_filesystem::TestFileSystem;

// ============================================================================
// Tests
// ============================================================================
