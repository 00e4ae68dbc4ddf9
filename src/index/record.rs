//! File records and content fingerprints
//!
//! A file record is the index's representation of one parsed file. Records
//! are replaced wholesale on re-parse and never mutated in place; a
//! concurrent reader keeps seeing the old record until the new one is
//! committed.

use crate::index::location::IndexFileLocation;
use crate::io::file_system::FileMetadata;
use crate::parser::{Declaration, MacroDefinition};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Content fingerprint used to decide whether a file needs re-indexing
///
/// Timestamp and size give the cheap fast path; the SHA-256 content hash
/// settles the case where the timestamp moved but the content did not
/// (checkout churn, touch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Modification time, milliseconds since the Unix epoch
    pub mtime_ms: u64,
    /// File size in bytes
    pub size: u64,
    /// Lowercase hex SHA-256 of the file contents
    pub content_hash: String,
}

impl Fingerprint {
    /// Fingerprint a file from its metadata and contents
    pub fn of(metadata: &FileMetadata, contents: &str) -> Self {
        Self {
            mtime_ms: metadata.modified_millis(),
            size: metadata.size,
            content_hash: hash_contents(contents),
        }
    }

    /// Whether a stored fingerprint is outdated relative to the current one
    ///
    /// Matching mtime and size means up to date without looking at the
    /// hash; otherwise the content hash decides.
    pub fn is_outdated(&self, current: &Fingerprint) -> bool {
        if self.mtime_ms == current.mtime_ms && self.size == current.size {
            return false;
        }
        self.content_hash != current.content_hash
    }
}

/// Lowercase hex SHA-256 of a string
pub fn hash_contents(contents: &str) -> String {
    let digest = Sha256::digest(contents.as_bytes());
    to_hex(&digest)
}

pub(crate) fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// One resolved `#include` reference stored with a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeRef {
    /// Header name as written in the directive
    pub name: String,
    /// Location the directive resolved to, if any
    pub resolved: Option<IndexFileLocation>,
    /// 1-based line of the directive
    pub line: u32,
}

/// Stored index entry for one location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Primary key
    pub location: IndexFileLocation,
    /// Fingerprint of the content this record was parsed from
    pub fingerprint: Fingerprint,
    /// Declarations and definitions found in the file
    pub declarations: Vec<Declaration>,
    /// Macro definitions found in the file
    pub macros: Vec<MacroDefinition>,
    /// Include references, with resolution results
    pub includes: Vec<IncludeRef>,
    /// Monotonic generation marker assigned at commit
    pub generation: u64,
    /// When this record was committed
    pub indexed_at: DateTime<Utc>,
}

impl FileRecord {
    /// Create an uncommitted record (generation assigned at commit time)
    pub fn new(
        location: IndexFileLocation,
        fingerprint: Fingerprint,
        declarations: Vec<Declaration>,
        macros: Vec<MacroDefinition>,
        includes: Vec<IncludeRef>,
    ) -> Self {
        Self {
            location,
            fingerprint,
            declarations,
            macros,
            includes,
            generation: 0,
            indexed_at: Utc::now(),
        }
    }
}
