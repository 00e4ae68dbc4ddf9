//! Translation unit model
//!
//! A translation unit is one source or header file as presented to the
//! parser. Sources are indexed as top-level units; headers are indexed only
//! as dependencies pulled in by sources.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Source file extensions treated as compilable units
const SOURCE_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "cxx", "c++", "m", "mm"];

/// Header file extensions
const HEADER_EXTENSIONS: &[&str] = &["h", "hh", "hpp", "hxx", "h++", "inl", "ipp"];

/// Kind of translation unit, derived from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitKind {
    Source,
    Header,
}

/// One source or header file known to the project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationUnit {
    path: PathBuf,
    kind: UnitKind,
}

impl TranslationUnit {
    /// Create a unit, classifying it by extension
    ///
    /// Extensionless or unrecognized files are treated as headers; that is
    /// what C++ standard-library headers look like on disk.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let kind = classify(&path);
        Self { path, kind }
    }

    /// Create a unit with an explicit kind, bypassing classification
    pub fn with_kind(path: impl Into<PathBuf>, kind: UnitKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    /// Whether this unit is a compilable source file
    pub fn is_source_unit(&self) -> bool {
        self.kind == UnitKind::Source
    }
}

fn classify(path: &Path) -> UnitKind {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some(ext) if SOURCE_EXTENSIONS.contains(&ext) => UnitKind::Source,
        _ => UnitKind::Header,
    }
}

/// Whether a path looks like an indexable C/C++ file at all
pub fn is_translation_unit(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => {
            let ext = ext.to_ascii_lowercase();
            SOURCE_EXTENSIONS.contains(&ext.as_str()) || HEADER_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}
