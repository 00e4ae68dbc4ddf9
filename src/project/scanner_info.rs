//! Resolved build settings for parsing a translation unit
//!
//! Scanner info is the slice of a project's build configuration the parser
//! needs: include search paths and macro definitions. Providers resolve it
//! per file; the indexer treats the result as opaque input.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Include paths and macro definitions resolved for one translation unit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScannerInfo {
    /// Include search paths, in lookup order
    pub include_paths: Vec<PathBuf>,
    /// Macro definitions as (name, replacement) pairs
    pub defined_macros: Vec<(String, String)>,
}

impl ScannerInfo {
    /// True if neither include paths nor macros are configured
    pub fn is_empty(&self) -> bool {
        self.include_paths.is_empty() && self.defined_macros.is_empty()
    }
}

/// Source of per-file scanner info
///
/// Implemented by build-system collaborators (compilation database, fixed
/// project settings). The indexer only asks two questions: the settings for
/// a specific file, and whether the project has any settings at all (used
/// to decide whether indexing is worth attempting).
pub trait ScannerInfoProvider: Send + Sync {
    /// Resolve scanner info for the given file
    ///
    /// Files unknown to the provider get the project-wide defaults; a file
    /// missing from a compilation database is still parseable with whatever
    /// shared include paths exist.
    fn scanner_info(&self, path: &Path) -> ScannerInfo;

    /// Whether any scanner information is configured for this project
    fn has_scanner_info(&self) -> bool;
}

/// Provider with one fixed set of settings for every file
///
/// Used for bare projects without a compilation database and throughout the
/// test suite.
#[derive(Debug, Clone, Default)]
pub struct FixedScannerInfoProvider {
    info: ScannerInfo,
}

impl FixedScannerInfoProvider {
    pub fn new(include_paths: Vec<PathBuf>, defined_macros: Vec<(String, String)>) -> Self {
        Self {
            info: ScannerInfo {
                include_paths,
                defined_macros,
            },
        }
    }

    /// Convenience constructor with include paths only
    pub fn with_include_paths(include_paths: Vec<PathBuf>) -> Self {
        Self::new(include_paths, Vec::new())
    }
}

impl ScannerInfoProvider for FixedScannerInfoProvider {
    fn scanner_info(&self, _path: &Path) -> ScannerInfo {
        self.info.clone()
    }

    fn has_scanner_info(&self) -> bool {
        !self.info.is_empty()
    }
}
