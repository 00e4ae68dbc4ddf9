//! Include directive resolution
//!
//! Maps an `#include` directive to an on-disk header path using the
//! including file's directory and the scanner info's include search paths,
//! following the usual preprocessor lookup order.

use crate::io::file_system::FileSystemTrait;
use crate::parser::ast::IncludeDirective;
use crate::project::ScannerInfo;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Resolve an include directive to a header path
///
/// Quoted includes are looked up in the including file's directory first,
/// then in the include paths; angle-bracket includes skip the local
/// directory. Returns `None` when the header cannot be found, which the
/// indexer treats as an unresolved include (logged, not fatal).
pub fn resolve_include<F: FileSystemTrait>(
    directive: &IncludeDirective,
    including_file: &Path,
    scanner_info: &ScannerInfo,
    filesystem: &F,
) -> Option<PathBuf> {
    if !directive.angle_bracket
        && let Some(parent) = including_file.parent()
    {
        let candidate = parent.join(&directive.name);
        if filesystem.exists(&candidate) {
            trace!("Resolved \"{}\" locally to {:?}", directive.name, candidate);
            return Some(candidate);
        }
    }

    for include_path in &scanner_info.include_paths {
        let candidate = include_path.join(&directive.name);
        if filesystem.exists(&candidate) {
            trace!(
                "Resolved {} via include path to {:?}",
                directive.name, candidate
            );
            return Some(candidate);
        }
    }

    None
}
