//! Compilation database backed scanner info
//!
//! Wraps a `compile_commands.json` file and resolves per-file scanner info
//! (include paths, macro definitions) from the recorded compiler arguments.

use crate::project::error::ProjectError;
use crate::project::scanner_info::{ScannerInfo, ScannerInfoProvider};
use json_compilation_db::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Parsed compilation database with per-file scanner info resolution
#[derive(Debug)]
pub struct CompilationDatabase {
    /// Path to the compile_commands.json file
    path: PathBuf,
    /// Scanner info per source file, pre-resolved from compiler arguments
    resolved: HashMap<PathBuf, ScannerInfo>,
}

impl CompilationDatabase {
    /// Load and parse the compilation database at the given path
    ///
    /// Fails if the file is missing, unreadable, invalid JSON, or empty.
    pub fn load(path: PathBuf) -> Result<Self, ProjectError> {
        if !path.exists() {
            return Err(ProjectError::CompilationDatabaseNotFound {
                path: path.to_string_lossy().to_string(),
            });
        }

        let file = std::fs::File::open(&path).map_err(|e| {
            ProjectError::CompilationDatabaseNotReadable {
                error: e.to_string(),
            }
        })?;
        let reader = std::io::BufReader::new(file);
        let entries: Vec<Entry> = serde_json::from_reader(reader).map_err(|e| {
            ProjectError::CompilationDatabaseInvalid {
                error: e.to_string(),
            }
        })?;

        if entries.is_empty() {
            return Err(ProjectError::CompilationDatabaseEmpty);
        }

        let mut resolved = HashMap::new();
        for entry in &entries {
            let file = if entry.file.is_absolute() {
                entry.file.clone()
            } else {
                entry.directory.join(&entry.file)
            };
            let info = scanner_info_from_arguments(&entry.directory, &entry.arguments);
            trace!(
                "Resolved scanner info for {:?}: {} include paths, {} macros",
                file,
                info.include_paths.len(),
                info.defined_macros.len()
            );
            resolved.insert(file, info);
        }

        debug!(
            "Loaded compilation database {:?} with {} entries",
            path,
            resolved.len()
        );
        Ok(Self { path, resolved })
    }

    /// Path to the underlying compile_commands.json
    #[allow(dead_code)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of resolved entries
    pub fn entry_count(&self) -> usize {
        self.resolved.len()
    }
}

impl ScannerInfoProvider for CompilationDatabase {
    fn scanner_info(&self, path: &Path) -> ScannerInfo {
        self.resolved.get(path).cloned().unwrap_or_default()
    }

    fn has_scanner_info(&self) -> bool {
        self.resolved.values().any(|info| !info.is_empty())
    }
}

/// Extract include paths and macro definitions from compiler arguments
///
/// Handles `-I`, `-isystem` and `-D` in both attached (`-Ifoo`) and split
/// (`-I foo`) spellings. Relative include paths are resolved against the
/// entry's working directory.
fn scanner_info_from_arguments(directory: &Path, arguments: &[String]) -> ScannerInfo {
    let mut info = ScannerInfo::default();
    let mut args = arguments.iter().peekable();

    while let Some(arg) = args.next() {
        if let Some(rest) = arg.strip_prefix("-I") {
            let value = take_value(rest, &mut args);
            if let Some(path) = value {
                info.include_paths.push(absolutize(directory, &path));
            }
        } else if arg == "-isystem" {
            if let Some(path) = args.next() {
                info.include_paths.push(absolutize(directory, path));
            }
        } else if let Some(rest) = arg.strip_prefix("-D") {
            if let Some(value) = take_value(rest, &mut args) {
                let (name, replacement) = match value.split_once('=') {
                    Some((n, r)) => (n.to_string(), r.to_string()),
                    None => (value, "1".to_string()),
                };
                info.defined_macros.push((name, replacement));
            }
        }
    }

    info
}

fn take_value<'a, I: Iterator<Item = &'a String>>(
    attached: &str,
    args: &mut std::iter::Peekable<I>,
) -> Option<String> {
    if attached.is_empty() {
        args.next().map(|s| s.to_string())
    } else {
        Some(attached.to_string())
    }
}

fn absolutize(directory: &Path, value: &str) -> PathBuf {
    let path = Path::new(value);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        directory.join(path)
    }
}
