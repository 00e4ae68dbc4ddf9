//! Change set separation and timestamp filtering
//!
//! Merges the added/changed/removed inputs of a run into disjoint work
//! lists: sources to parse, headers to parse as dependencies, records to
//! purge. With timestamp checking enabled, units whose stored fingerprint
//! still matches the file on disk are dropped before any other
//! classification, so an up-to-date header never reaches the headers list.

use crate::index::location::LocationResolver;
use crate::index::record::{Fingerprint, hash_contents};
use crate::index::storage::IndexError;
use crate::index::writable::WritableIndex;
use crate::io::file_system::FileSystemTrait;
use crate::project::TranslationUnit;
use tracing::{debug, trace};

/// Disjoint work lists ready for the removal and parse phases
#[derive(Debug)]
pub struct ChangeSet {
    /// Compilable units, parsed as top-level translation units
    pub sources: Vec<TranslationUnit>,
    /// Explicitly requested headers, parsed only as dependencies
    pub headers: Vec<TranslationUnit>,
    /// Units whose index records must be purged
    pub removed: Vec<TranslationUnit>,
    /// Units dropped because their fingerprint still matches
    pub filtered_up_to_date: usize,
}

/// Builder owning the raw added/changed/removed inputs
pub struct ChangeSetBuilder {
    changed: Vec<TranslationUnit>,
    removed: Vec<TranslationUnit>,
}

impl ChangeSetBuilder {
    /// Merge added and changed into one work list; removals stay separate
    pub fn new(
        added: Vec<TranslationUnit>,
        changed: Vec<TranslationUnit>,
        removed: Vec<TranslationUnit>,
    ) -> Self {
        let mut merged = added;
        merged.extend(changed);
        Self {
            changed: merged,
            removed,
        }
    }

    /// Initial work estimate: everything changed plus everything removed
    pub fn initial_total(&self) -> usize {
        self.changed.len() + self.removed.len()
    }

    /// Run the filtering pass and classify the remaining units
    pub async fn separate<F: FileSystemTrait>(
        self,
        check_timestamps: bool,
        index: &WritableIndex,
        resolver: &mut LocationResolver,
        filesystem: &F,
    ) -> Result<ChangeSet, IndexError> {
        let mut sources = Vec::new();
        let mut headers = Vec::new();
        let mut filtered = 0usize;

        for unit in self.changed {
            if check_timestamps {
                let location = resolver.resolve(unit.path());
                let stored = index.get_file(&location).await?;
                if let Some(record) = stored
                    && !is_outdated(&record.fingerprint, &unit, filesystem)
                {
                    trace!("Up to date, skipping: {:?}", unit.path());
                    filtered += 1;
                    continue;
                }
            }
            if unit.is_source_unit() {
                sources.push(unit);
            } else {
                headers.push(unit);
            }
        }

        debug!(
            "Separated change set: {} sources, {} headers, {} removed, {} up to date",
            sources.len(),
            headers.len(),
            self.removed.len(),
            filtered
        );

        Ok(ChangeSet {
            sources,
            headers,
            removed: self.removed,
            filtered_up_to_date: filtered,
        })
    }
}

/// Whether a stored fingerprint is outdated relative to the file on disk
///
/// Matching mtime and size short-circuits without reading the file; a file
/// that cannot be stat'ed is treated as outdated so the parse phase
/// surfaces the failure per file instead of silently keeping a stale
/// record.
fn is_outdated<F: FileSystemTrait>(
    stored: &Fingerprint,
    unit: &TranslationUnit,
    filesystem: &F,
) -> bool {
    let Ok(metadata) = filesystem.metadata(unit.path()) else {
        return true;
    };
    if stored.mtime_ms == metadata.modified_millis() && stored.size == metadata.size {
        return false;
    }
    match filesystem.read_to_string(unit.path()) {
        Ok(contents) => stored.content_hash != hash_contents(contents.as_str()),
        Err(_) => true,
    }
}
