//! The indexing task: parse scheduling and the run state machine
//!
//! One task performs one incremental indexing run over a project:
//! `Init → Separating → Removing → Parsing → Done`, with `Cancelled`
//! reachable from the removing and parsing phases. The task is sequential
//! internally; concurrency exists only between this task and other
//! consumers of the shared store, mediated by the writable index's lock
//! discipline.

use crate::index::change_set::ChangeSetBuilder;
use crate::index::location::{IndexFileLocation, LocationResolver};
use crate::index::progress::{IndexProgress, ProgressSnapshot};
use crate::index::record::{FileRecord, Fingerprint, IncludeRef};
use crate::index::storage::IndexError;
use crate::index::writable::{CacheStats, WritableIndex};
use crate::io::file_system::FileSystemTrait;
use crate::io::reader_cache::ReaderCache;
use crate::parser::{ParseOptions, SourceParser, resolve_include};
use crate::project::{ScannerInfoProvider, TranslationUnit};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{Level, debug, warn};

use crate::log_timing;

/// Per-run parse state of one location
///
/// A location moves `unset → {Required|Missing} → Skip` exactly once per
/// run; re-entering `Required` after `Skip` within a run is illegal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingParse {
    /// Explicitly requested: a changed or added unit from the work lists
    Required,
    /// Discovered as a dependency, not yet indexed
    Missing,
    /// Satisfied in this run; guards against duplicate parses and include
    /// cycles. `committed` distinguishes a landed record from a per-file
    /// failure.
    Skip { committed: bool },
}

/// Terminal status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Complete,
    Cancelled,
}

/// Result of a finished (or cancelled) run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub progress: ProgressSnapshot,
    pub cache: CacheStats,
    pub elapsed: Duration,
}

/// How one unit's pass through the parse loop ended
enum UnitOutcome {
    Processed,
    Cancelled,
}

/// One incremental indexing run over a project
///
/// Work lists, the pending-parse map and the location cache are owned by
/// the task and discarded with it; nothing survives a run except what was
/// committed to the store.
pub struct IndexerTask<F: FileSystemTrait> {
    index: WritableIndex,
    parser: Arc<dyn SourceParser>,
    scanner_info: Arc<dyn ScannerInfoProvider>,
    reader_cache: Arc<ReaderCache<F>>,
    filesystem: F,
    builder: ChangeSetBuilder,
    check_timestamps: bool,
    options: ParseOptions,
    pending: HashMap<IndexFileLocation, PendingParse>,
    resolver: LocationResolver,
    progress: IndexProgress,
}

impl<F: FileSystemTrait> IndexerTask<F> {
    /// Create a task for the given added/changed/removed unit lists
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        index: WritableIndex,
        parser: Arc<dyn SourceParser>,
        scanner_info: Arc<dyn ScannerInfoProvider>,
        reader_cache: Arc<ReaderCache<F>>,
        filesystem: F,
        added: Vec<TranslationUnit>,
        changed: Vec<TranslationUnit>,
        removed: Vec<TranslationUnit>,
    ) -> Self {
        let builder = ChangeSetBuilder::new(added, changed, removed);
        let progress = IndexProgress::new();
        progress.update_info(0, 0, builder.initial_total() as i64);

        Self {
            index,
            parser,
            scanner_info,
            reader_cache,
            filesystem,
            builder,
            check_timestamps: false,
            options: ParseOptions::default(),
            pending: HashMap::new(),
            resolver: LocationResolver::new(),
            progress,
        }
    }

    /// Enable or disable fingerprint filtering for this run
    pub fn set_check_timestamps(&mut self, value: bool) {
        self.check_timestamps = value;
    }

    /// Override the parse options handed to the parser front end
    #[allow(dead_code)]
    pub fn set_parse_options(&mut self, options: ParseOptions) {
        self.options = options;
    }

    /// Shared progress handle, pollable while the run is in flight
    pub fn progress(&self) -> IndexProgress {
        self.progress.clone()
    }

    /// Execute the run state machine
    ///
    /// Returns `Ok` with a `Complete` or `Cancelled` outcome; storage
    /// faults abort the run and propagate as `Err`. Per-file parse
    /// failures are logged and skipped.
    pub async fn run(mut self, cancel: &CancellationToken) -> Result<RunOutcome, IndexError> {
        let start = Instant::now();

        // Init: the reader cache has no per-entry invalidation, so it is
        // flushed wholesale; counters restart so end-of-run statistics
        // cover only this pass.
        self.reader_cache.flush();
        self.index.reset_cache_counters();

        // Separating
        let builder = std::mem::replace(&mut self.builder, ChangeSetBuilder::new(vec![], vec![], vec![]));
        let change_set = builder
            .separate(
                self.check_timestamps,
                &self.index,
                &mut self.resolver,
                &self.filesystem,
            )
            .await?;
        self.progress
            .update_info(0, 0, -(change_set.filtered_up_to_date as i64));
        for unit in change_set.sources.iter().chain(change_set.headers.iter()) {
            let location = self.resolver.resolve(unit.path());
            let previous = self.pending.insert(location, PendingParse::Required);
            debug_assert!(
                !matches!(previous, Some(PendingParse::Skip { .. })),
                "unit registered after being satisfied in this run"
            );
        }
        self.progress
            .set_remaining(change_set.sources.len(), change_set.headers.len());

        // Removing
        for unit in &change_set.removed {
            if cancel.is_cancelled() {
                // Not-yet-removed entries are left untouched for a future
                // run.
                return Ok(self.finish(RunStatus::Cancelled, start));
            }
            let location = self.resolver.resolve(unit.path());
            self.index.remove_file(&location).await?;
            if unit.is_source_unit() {
                self.progress.update_info(1, 0, 0);
            } else {
                self.progress.update_info(0, 1, -1);
            }
        }

        // Parsing: the read lock spans the whole phase and is released on
        // every exit path when the guard leaves this block.
        let status = {
            let _read_guard = self.index.read_lock().await;
            self.parse_phase(change_set.sources, change_set.headers, cancel)
                .await
        }?;

        Ok(self.finish(status, start))
    }

    async fn parse_phase(
        &mut self,
        sources: Vec<TranslationUnit>,
        headers: Vec<TranslationUnit>,
        cancel: &CancellationToken,
    ) -> Result<RunStatus, IndexError> {
        for unit in sources {
            if cancel.is_cancelled() {
                return Ok(RunStatus::Cancelled);
            }
            if let UnitOutcome::Cancelled = self.parse_unit(unit.path(), true, cancel).await? {
                return Ok(RunStatus::Cancelled);
            }
        }
        for unit in headers {
            if cancel.is_cancelled() {
                return Ok(RunStatus::Cancelled);
            }
            if let UnitOutcome::Cancelled = self.parse_unit(unit.path(), false, cancel).await? {
                return Ok(RunStatus::Cancelled);
            }
        }
        Ok(RunStatus::Complete)
    }

    /// Parse one entry unit and every header it pulls in transitively
    ///
    /// Headers are processed in inclusion order, each at most once per run
    /// thanks to the tri-state guard; a unit is committed before its own
    /// includes are walked, which terminates include cycles.
    async fn parse_unit(
        &mut self,
        entry_path: &Path,
        top_level_source: bool,
        cancel: &CancellationToken,
    ) -> Result<UnitOutcome, IndexError> {
        let mut worklist: VecDeque<PathBuf> = VecDeque::new();
        worklist.push_back(entry_path.to_path_buf());
        let mut is_entry = true;

        while let Some(current) = worklist.pop_front() {
            if !is_entry && cancel.is_cancelled() {
                return Ok(UnitOutcome::Cancelled);
            }
            let location = self.resolver.resolve(&current);
            if !self.need_to_update(&location) {
                if is_entry {
                    self.entry_already_satisfied(&location, top_level_source);
                }
                is_entry = false;
                continue;
            }

            let parsed = self.build_ast(&current, cancel);
            let (ast, buffer, scanner) = match parsed {
                Ok(Some(result)) => result,
                Ok(None) => return Ok(UnitOutcome::Cancelled),
                Err(reason) => {
                    warn!("Skipping {:?}: {}", current, reason);
                    self.mark_skip(&location);
                    if is_entry {
                        self.entry_not_committed(top_level_source);
                    }
                    is_entry = false;
                    continue;
                }
            };

            let mut include_refs = Vec::with_capacity(ast.includes.len());
            let mut discovered = Vec::new();
            for directive in &ast.includes {
                let resolved_path =
                    resolve_include(directive, &current, &scanner, &self.filesystem);
                if resolved_path.is_none() {
                    debug!("Unresolved include {:?} in {:?}", directive.name, current);
                }
                include_refs.push(IncludeRef {
                    name: directive.name.clone(),
                    resolved: resolved_path.as_ref().map(|p| self.resolver.resolve(p)),
                    line: directive.line,
                });
                if let Some(path) = resolved_path {
                    discovered.push(path);
                }
            }

            let metadata = match self.filesystem.metadata(&current) {
                Ok(metadata) => metadata,
                Err(err) => {
                    warn!("Skipping {:?}: stat failed: {}", current, err);
                    self.mark_skip(&location);
                    if is_entry {
                        self.entry_not_committed(top_level_source);
                    }
                    is_entry = false;
                    continue;
                }
            };
            let fingerprint = Fingerprint::of(&metadata, &buffer);
            let record = FileRecord::new(
                location.clone(),
                fingerprint,
                ast.declarations,
                ast.macros,
                include_refs,
            );

            // Storage faults are not swallowed here; consistency cannot be
            // guaranteed past this point.
            self.index.commit_file(record).await?;
            let was_required = self.post_add_to_index(&location);

            if is_entry && top_level_source {
                self.progress.source_completed();
            } else if was_required {
                self.progress.update_info(0, 1, 0);
                self.progress.header_completed();
            } else {
                // Work discovered beyond the initial estimate.
                self.progress.update_info(0, 1, 1);
            }

            worklist.extend(discovered);
            is_entry = false;
        }

        Ok(UnitOutcome::Processed)
    }

    /// Read and parse one file; `Ok(None)` means cancellation was observed
    /// after the AST build and the unit must not be committed
    #[allow(clippy::type_complexity)]
    fn build_ast(
        &mut self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<Option<(crate::parser::Ast, Arc<str>, crate::project::ScannerInfo)>, String> {
        let buffer = self
            .reader_cache
            .get(path)
            .map_err(|e| format!("read failed: {e}"))?;
        let scanner = self.scanner_info.scanner_info(path);
        let ast = self
            .parser
            .parse(&buffer, &scanner, &self.options)
            .map_err(|e| format!("parse failed: {e}"))?;
        if cancel.is_cancelled() {
            return Ok(None);
        }
        Ok(Some((ast, buffer, scanner)))
    }

    /// Tri-state gate: does this location still need parsing in this run?
    ///
    /// An unknown location is registered as `Missing` and must be parsed;
    /// a `Skip` location was already satisfied.
    fn need_to_update(&mut self, location: &IndexFileLocation) -> bool {
        match self.pending.get(location) {
            Some(PendingParse::Skip { .. }) => false,
            Some(_) => true,
            None => {
                self.pending
                    .insert(location.clone(), PendingParse::Missing);
                true
            }
        }
    }

    /// Mark a committed location as satisfied; reports whether it was an
    /// explicitly requested unit
    fn post_add_to_index(&mut self, location: &IndexFileLocation) -> bool {
        let previous = self
            .pending
            .insert(location.clone(), PendingParse::Skip { committed: true });
        debug_assert!(
            !matches!(previous, Some(PendingParse::Skip { .. })),
            "location committed twice in one run: {location}"
        );
        matches!(previous, Some(PendingParse::Required))
    }

    fn mark_skip(&mut self, location: &IndexFileLocation) {
        self.pending
            .insert(location.clone(), PendingParse::Skip { committed: false });
    }

    /// Progress bookkeeping for an entry unit whose location was already
    /// satisfied this run
    ///
    /// A location committed earlier in the run (a header reached as a
    /// dependency before its own entry pass) is fully accounted for at
    /// commit time; adjusting the totals again here would leave the done
    /// count ahead of the estimate. Only a genuinely uncommitted entry (a
    /// per-file failure) shrinks the estimate.
    fn entry_already_satisfied(&self, location: &IndexFileLocation, top_level_source: bool) {
        let committed = matches!(
            self.pending.get(location),
            Some(PendingParse::Skip { committed: true })
        );
        if committed {
            if top_level_source {
                self.progress.source_skipped();
            }
            return;
        }
        self.entry_not_committed(top_level_source);
    }

    /// Progress bookkeeping for an entry unit that produced no record
    fn entry_not_committed(&self, top_level_source: bool) {
        self.progress.update_info(0, 0, -1);
        if top_level_source {
            self.progress.source_skipped();
        } else {
            self.progress.header_completed();
        }
    }

    fn finish(self, status: RunStatus, start: Instant) -> RunOutcome {
        let elapsed = start.elapsed();
        let cache = self.index.cache_stats();
        let progress = self.progress.snapshot();
        log_timing!(Level::DEBUG, "indexing_run", elapsed);
        debug!(
            "Indexing run {:?} in {} ms: {} (cache: {} hits / {} misses)",
            status,
            elapsed.as_millis(),
            progress.summary(),
            cache.hits,
            cache.misses
        );
        RunOutcome {
            status,
            progress,
            cache,
            elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::storage::IndexStorage;
    use crate::index::storage::memory::MemoryStorage;
    use crate::io::file_system::TestFileSystem;
    use crate::parser::DeclarationExtractor;
    use crate::project::FixedScannerInfoProvider;
    use std::time::{Duration, UNIX_EPOCH};

    struct Fixture {
        fs: TestFileSystem,
        storage: Arc<MemoryStorage>,
        index: WritableIndex,
        reader_cache: Arc<ReaderCache<TestFileSystem>>,
    }

    impl Fixture {
        fn new() -> Self {
            let fs = TestFileSystem::new();
            let storage = Arc::new(MemoryStorage::new());
            let index = WritableIndex::new(storage.clone());
            let reader_cache = Arc::new(ReaderCache::new(fs.clone()));
            Self {
                fs,
                storage,
                index,
                reader_cache,
            }
        }

        fn file(&self, path: &str, contents: &str, mtime_secs: u64) {
            self.fs
                .set_file_content(path, contents, UNIX_EPOCH + Duration::from_secs(mtime_secs));
        }

        fn task(
            &self,
            added: Vec<TranslationUnit>,
            changed: Vec<TranslationUnit>,
            removed: Vec<TranslationUnit>,
        ) -> IndexerTask<TestFileSystem> {
            IndexerTask::new(
                self.index.clone(),
                Arc::new(DeclarationExtractor::default()),
                Arc::new(FixedScannerInfoProvider::with_include_paths(vec![
                    "/p/include".into(),
                ])),
                self.reader_cache.clone(),
                self.fs.clone(),
                added,
                changed,
                removed,
            )
        }

        async fn stored(&self, path: &str) -> Option<FileRecord> {
            self.storage
                .get(&IndexFileLocation::from_normalized(path))
                .await
                .unwrap()
        }
    }

    fn tu(path: &str) -> TranslationUnit {
        TranslationUnit::new(path)
    }

    #[tokio::test]
    async fn test_run_indexes_sources_and_their_headers() {
        let fixture = Fixture::new();
        fixture.file("/p/a.cpp", "#include \"b.h\"\nint main() { return 0; }\n", 100);
        fixture.file("/p/b.h", "struct B { int x; };\n", 100);

        let task = fixture.task(vec![tu("/p/a.cpp")], vec![], vec![]);
        let outcome = task.run(&CancellationToken::new()).await.unwrap();

        assert_eq!(outcome.status, RunStatus::Complete);
        let a = fixture.stored("/p/a.cpp").await.unwrap();
        assert_eq!(a.includes.len(), 1);
        assert_eq!(
            a.includes[0].resolved,
            Some(IndexFileLocation::from_normalized("/p/b.h"))
        );
        let b = fixture.stored("/p/b.h").await.unwrap();
        assert_eq!(b.declarations[0].name, "B");

        assert_eq!(outcome.progress.completed_sources, 1);
        assert_eq!(outcome.progress.sources_remaining, 0);
        assert_eq!(outcome.progress.headers_indexed, 1);
    }

    #[tokio::test]
    async fn test_diamond_includes_parse_header_once() {
        let fixture = Fixture::new();
        fixture.file("/p/a.cpp", "#include \"b.h\"\nint a() { return 1; }\n", 100);
        fixture.file("/p/c.cpp", "#include \"b.h\"\nint c() { return 2; }\n", 100);
        fixture.file("/p/b.h", "struct B {};\n", 100);

        let task = fixture.task(vec![], vec![tu("/p/a.cpp"), tu("/p/c.cpp")], vec![]);
        let outcome = task.run(&CancellationToken::new()).await.unwrap();

        assert_eq!(outcome.status, RunStatus::Complete);
        assert_eq!(outcome.progress.sources_remaining, 0);
        assert_eq!(outcome.progress.completed_sources, 2);
        // b.h committed exactly once: generation sequence has no gap or
        // duplicate for it.
        assert_eq!(outcome.progress.headers_indexed, 1);
        assert!(fixture.stored("/p/a.cpp").await.is_some());
        assert!(fixture.stored("/p/c.cpp").await.is_some());
        assert!(fixture.stored("/p/b.h").await.is_some());
        assert_eq!(fixture.storage.len(), 3);
    }

    #[tokio::test]
    async fn test_include_cycle_terminates() {
        let fixture = Fixture::new();
        fixture.file("/p/a.cpp", "#include \"x.h\"\n", 100);
        fixture.file("/p/x.h", "#include \"y.h\"\nstruct X {};\n", 100);
        fixture.file("/p/y.h", "#include \"x.h\"\nstruct Y {};\n", 100);

        let task = fixture.task(vec![tu("/p/a.cpp")], vec![], vec![]);
        let outcome = task.run(&CancellationToken::new()).await.unwrap();

        assert_eq!(outcome.status, RunStatus::Complete);
        assert_eq!(fixture.storage.len(), 3);
        assert_eq!(outcome.progress.headers_indexed, 2);
    }

    #[tokio::test]
    async fn test_removed_units_are_purged() {
        let fixture = Fixture::new();
        fixture.file("/p/a.cpp", "int a;\n", 100);
        let task = fixture.task(vec![tu("/p/a.cpp")], vec![], vec![]);
        task.run(&CancellationToken::new()).await.unwrap();
        assert!(fixture.stored("/p/a.cpp").await.is_some());

        let task = fixture.task(vec![], vec![], vec![tu("/p/a.cpp")]);
        let outcome = task.run(&CancellationToken::new()).await.unwrap();

        assert_eq!(outcome.status, RunStatus::Complete);
        assert_eq!(outcome.progress.files_removed, 1);
        assert!(fixture.stored("/p/a.cpp").await.is_none());
    }

    #[tokio::test]
    async fn test_up_to_date_source_is_not_reparsed() {
        let fixture = Fixture::new();
        fixture.file("/p/a.cpp", "int a;\n", 100);

        let task = fixture.task(vec![tu("/p/a.cpp")], vec![], vec![]);
        task.run(&CancellationToken::new()).await.unwrap();
        let first = fixture.stored("/p/a.cpp").await.unwrap();

        let mut task = fixture.task(vec![], vec![tu("/p/a.cpp")], vec![]);
        task.set_check_timestamps(true);
        let outcome = task.run(&CancellationToken::new()).await.unwrap();

        assert_eq!(outcome.status, RunStatus::Complete);
        // The record is byte-identical: same generation, so no re-commit
        // happened.
        let second = fixture.stored("/p/a.cpp").await.unwrap();
        assert_eq!(second.generation, first.generation);
        assert_eq!(outcome.progress.completed_sources, 0);
        assert_eq!(outcome.progress.total_estimate, 0);
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let fixture = Fixture::new();
        fixture.file("/p/a.cpp", "#include \"b.h\"\nint a;\n", 100);
        fixture.file("/p/b.h", "struct B {};\n", 100);

        let units = || vec![tu("/p/a.cpp"), tu("/p/b.h")];
        let mut task = fixture.task(units(), vec![], vec![]);
        task.set_check_timestamps(true);
        task.run(&CancellationToken::new()).await.unwrap();
        let generation_a = fixture.stored("/p/a.cpp").await.unwrap().generation;
        let generation_b = fixture.stored("/p/b.h").await.unwrap().generation;

        let mut task = fixture.task(vec![], units(), vec![]);
        task.set_check_timestamps(true);
        let outcome = task.run(&CancellationToken::new()).await.unwrap();

        assert_eq!(outcome.status, RunStatus::Complete);
        assert_eq!(outcome.progress.completed_sources, 0);
        assert_eq!(outcome.progress.headers_indexed, 0);
        assert_eq!(
            fixture.stored("/p/a.cpp").await.unwrap().generation,
            generation_a
        );
        assert_eq!(
            fixture.stored("/p/b.h").await.unwrap().generation,
            generation_b
        );
    }

    #[tokio::test]
    async fn test_explicit_header_is_parsed_as_dependency_only_once() {
        let fixture = Fixture::new();
        fixture.file("/p/a.cpp", "#include \"b.h\"\nint a;\n", 100);
        fixture.file("/p/b.h", "struct B {};\n", 100);

        // b.h explicitly in the changed list and reachable from a.cpp.
        let task = fixture.task(vec![], vec![tu("/p/a.cpp"), tu("/p/b.h")], vec![]);
        let outcome = task.run(&CancellationToken::new()).await.unwrap();

        assert_eq!(outcome.status, RunStatus::Complete);
        assert_eq!(outcome.progress.headers_indexed, 1);
        assert_eq!(outcome.progress.headers_remaining, 0);
        assert_eq!(fixture.storage.len(), 2);
        // The header is counted once against an estimate that still covers
        // both units; the done tally never runs ahead of the total.
        assert_eq!(outcome.progress.total_estimate, 2);
        assert!((outcome.progress.fraction_done() - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_parse_failure_skips_file_and_continues() {
        let fixture = Fixture::new();
        // b.cpp is missing from disk entirely; a.cpp is fine.
        fixture.file("/p/a.cpp", "int a;\n", 100);

        let task = fixture.task(vec![tu("/p/b.cpp"), tu("/p/a.cpp")], vec![], vec![]);
        let outcome = task.run(&CancellationToken::new()).await.unwrap();

        assert_eq!(outcome.status, RunStatus::Complete);
        assert!(fixture.stored("/p/a.cpp").await.is_some());
        assert!(fixture.stored("/p/b.cpp").await.is_none());
        assert_eq!(outcome.progress.completed_sources, 1);
        assert_eq!(outcome.progress.sources_remaining, 0);
    }

    #[tokio::test]
    async fn test_storage_fault_aborts_run() {
        let fixture = Fixture::new();
        fixture.file("/p/a.cpp", "int a;\n", 100);
        fixture.file("/p/b.cpp", "int b;\n", 100);

        fixture.storage.inject_write_fault(true);
        let task = fixture.task(vec![tu("/p/a.cpp"), tu("/p/b.cpp")], vec![], vec![]);
        let result = task.run(&CancellationToken::new()).await;

        assert!(matches!(result, Err(IndexError::Fault(_))));
        assert!(fixture.storage.is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_before_removal_leaves_entries() {
        let fixture = Fixture::new();
        fixture.file("/p/a.cpp", "int a;\n", 100);
        let task = fixture.task(vec![tu("/p/a.cpp")], vec![], vec![]);
        task.run(&CancellationToken::new()).await.unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let task = fixture.task(vec![], vec![], vec![tu("/p/a.cpp")]);
        let outcome = task.run(&cancel).await.unwrap();

        assert_eq!(outcome.status, RunStatus::Cancelled);
        // The not-yet-removed entry is untouched for a future run.
        assert!(fixture.stored("/p/a.cpp").await.is_some());
    }

    #[tokio::test]
    async fn test_cancellation_mid_parse_commits_nothing_partial() {
        let fixture = Fixture::new();
        fixture.file("/p/a.cpp", "int a;\n", 100);
        fixture.file("/p/b.cpp", "int b;\n", 100);

        // Cancel after the first source completes: the second must not
        // appear in the store, the first must stay committed.
        struct CancellingParser {
            inner: DeclarationExtractor,
            cancel: CancellationToken,
            after: std::sync::atomic::AtomicUsize,
        }
        impl SourceParser for CancellingParser {
            fn parse(
                &self,
                buffer: &str,
                scanner_info: &crate::project::ScannerInfo,
                options: &ParseOptions,
            ) -> Result<crate::parser::Ast, crate::parser::ParseError> {
                use std::sync::atomic::Ordering;
                if self.after.fetch_add(1, Ordering::SeqCst) == 1 {
                    // Cancellation arrives while the second AST is built.
                    self.cancel.cancel();
                }
                self.inner.parse(buffer, scanner_info, options)
            }
        }

        let cancel = CancellationToken::new();
        let parser = Arc::new(CancellingParser {
            inner: DeclarationExtractor::default(),
            cancel: cancel.clone(),
            after: std::sync::atomic::AtomicUsize::new(0),
        });
        let task = IndexerTask::new(
            fixture.index.clone(),
            parser,
            Arc::new(FixedScannerInfoProvider::default()),
            fixture.reader_cache.clone(),
            fixture.fs.clone(),
            vec![tu("/p/a.cpp"), tu("/p/b.cpp")],
            vec![],
            vec![],
        );
        let outcome = task.run(&cancel).await.unwrap();

        assert_eq!(outcome.status, RunStatus::Cancelled);
        assert!(fixture.stored("/p/a.cpp").await.is_some());
        assert!(fixture.stored("/p/b.cpp").await.is_none());
    }

    #[tokio::test]
    async fn test_run_flushes_reader_cache() {
        let fixture = Fixture::new();
        fixture.file("/p/a.cpp", "int a;\n", 100);

        // Warm the cache with stale content, then change the file on disk.
        fixture.reader_cache.get(Path::new("/p/a.cpp")).unwrap();
        fixture.file("/p/a.cpp", "int a;\nstruct Fresh {};\n", 200);

        let task = fixture.task(vec![tu("/p/a.cpp")], vec![], vec![]);
        task.run(&CancellationToken::new()).await.unwrap();

        let record = fixture.stored("/p/a.cpp").await.unwrap();
        assert!(record.declarations.iter().any(|d| d.name == "Fresh"));
    }
}
