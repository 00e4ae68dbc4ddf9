mod index;
mod io;
mod logging;
mod parser;
mod project;

#[cfg(test)]
mod test_utils;

use clap::Parser;
use index::{IndexerTask, LocationResolver, RunStatus, WritableIndex};
use index::storage::filesystem::FilesystemStorage;
use io::file_system::RealFileSystem;
use io::reader_cache::ReaderCache;
use logging::{LogConfig, init_logging};
use parser::DeclarationExtractor;
use project::{
    CompilationDatabase, FixedScannerInfoProvider, ScannerInfoProvider, TranslationUnit,
    is_translation_unit,
};

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use walkdir::WalkDir;

/// CLI arguments for the indexer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Project root directory to index (defaults to current directory)
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Directory holding the on-disk index state (defaults to <root>/.pdom)
    #[arg(long, value_name = "DIR")]
    state_dir: Option<PathBuf>,

    /// Path to compile_commands.json (defaults to <root>/compile_commands.json)
    #[arg(long, value_name = "FILE")]
    compile_commands: Option<PathBuf>,

    /// Reindex every candidate file, skipping the fingerprint fast path
    #[arg(long)]
    no_timestamps: bool,

    /// Log level (overrides RUST_LOG env var)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Log file path (overrides PDOM_LOG_FILE env var)
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

/// Walk the project tree and collect every indexable translation unit
fn scan_project(root: &Path, state_dir: &Path) -> Vec<TranslationUnit> {
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| !entry.path().starts_with(state_dir))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable directory entry: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_translation_unit(entry.path()))
        .map(|entry| TranslationUnit::new(entry.into_path()))
        .collect()
}

/// Pick the scanner info source: a compilation database when one exists,
/// otherwise an empty fixed provider
fn load_scanner_info(
    root: &Path,
    compile_commands: Option<PathBuf>,
) -> Arc<dyn ScannerInfoProvider> {
    let candidate = compile_commands.unwrap_or_else(|| root.join("compile_commands.json"));
    if candidate.exists() {
        match CompilationDatabase::load(candidate.clone()) {
            Ok(database) => {
                info!("Loaded compilation database: {}", candidate.display());
                return Arc::new(database);
            }
            Err(e) => {
                warn!(
                    "Ignoring compilation database {}: {e}",
                    candidate.display()
                );
            }
        }
    }
    Arc::new(FixedScannerInfoProvider::default())
}

/// Split the on-disk scan against the stored index into work lists
///
/// Files present in both are handed over as changed; the fingerprint
/// filter inside the run decides whether they are actually reparsed.
async fn compute_delta(
    index: &WritableIndex,
    on_disk: Vec<TranslationUnit>,
) -> Result<(Vec<TranslationUnit>, Vec<TranslationUnit>, Vec<TranslationUnit>), index::IndexError>
{
    let mut resolver = LocationResolver::new();
    let known: HashSet<_> = index.known_locations().await?.into_iter().collect();

    let mut added = Vec::new();
    let mut changed = Vec::new();
    let mut seen = HashSet::new();
    for unit in on_disk {
        let location = resolver.resolve(unit.path());
        if known.contains(&location) {
            changed.push(unit);
        } else {
            added.push(unit);
        }
        seen.insert(location);
    }

    let removed = known
        .into_iter()
        .filter(|location| !seen.contains(location))
        .map(|location| TranslationUnit::new(location.to_path()))
        .collect();

    Ok((added, changed, removed))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_config = LogConfig::from_env().with_overrides(args.log_level, args.log_file);
    if let Err(e) = init_logging(log_config) {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(1);
    }

    let root = match args.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    let state_dir = args.state_dir.unwrap_or_else(|| root.join(".pdom"));

    info!("Indexing project root: {}", root.display());

    let storage = Arc::new(FilesystemStorage::open(state_dir.clone())?);
    let index = WritableIndex::new(storage);

    let on_disk = scan_project(&root, &state_dir);
    info!("Found {} translation units on disk", on_disk.len());

    let (added, changed, removed) = compute_delta(&index, on_disk).await?;
    info!(
        "Work lists: {} added, {} changed, {} removed",
        added.len(),
        changed.len(),
        removed.len()
    );

    let scanner_info = load_scanner_info(&root, args.compile_commands);
    let mut task = IndexerTask::new(
        index,
        Arc::new(DeclarationExtractor::new()?),
        scanner_info,
        Arc::new(ReaderCache::new(RealFileSystem)),
        RealFileSystem,
        added,
        changed,
        removed,
    );
    task.set_check_timestamps(!args.no_timestamps);

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling the indexing run");
            ctrl_c_cancel.cancel();
        }
    });

    let outcome = task.run(&cancel).await?;

    match outcome.status {
        RunStatus::Complete => {
            info!(
                "Indexing complete in {:.1}s: {} (cache hit ratio {:.2})",
                outcome.elapsed.as_secs_f64(),
                outcome.progress.summary(),
                outcome.cache.hit_ratio()
            );
        }
        RunStatus::Cancelled => {
            info!(
                "Indexing cancelled after {:.1}s: {}",
                outcome.elapsed.as_secs_f64(),
                outcome.progress.summary()
            );
        }
    }
    println!("{}", outcome.progress.summary());

    Ok(())
}
