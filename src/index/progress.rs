//! Progress counters for an indexing run
//!
//! The task owns the only writer; UI consumers poll snapshots from a cloned
//! handle. Counters are plain atomics adjusted cooperatively at file
//! granularity, matching the task's cancellation points.

use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

#[derive(Default)]
struct Counters {
    /// Estimated total files in this run; filtered-out files shrink it,
    /// discovered headers grow it
    total_estimate: AtomicI64,
    /// Top-level source files committed so far
    completed_sources: AtomicI64,
    /// Headers committed so far (explicit and discovered)
    headers_indexed: AtomicI64,
    /// Records purged in the removal phase
    files_removed: AtomicI64,
    /// Source files still to parse
    sources_remaining: AtomicI64,
    /// Known headers still to parse
    headers_remaining: AtomicI64,
}

/// Shared, pollable progress handle for one indexing run
#[derive(Clone, Default)]
pub struct IndexProgress {
    counters: Arc<Counters>,
}

impl IndexProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adjust the removed tally, the header tally and the total estimate
    ///
    /// The three deltas cover every bookkeeping event in a run: a removed
    /// source is `(1, 0, 0)`, a removed header `(0, 1, -1)`, a filtered
    /// up-to-date file `(0, 0, -1)`, a discovered header `(0, 1, 1)`.
    pub fn update_info(&self, removed_delta: i64, headers_delta: i64, total_delta: i64) {
        self.counters
            .files_removed
            .fetch_add(removed_delta, Ordering::Relaxed);
        self.counters
            .headers_indexed
            .fetch_add(headers_delta, Ordering::Relaxed);
        self.counters
            .total_estimate
            .fetch_add(total_delta, Ordering::Relaxed);
    }

    /// Record the work lists chosen for the parse phase
    pub fn set_remaining(&self, sources: usize, headers: usize) {
        self.counters
            .sources_remaining
            .store(sources as i64, Ordering::Relaxed);
        self.counters
            .headers_remaining
            .store(headers as i64, Ordering::Relaxed);
    }

    /// A top-level source file was committed
    pub fn source_completed(&self) {
        self.counters.completed_sources.fetch_add(1, Ordering::Relaxed);
        self.counters.sources_remaining.fetch_sub(1, Ordering::Relaxed);
    }

    /// A top-level source file ended without a commit (parse failure or
    /// already satisfied); it is no longer remaining but not completed
    pub fn source_skipped(&self) {
        self.counters.sources_remaining.fetch_sub(1, Ordering::Relaxed);
    }

    /// A header from the explicit work list was processed
    pub fn header_completed(&self) {
        self.counters.headers_remaining.fetch_sub(1, Ordering::Relaxed);
    }

    /// Point-in-time view of the counters
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            total_estimate: self.counters.total_estimate.load(Ordering::Relaxed).max(0),
            completed_sources: self.counters.completed_sources.load(Ordering::Relaxed).max(0),
            headers_indexed: self.counters.headers_indexed.load(Ordering::Relaxed).max(0),
            files_removed: self.counters.files_removed.load(Ordering::Relaxed).max(0),
            sources_remaining: self.counters.sources_remaining.load(Ordering::Relaxed).max(0),
            headers_remaining: self.counters.headers_remaining.load(Ordering::Relaxed).max(0),
        }
    }
}

/// Serializable point-in-time view of run progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub total_estimate: i64,
    pub completed_sources: i64,
    pub headers_indexed: i64,
    pub files_removed: i64,
    pub sources_remaining: i64,
    pub headers_remaining: i64,
}

impl ProgressSnapshot {
    /// Completed fraction of the current estimate, in [0, 1]
    pub fn fraction_done(&self) -> f64 {
        if self.total_estimate <= 0 {
            return 1.0;
        }
        let done = self.completed_sources + self.headers_indexed + self.files_removed;
        (done as f64 / self.total_estimate as f64).clamp(0.0, 1.0)
    }

    /// Human-readable one-line summary
    pub fn summary(&self) -> String {
        format!(
            "{} sources, {} headers, {} removed ({:.0}% of {})",
            self.completed_sources,
            self.headers_indexed,
            self.files_removed,
            self.fraction_done() * 100.0,
            self.total_estimate
        )
    }
}
