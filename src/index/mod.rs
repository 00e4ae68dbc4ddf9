//! Persistent source index core
//!
//! The index maps canonical file locations to file records (declarations,
//! macros, include references, fingerprints) in a crash-tolerant on-disk
//! store, and coordinates incremental add/change/remove updates against it
//! without blocking readers.
//!
//! The module is split into focused components:
//! - `location`: location keys and the memoizing resolver
//! - `record`: file records and content fingerprints
//! - `storage`: storage trait plus filesystem and in-memory backends
//! - `writable`: the lock-ordered writable index handle
//! - `change_set`: timestamp filtering and source/header separation
//! - `progress`: pollable run counters
//! - `task`: the indexing run state machine

pub mod change_set;
pub mod location;
pub mod progress;
pub mod record;
pub mod storage;
pub mod task;
pub mod writable;

// Public exports
pub use location::LocationResolver;
pub use storage::IndexError;
pub use task::{IndexerTask, RunStatus};
pub use writable::WritableIndex;
