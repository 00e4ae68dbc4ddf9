//! Project collaborator: build settings and translation unit model
//!
//! The indexer consumes a project's resolved build settings as opaque input.
//! This module provides the scanner info abstraction, the compilation
//! database implementation of it, and the translation unit classification
//! used by the change-set builder.

pub mod compilation_database;
pub mod error;
pub mod scanner_info;
pub mod translation_unit;

pub use compilation_database::CompilationDatabase;
pub use scanner_info::{FixedScannerInfoProvider, ScannerInfo, ScannerInfoProvider};
pub use translation_unit::{TranslationUnit, is_translation_unit};
