//! Parser collaborator
//!
//! The indexer delegates AST construction to an implementation of
//! `SourceParser`: synchronous, re-entrant per file, fed a source buffer and
//! scanner info. The default implementation is a shallow declaration
//! extractor; a real front end can be substituted behind the trait.

pub mod ast;
pub mod extractor;
pub mod includes;

pub use ast::{Ast, Declaration, MacroDefinition};
pub use extractor::DeclarationExtractor;
pub use includes::resolve_include;

use crate::project::ScannerInfo;
use thiserror::Error;

/// Per-file parse failure
///
/// These are transient: the indexer logs them, skips the file and keeps
/// going. They never abort a run.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Malformed directive at line {line}: {text}")]
    MalformedDirective { line: u32, text: String },

    #[error("Source is not parseable: {reason}")]
    Unparseable { reason: String },
}

/// Options controlling how much a parser extracts
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Extract function declarations in addition to types and macros
    pub extract_functions: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            extract_functions: true,
        }
    }
}

/// Parser front end producing a declaration summary from a source buffer
///
/// Implementations must be synchronous and re-entrant per file; the indexer
/// may call `parse` for many files in sequence on one logical thread.
pub trait SourceParser: Send + Sync {
    fn parse(
        &self,
        buffer: &str,
        scanner_info: &ScannerInfo,
        options: &ParseOptions,
    ) -> Result<Ast, ParseError>;
}
