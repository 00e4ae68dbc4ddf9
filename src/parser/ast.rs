//! AST surface consumed by the indexer
//!
//! The indexer never walks expression trees; it only needs the declaration
//! summary of a translation unit: what the file declares, what it includes,
//! and which macros it defines. Parsers produce this summary from a source
//! buffer plus scanner info.

use serde::{Deserialize, Serialize};

/// Kind of indexed declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeclarationKind {
    Function,
    Struct,
    Class,
    Enum,
    Union,
    Typedef,
    Variable,
    Namespace,
}

/// One declaration found in a translation unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    /// Declared name
    pub name: String,
    /// What kind of entity is declared
    pub kind: DeclarationKind,
    /// 1-based line of the declaration
    pub line: u32,
    /// Whether this is a definition rather than a forward declaration
    pub is_definition: bool,
}

/// A `#define` found in a translation unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroDefinition {
    pub name: String,
    /// 1-based line of the definition
    pub line: u32,
}

/// An `#include` directive found in a translation unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeDirective {
    /// Header name as written between the delimiters
    pub name: String,
    /// True for `<...>`, false for `"..."`
    pub angle_bracket: bool,
    /// 1-based line of the directive
    pub line: u32,
}

/// Declaration summary of one parsed translation unit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ast {
    pub declarations: Vec<Declaration>,
    pub macros: Vec<MacroDefinition>,
    pub includes: Vec<IncludeDirective>,
}

impl Ast {
    /// Total number of indexable entries in this unit
    pub fn entry_count(&self) -> usize {
        self.declarations.len() + self.macros.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_count() {
        let ast = Ast {
            declarations: vec![Declaration {
                name: "main".to_string(),
                kind: DeclarationKind::Function,
                line: 3,
                is_definition: true,
            }],
            macros: vec![MacroDefinition {
                name: "VERSION".to_string(),
                line: 1,
            }],
            includes: vec![IncludeDirective {
                name: "util.h".to_string(),
                angle_bracket: false,
                line: 2,
            }],
        };

        // Includes are references, not declarations.
        assert_eq!(ast.entry_count(), 2);
    }
}
