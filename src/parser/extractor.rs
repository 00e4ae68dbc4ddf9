//! Default declaration extractor
//!
//! A deliberately shallow, regex-driven parser implementing `SourceParser`.
//! It recovers the declaration summary (functions, types, macros, includes)
//! that the indexer stores per file. It is not a C/C++ front end; projects
//! wanting full fidelity plug a real parser in behind the same trait.

use crate::parser::ast::{
    Ast, Declaration, DeclarationKind, IncludeDirective, MacroDefinition,
};
use crate::parser::{ParseError, ParseOptions, SourceParser};
use crate::project::ScannerInfo;
use regex::Regex;

/// Regex-based declaration extractor
#[derive(Clone)]
pub struct DeclarationExtractor {
    include_regex: Regex,
    define_regex: Regex,
    type_regex: Regex,
    typedef_regex: Regex,
    function_regex: Regex,
}

impl DeclarationExtractor {
    /// Create an extractor with compiled patterns
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            // #include <name> or #include "name"
            include_regex: Regex::new(r#"^\s*#\s*include\s*(?:<([^>]+)>|"([^"]+)")"#)?,

            // #define NAME ...
            define_regex: Regex::new(r"^\s*#\s*define\s+([A-Za-z_][A-Za-z0-9_]*)")?,

            // struct/class/enum/union/namespace Name { or ;
            type_regex: Regex::new(
                r"^\s*(struct|class|enum|union|namespace)\s+([A-Za-z_][A-Za-z0-9_]*)\s*(\{|;|:|$)",
            )?,

            // typedef ... Name;
            typedef_regex: Regex::new(r"^\s*typedef\s+.+?\b([A-Za-z_][A-Za-z0-9_]*)\s*;")?,

            // ReturnType name(args) { or ;
            function_regex: Regex::new(
                r"^\s*(?:[A-Za-z_][A-Za-z0-9_:<>,\s\*&]*?)\s+([A-Za-z_][A-Za-z0-9_]*)\s*\([^;{}]*\)\s*(\{|;|const)",
            )?,
        })
    }
}

impl Default for DeclarationExtractor {
    fn default() -> Self {
        Self::new().expect("declaration extractor patterns must compile")
    }
}

impl SourceParser for DeclarationExtractor {
    fn parse(
        &self,
        buffer: &str,
        _scanner_info: &ScannerInfo,
        options: &ParseOptions,
    ) -> Result<Ast, ParseError> {
        let mut ast = Ast::default();

        for (idx, raw_line) in buffer.lines().enumerate() {
            let line = (idx + 1) as u32;

            if let Some(captures) = self.include_regex.captures(raw_line) {
                let (name, angle_bracket) = match (captures.get(1), captures.get(2)) {
                    (Some(angled), _) => (angled.as_str(), true),
                    (None, Some(quoted)) => (quoted.as_str(), false),
                    (None, None) => {
                        return Err(ParseError::MalformedDirective {
                            line,
                            text: raw_line.trim().to_string(),
                        });
                    }
                };
                ast.includes.push(IncludeDirective {
                    name: name.to_string(),
                    angle_bracket,
                    line,
                });
                continue;
            }

            if let Some(captures) = self.define_regex.captures(raw_line) {
                ast.macros.push(MacroDefinition {
                    name: captures[1].to_string(),
                    line,
                });
                continue;
            }

            if let Some(captures) = self.type_regex.captures(raw_line) {
                let kind = match &captures[1] {
                    "struct" => DeclarationKind::Struct,
                    "class" => DeclarationKind::Class,
                    "enum" => DeclarationKind::Enum,
                    "union" => DeclarationKind::Union,
                    _ => DeclarationKind::Namespace,
                };
                ast.declarations.push(Declaration {
                    name: captures[2].to_string(),
                    kind,
                    line,
                    is_definition: &captures[3] != ";",
                });
                continue;
            }

            if let Some(captures) = self.typedef_regex.captures(raw_line) {
                ast.declarations.push(Declaration {
                    name: captures[1].to_string(),
                    kind: DeclarationKind::Typedef,
                    line,
                    is_definition: true,
                });
                continue;
            }

            if options.extract_functions
                && let Some(captures) = self.function_regex.captures(raw_line)
            {
                let name = captures[1].to_string();
                // Control-flow keywords match the function shape; skip them.
                if !matches!(name.as_str(), "if" | "for" | "while" | "switch" | "return") {
                    ast.declarations.push(Declaration {
                        name,
                        kind: DeclarationKind::Function,
                        line,
                        is_definition: &captures[2] != ";",
                    });
                }
            }
        }

        Ok(ast)
    }
}
