//! Core types for callmap - shared across extraction, resolution, and the graph.
//!
//! The data model mirrors the analysis pipeline:
//! - `ImportMap` is what import extraction produces per file
//! - `TypeInfo` is what the inference engine traffics in
//! - `CallSite` is what the call-graph builder records per call expression
//!
//! Everything here is plain owned data, `Clone + Serialize`, so artifacts can
//! be shared freely between the parallel extraction passes and the server.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A source location. Column is 0 when the extractor only tracks lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

impl Location {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column: 0,
        }
    }

    pub fn with_column(mut self, column: u32) -> Self {
        self.column = column;
        self
    }
}

/// Where a type fact came from. Confidence is attached separately in
/// `TypeInfo`; the source records which inference path produced the fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeSource {
    /// Inferred from a literal expression (`"x"`, `42`, `User{}`).
    Literal,
    /// Taken from a declared return-type list in user code.
    Declaration,
    /// Copied from another variable's latest binding.
    Variable,
    /// Resolved through the stdlib manifest in a direct return-type lookup.
    Stdlib,
    /// Resolved through the stdlib manifest from the deeper
    /// variable-inference path (one extra hop of assumption).
    StdlibRegistry,
}

impl std::fmt::Display for TypeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TypeSource::Literal => "literal",
            TypeSource::Declaration => "declaration",
            TypeSource::Variable => "variable",
            TypeSource::Stdlib => "stdlib",
            TypeSource::StdlibRegistry => "stdlib_registry",
        };
        f.write_str(s)
    }
}

/// An inferred type: fully-qualified name plus how sure we are and why.
///
/// FQN conventions:
/// - `<packagePath>.<TypeName>` for package-level types (`net/http.Response`)
/// - `builtin.<name>` for primitives and the distinguished `error`, `byte`,
///   `rune`, `nil`
/// - a bare qualified name (`io.Reader`) when a cross-package reference
///   cannot be resolved further without more context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeInfo {
    pub type_fqn: String,
    pub confidence: f64,
    pub source: TypeSource,
}

impl TypeInfo {
    pub fn new(type_fqn: impl Into<String>, confidence: f64, source: TypeSource) -> Self {
        Self {
            type_fqn: type_fqn.into(),
            confidence,
            source,
        }
    }
}

/// Per-file import table: the declared package name and every bound local
/// alias mapped to its full import path.
///
/// Alias shapes, as written in Go source:
/// - default: `import "net/http"` binds `http`
/// - renamed: `import h "net/http"` binds `h`
/// - dot: `import . "fmt"` binds `.` (namespace merge)
/// - blank: `import _ "github.com/lib/pq"` binds `_` (side-effect only)
#[derive(Debug, Clone, Default)]
pub struct ImportMap {
    /// Path of the file these imports belong to.
    pub file: String,
    /// Package name from the package clause.
    pub package_name: String,
    /// Local alias → full import path.
    pub imports: HashMap<String, String>,
}

impl ImportMap {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            package_name: String::new(),
            imports: HashMap::new(),
        }
    }

    pub fn add_import(&mut self, alias: impl Into<String>, import_path: impl Into<String>) {
        self.imports.insert(alias.into(), import_path.into());
    }

    /// Import path bound to a local alias, if any.
    pub fn lookup(&self, alias: &str) -> Option<&str> {
        self.imports.get(alias).map(String::as_str)
    }
}

/// A syntactic call expression and the resolver's verdict on it.
///
/// `target` is the short name as written; `target_fqn` is the resolver's
/// best guess. `resolved` is true only when the guess is backed by a
/// declaration or a recognized import; `is_stdlib` is true only when the
/// stdlib loader validated the target's import path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSite {
    pub target: String,
    pub target_fqn: String,
    pub location: Location,
    pub resolved: bool,
    pub is_stdlib: bool,
}
