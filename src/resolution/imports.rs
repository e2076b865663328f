//! Import path classification: stdlib / same-module / third-party.
//!
//! The stdlib loader is the authority. The offline heuristic only exists so
//! classification reports stay useful when the manifest could not be
//! fetched; it is never consulted when tagging call sites.

use std::collections::HashMap;

use serde::Serialize;

use crate::registry::ModuleRegistry;

/// Classification of a single import path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    /// Go standard library ("fmt", "net/http").
    Stdlib,
    /// External module ("github.com/gorilla/mux").
    ThirdParty,
    /// Same module or a relative import ("./utils").
    Local,
}

/// Offline stdlib heuristic used when no loader is available. Stdlib
/// packages never contain a "." (domain separator) in their import path and
/// are not prefixed with "internal/".
pub fn is_stdlib_fallback(import_path: &str) -> bool {
    if import_path.starts_with("internal/") {
        return false;
    }
    !import_path.contains('.')
}

/// Classifies import paths against a module registry.
pub struct ImportClassifier<'a> {
    registry: &'a ModuleRegistry,
}

impl<'a> ImportClassifier<'a> {
    pub fn new(registry: &'a ModuleRegistry) -> Self {
        Self { registry }
    }

    /// Whether `import_path` belongs to the standard library, via the
    /// authoritative loader when present, the offline heuristic otherwise.
    pub fn is_stdlib(&self, import_path: &str) -> bool {
        match &self.registry.stdlib {
            Some(loader) => loader.validate(import_path),
            None => is_stdlib_fallback(import_path),
        }
    }

    /// Categorize a single import path.
    pub fn classify(&self, import_path: &str) -> ImportKind {
        if self.is_stdlib(import_path) {
            return ImportKind::Stdlib;
        }
        // Relative imports are always local.
        if import_path.starts_with('.') {
            return ImportKind::Local;
        }
        // Imports under the current module's path are local.
        if !self.registry.module_path.is_empty()
            && import_path.starts_with(&self.registry.module_path)
        {
            return ImportKind::Local;
        }
        ImportKind::ThirdParty
    }

    /// Classify every path in the given list.
    pub fn classify_all<I, S>(&self, imports: I) -> HashMap<String, ImportKind>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        imports
            .into_iter()
            .map(|p| {
                let path = p.as_ref();
                (path.to_string(), self.classify(path))
            })
            .collect()
    }
}
