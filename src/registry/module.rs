//! Module registry: directory ↔ import path mapping for a Go project.
//!
//! Built once at the start of analysis from go.mod plus a directory walk,
//! then shared read-only (`Arc`) across every parallel extraction pass.
//! Both directional mappings are populated together so an entry exists in
//! one iff it exists in the other.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use ignore::WalkBuilder;

use crate::discovery::should_skip_dir;
use crate::registry::stdlib::StdlibLoader;

/// Process-wide state describing the analyzed module.
///
/// Mutated only during initial population (`build` + `init_stdlib_loader`),
/// read-only thereafter.
#[derive(Default)]
pub struct ModuleRegistry {
    /// Module path declared in go.mod (e.g. "github.com/example/myapp").
    pub module_path: String,
    /// Go version from go.mod's `go` directive, "" when absent.
    /// May carry a patch component; consumers normalize.
    pub go_version: String,
    /// Absolute directory → import path.
    pub dir_to_import: HashMap<PathBuf, String>,
    /// Import path → absolute directory.
    pub import_to_dir: HashMap<String, PathBuf>,
    /// Authoritative stdlib membership oracle. Absent when the manifest
    /// could not be loaded; everything downstream must tolerate that.
    pub stdlib: Option<Arc<dyn StdlibLoader>>,
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("module_path", &self.module_path)
            .field("go_version", &self.go_version)
            .field("dirs", &self.dir_to_import.len())
            .field("stdlib", &self.stdlib.is_some())
            .finish()
    }
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry for a project: parse go.mod, then walk the
    /// directory tree synthesizing import paths.
    ///
    /// Missing go.mod or a go.mod without a `module` declaration is fatal;
    /// a missing `go` directive is not (version detection has fallbacks).
    pub fn build(project_root: &Path) -> Result<Self> {
        let mut registry = Self::new();

        let (module_path, go_version) = parse_go_mod(project_root)?;
        registry.module_path = module_path;
        registry.go_version = go_version;

        let abs_root = project_root
            .canonicalize()
            .with_context(|| format!("failed to resolve project root {}", project_root.display()))?;

        for dir in walk_package_dirs(&abs_root) {
            let import_path = match dir.strip_prefix(&abs_root) {
                Ok(rel) if rel.as_os_str().is_empty() => registry.module_path.clone(),
                Ok(rel) => {
                    let normalized = rel
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/");
                    format!("{}/{}", registry.module_path, normalized)
                }
                Err(_) => continue,
            };
            registry.insert_mapping(dir, import_path);
        }

        Ok(registry)
    }

    /// Add both directions of a directory ↔ import-path mapping.
    pub fn insert_mapping(&mut self, dir: PathBuf, import_path: String) {
        self.import_to_dir.insert(import_path.clone(), dir.clone());
        self.dir_to_import.insert(dir, import_path);
    }

    /// Import path of the package living in `dir`, if registered.
    pub fn import_path_for_dir(&self, dir: &Path) -> Option<&str> {
        self.dir_to_import.get(dir).map(String::as_str)
    }

    /// Import path of the package containing `file`. The file's parent
    /// directory is absolutized before lookup so relative inputs work.
    pub fn package_of_file(&self, file: &Path) -> Option<&str> {
        let dir = file.parent()?;
        if let Some(path) = self.dir_to_import.get(dir) {
            return Some(path);
        }
        let abs = dir.canonicalize().ok()?;
        self.dir_to_import.get(&abs).map(String::as_str)
    }
}

/// Extract the module path and optional Go version from go.mod.
fn parse_go_mod(project_root: &Path) -> Result<(String, String)> {
    let go_mod_path = project_root.join("go.mod");

    let content = std::fs::read_to_string(&go_mod_path)
        .with_context(|| format!("go.mod not found in {}", project_root.display()))?;

    let mut module_path = String::new();
    let mut go_version = String::new();

    for line in content.lines() {
        let line = line.trim();

        if let Some(rest) = line.strip_prefix("module ") {
            if let Some(path) = rest.split_whitespace().next() {
                module_path = path.to_string();
            }
        }

        if let Some(rest) = line.strip_prefix("go ") {
            if let Some(version) = rest.split_whitespace().next() {
                go_version = version.to_string();
            }
        }
    }

    if module_path.is_empty() {
        anyhow::bail!("module declaration not found in {}", go_mod_path.display());
    }

    Ok((module_path, go_version))
}

/// Collect every package directory under root, pruning the exclusion set.
fn walk_package_dirs(abs_root: &Path) -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    let walker = WalkBuilder::new(abs_root)
        .hidden(false)
        .git_ignore(true)
        .require_git(false)
        .follow_links(false)
        .filter_entry(|entry| {
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                let name = entry.file_name().to_string_lossy();
                return !should_skip_dir(&name);
            }
            true
        })
        .build();

    for entry in walker.flatten() {
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            dirs.push(entry.path().to_path_buf());
        }
    }

    dirs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_project(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("callmap_test_module_{name}"));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_parse_go_mod() {
        let dir = temp_project("parse");
        fs::write(
            dir.join("go.mod"),
            "module github.com/example/testapp\n\ngo 1.21\n",
        )
        .unwrap();

        let (module, version) = parse_go_mod(&dir).unwrap();
        assert_eq!(module, "github.com/example/testapp");
        assert_eq!(version, "1.21");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_parse_go_mod_missing_version_is_ok() {
        let dir = temp_project("noversion");
        fs::write(dir.join("go.mod"), "module github.com/example/app\n").unwrap();

        let (module, version) = parse_go_mod(&dir).unwrap();
        assert_eq!(module, "github.com/example/app");
        assert_eq!(version, "");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_parse_go_mod_missing_file() {
        assert!(parse_go_mod(Path::new("/nonexistent/project")).is_err());
    }

    #[test]
    fn test_parse_go_mod_missing_module_declaration() {
        let dir = temp_project("nomodule");
        fs::write(dir.join("go.mod"), "go 1.21\n").unwrap();
        assert!(parse_go_mod(&dir).is_err());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_build_maps_directories() {
        let dir = temp_project("build");
        fs::write(
            dir.join("go.mod"),
            "module github.com/example/testapp\n\ngo 1.21\n",
        )
        .unwrap();
        fs::create_dir_all(dir.join("handlers")).unwrap();
        fs::create_dir_all(dir.join("utils/validation")).unwrap();
        fs::create_dir_all(dir.join("vendor/dep")).unwrap();

        let registry = ModuleRegistry::build(&dir).unwrap();
        assert_eq!(registry.module_path, "github.com/example/testapp");

        let abs = dir.canonicalize().unwrap();
        assert_eq!(
            registry.import_path_for_dir(&abs),
            Some("github.com/example/testapp")
        );
        assert_eq!(
            registry.import_path_for_dir(&abs.join("handlers")),
            Some("github.com/example/testapp/handlers")
        );
        assert_eq!(
            registry.import_path_for_dir(&abs.join("utils/validation")),
            Some("github.com/example/testapp/utils/validation")
        );

        // Vendored directories never get an import path.
        assert!(registry.import_path_for_dir(&abs.join("vendor/dep")).is_none());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_build_mappings_round_trip() {
        let dir = temp_project("roundtrip");
        fs::write(dir.join("go.mod"), "module example.com/rt\n").unwrap();
        fs::create_dir_all(dir.join("a/b")).unwrap();

        let registry = ModuleRegistry::build(&dir).unwrap();

        // importToDir[dirToImport[d]] == d for every registered directory.
        for (d, import) in &registry.dir_to_import {
            assert_eq!(registry.import_to_dir.get(import), Some(d));
        }
        assert_eq!(
            registry.dir_to_import.len(),
            registry.import_to_dir.len()
        );

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_package_of_file() {
        let dir = temp_project("pkgof");
        fs::write(dir.join("go.mod"), "module example.com/pkgof\n").unwrap();
        fs::create_dir_all(dir.join("handlers")).unwrap();
        fs::write(dir.join("handlers/user.go"), "package handlers\n").unwrap();

        let registry = ModuleRegistry::build(&dir).unwrap();
        let abs = dir.canonicalize().unwrap();
        assert_eq!(
            registry.package_of_file(&abs.join("handlers/user.go")),
            Some("example.com/pkgof/handlers")
        );

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_build_missing_go_mod_fails() {
        let dir = temp_project("missing");
        assert!(ModuleRegistry::build(&dir).is_err());
        fs::remove_dir_all(&dir).unwrap();
    }
}
