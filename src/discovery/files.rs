//! Parallel discovery of Go source files.
//!
//! Design:
//! - The `ignore` crate provides battle-tested .gitignore handling from ripgrep
//! - WalkBuilder with threads(0) auto-detects optimal parallelism
//! - A fixed directory exclusion set removes vendored deps, test fixtures,
//!   VCS metadata, build output, and mixed-language caches
//! - Sorting ensures reproducible output across runs

use std::path::{Path, PathBuf};

use anyhow::Result;
use ignore::WalkBuilder;

/// Directories never descended into, neither for file discovery nor for the
/// module-registry walk.
pub const EXCLUDED_DIRS: &[&str] = &[
    "vendor",
    "testdata",
    ".git",
    ".svn",
    ".hg",
    "node_modules",
    "dist",
    "build",
    "_build",
    ".vscode",
    ".idea",
    "tmp",
    "temp",
    "__pycache__",
    ".DS_Store",
];

/// Whether a directory name is in the fixed exclusion set.
pub fn should_skip_dir(name: &str) -> bool {
    EXCLUDED_DIRS.contains(&name)
}

/// Find Go source files under `directory`, respecting .gitignore and the
/// fixed exclusion set. Returns sorted absolute paths.
pub fn find_go_files(directory: &Path) -> Result<Vec<PathBuf>> {
    if directory.is_file() {
        return Ok(vec![directory.to_path_buf()]);
    }

    if !directory.is_dir() {
        anyhow::bail!("path does not exist: {}", directory.display());
    }

    let walker = WalkBuilder::new(directory)
        .hidden(false)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .require_git(false)
        .follow_links(false)
        .threads(0)
        .filter_entry(|entry| {
            // Prune excluded directories before descending into them.
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                let name = entry.file_name().to_string_lossy();
                return !should_skip_dir(&name);
            }
            true
        })
        .build_parallel();

    let files = std::sync::Mutex::new(Vec::new());

    walker.run(|| {
        Box::new(|entry_result| {
            match entry_result {
                Ok(entry) => {
                    let path = entry.path();

                    if !path.is_file() {
                        return ignore::WalkState::Continue;
                    }

                    if path.extension().and_then(|e| e.to_str()) != Some("go") {
                        return ignore::WalkState::Continue;
                    }

                    if let Ok(mut files) = files.lock() {
                        files.push(path.to_path_buf());
                    }

                    ignore::WalkState::Continue
                }
                // Unreadable entries (permissions, broken symlinks) are skipped.
                Err(_) => ignore::WalkState::Continue,
            }
        })
    });

    let mut files = files
        .into_inner()
        .map_err(|_| anyhow::anyhow!("file discovery mutex poisoned"))?;

    // Sorted for reproducibility across runs.
    files.sort();

    Ok(files)
}
