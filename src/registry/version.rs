//! Go toolchain version detection.
//!
//! The stdlib manifest is version-pinned, so we need to know which Go
//! release a project targets before fetching it. Detection priority:
//!
//! 1. go.mod `go X.Y` directive (most authoritative for module projects)
//! 2. `.go-version` pin file (goenv / asdf style)
//! 3. go.work workspace directive (multi-module projects)
//! 4. Compiled-in default
//!
//! All returned values are normalized to "X.Y" form; the patch component is
//! irrelevant to stdlib surface and is stripped.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

/// Fallback toolchain version when no declaration file is present.
pub const DEFAULT_GO_VERSION: &str = "1.21";

/// Matches the `go X.Y` directive in go.mod and go.work. Anchored to the
/// start of a line so `toolchain go1.23.4` lines do not match.
static GO_VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^go\s+(\d+\.\d+)").expect("invalid go version regex"));

/// Determine the Go toolchain version targeted by a project.
pub fn detect_go_version(project_root: &Path) -> String {
    if let Some(v) = parse_go_version_from_file(&project_root.join("go.mod")) {
        return normalize_go_version(&v);
    }

    if let Some(v) = read_go_version_file(project_root) {
        return v;
    }

    if let Some(v) = parse_go_version_from_file(&project_root.join("go.work")) {
        return normalize_go_version(&v);
    }

    DEFAULT_GO_VERSION.to_string()
}

/// Strip the patch component from a Go version string.
///
/// "1.21" → "1.21", "1.21.4" → "1.21", "1.26.0" → "1.26"
pub fn normalize_go_version(version: &str) -> String {
    let mut parts = version.split('.');
    match (parts.next(), parts.next()) {
        (Some(major), Some(minor)) => format!("{major}.{minor}"),
        _ => version.to_string(),
    }
}

/// Extract the `go X.Y` directive from a go.mod or go.work file.
/// Returns None on any read or match failure.
fn parse_go_version_from_file(path: &Path) -> Option<String> {
    let data = std::fs::read_to_string(path).ok()?;
    GO_VERSION_RE
        .captures(&data)
        .map(|caps| caps[1].to_string())
}

/// Read a `.go-version` pin file, normalized. None when missing or empty.
fn read_go_version_file(project_root: &Path) -> Option<String> {
    let data = std::fs::read_to_string(project_root.join(".go-version")).ok()?;
    let trimmed = data.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(normalize_go_version(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn temp_project(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("callmap_test_version_{name}"));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_normalize_go_version() {
        assert_eq!(normalize_go_version("1.21"), "1.21");
        assert_eq!(normalize_go_version("1.21.4"), "1.21");
        assert_eq!(normalize_go_version("1.26.0"), "1.26");
        assert_eq!(normalize_go_version("2.0.0"), "2.0");
        assert_eq!(normalize_go_version("1"), "1");
        assert_eq!(normalize_go_version(""), "");
    }

    #[test]
    fn test_parse_go_version_from_go_mod() {
        let dir = temp_project("gomod");
        fs::write(dir.join("go.mod"), "module example.com/app\n\ngo 1.22\n").unwrap();
        assert_eq!(
            parse_go_version_from_file(&dir.join("go.mod")),
            Some("1.22".to_string())
        );
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_parse_ignores_toolchain_line() {
        let dir = temp_project("toolchain");
        fs::write(
            dir.join("go.mod"),
            "module example.com/app\n\ngo 1.23\n\ntoolchain go1.23.4\n",
        )
        .unwrap();
        assert_eq!(
            parse_go_version_from_file(&dir.join("go.mod")),
            Some("1.23".to_string())
        );
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_parse_missing_file() {
        assert_eq!(parse_go_version_from_file(Path::new("/nonexistent/go.mod")), None);
    }

    #[test]
    fn test_parse_no_go_directive() {
        let dir = temp_project("nodirective");
        fs::write(dir.join("go.mod"), "module example.com/app\n").unwrap();
        assert_eq!(parse_go_version_from_file(&dir.join("go.mod")), None);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_go_version_file_normalized() {
        let dir = temp_project("pinfile");
        fs::write(dir.join(".go-version"), "1.22.4\n").unwrap();
        assert_eq!(read_go_version_file(&dir), Some("1.22".to_string()));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_go_version_file_empty() {
        let dir = temp_project("pinempty");
        fs::write(dir.join(".go-version"), "   \n").unwrap();
        assert_eq!(read_go_version_file(&dir), None);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_detect_priority_go_mod_first() {
        let dir = temp_project("priority1");
        fs::write(dir.join("go.mod"), "module example.com/app\n\ngo 1.24\n").unwrap();
        fs::write(dir.join(".go-version"), "1.22.0\n").unwrap();
        assert_eq!(detect_go_version(&dir), "1.24");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_detect_priority_pin_over_go_work() {
        let dir = temp_project("priority2");
        fs::write(dir.join(".go-version"), "1.22.0\n").unwrap();
        fs::write(dir.join("go.work"), "go 1.23\n\nuse .\n").unwrap();
        assert_eq!(detect_go_version(&dir), "1.22");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_detect_go_work() {
        let dir = temp_project("gowork");
        fs::write(dir.join("go.work"), "go 1.23\n\nuse .\n").unwrap();
        assert_eq!(detect_go_version(&dir), "1.23");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_detect_default() {
        let dir = temp_project("default");
        assert_eq!(detect_go_version(&dir), DEFAULT_GO_VERSION);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_detect_go_mod_without_directive_falls_through() {
        let dir = temp_project("fallthrough");
        fs::write(dir.join("go.mod"), "module example.com/app\n").unwrap();
        fs::write(dir.join(".go-version"), "1.20\n").unwrap();
        assert_eq!(detect_go_version(&dir), "1.20");
        fs::remove_dir_all(&dir).unwrap();
    }
}
