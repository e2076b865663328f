//! Git-aware Go source file discovery.
//!
//! Uses the `ignore` crate to respect .gitignore and walk directories with
//! parallel traversal. A fixed exclusion set keeps vendored code, build
//! output, and editor metadata out of the analysis; the same set governs the
//! module registry walk so the file universe and the package universe agree.

mod files;

pub use files::{find_go_files, should_skip_dir, EXCLUDED_DIRS};
