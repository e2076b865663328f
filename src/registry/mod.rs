//! Module registry and stdlib manifest loading.
//!
//! Two build-time concerns live here:
//! - `module`: parse go.mod and map every project directory to its import
//!   path (and back), producing the process-wide `ModuleRegistry`
//! - `version` + `stdlib`: resolve the toolchain version and fetch the
//!   version-pinned stdlib manifest that makes `is_stdlib` authoritative
//!
//! The registry is built once, then shared read-only across the parallel
//! extraction passes. The stdlib loader is optional: when the manifest
//! cannot be fetched the rest of the pipeline keeps working, it just never
//! tags anything as stdlib.

mod module;
mod stdlib;
mod version;

pub use module::ModuleRegistry;
pub use stdlib::{
    init_stdlib_loader, manifest_url, Manifest, PackageEntry, ReturnValue, StdlibFunction,
    StdlibLoader, StdlibRegistry, StdlibType, VersionInfo,
};
pub use version::{detect_go_version, normalize_go_version, DEFAULT_GO_VERSION};
