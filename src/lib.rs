//! callmap - whole-program call-graph cartography for Go repositories.
//!
//! Builds a caller→callee graph for an entire Go module, infers enough
//! types to resolve method dispatch, tags every call site that lands in the
//! standard library using a version-pinned manifest, and serves the result
//! to AI tooling over MCP.
//!
//! # Architecture
//!
//! ```text
//! go.mod → Module Registry → Stdlib Manifest → Extraction → Call Graph → MCP
//!    ↓           ↓                 ↓               ↓            ↓          ↓
//! module     dir↔import       version-pinned   tree-sitter  petgraph    rmcp
//! path        mapping         HTTP + redb      Go grammar   DiGraph    stdio
//! ```
//!
//! # Pipeline
//!
//! - Registry: parse go.mod, map every directory to its import path
//! - Stdlib: resolve the toolchain version, fetch the manifest (graceful
//!   degradation when offline - analysis continues, nothing is stdlib)
//! - Extraction, parallel by file: imports, declared return types,
//!   variable bindings
//! - Graph: resolve each call site (alias → import, typed variable →
//!   method dispatch, bare → builtin or same package), emit edges
//! - Server: `get_callees` / `get_callers` / `get_call_details` tools over
//!   the frozen graph

pub mod cache;
pub mod callgraph;
pub mod config;
pub mod discovery;
pub mod extraction;
pub mod mcp;
pub mod registry;
pub mod resolution;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export the core surface
pub use callgraph::{analyze, Analysis, AnalysisStats, CallEdge, CallGraph, FunctionNode};
pub use config::Config;
pub use registry::{ModuleRegistry, StdlibLoader};
pub use resolution::{ImportClassifier, ImportKind, TypeInferenceEngine};
pub use types::{CallSite, ImportMap, Location, TypeInfo, TypeSource};
