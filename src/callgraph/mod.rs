//! Call graph construction.
//!
//! - `graph`: the graph store - functions as nodes, calls as edges, with a
//!   per-caller call-site table and a short-name index for server lookups
//! - `builder`: per-file call extraction and target resolution
//! - `pipeline`: the end-to-end orchestrator (registry → stdlib loader →
//!   parallel extraction passes → frozen graph)
//!
//! Resolution order for a call target:
//!
//! 1. `alias.F()` where the alias is an import → `<importPath>.F`
//!    (stdlib-tagged iff the loader validates the import path)
//! 2. `obj.M()` where `obj` has a known type → `<typeFQN>.M`
//! 3. `f()` → `builtin.f` for Go builtins, else `<currentPackage>.f`
//! 4. otherwise the call site is recorded unresolved; no edge is emitted

mod builder;
mod graph;
mod pipeline;

pub use builder::{extract_file_calls, FileCallData, GO_BUILTINS};
pub use graph::{CallEdge, CallGraph, FunctionNode};
pub use pipeline::{analyze, Analysis, AnalysisStats};
