//! Type inference state and import classification.
//!
//! This module owns the mutable heart of the analysis:
//! - `FunctionScope` / `VariableBinding`: per-function variable tracking
//!   with full reassignment history (latest binding wins)
//! - `TypeInferenceEngine`: the thread-safe store of scopes and return
//!   types that the extraction passes populate and the call-graph builder
//!   reads for method dispatch
//! - `ImportClassifier`: stdlib / same-module / third-party classification
//!   backed by the authoritative stdlib loader

mod engine;
mod imports;
mod scope;

pub use engine::{normalize_return_type, TypeInferenceEngine};
pub use imports::{is_stdlib_fallback, ImportClassifier, ImportKind};
pub use scope::{FunctionScope, VariableBinding};
