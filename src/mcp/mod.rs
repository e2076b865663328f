//! MCP (Model Context Protocol) server for callmap.
//!
//! Exposes the frozen call graph to AI assistants over stdio:
//!
//! - `get_callees`: what a function calls, with stdlib enrichment
//! - `get_callers`: what calls a function
//! - `get_call_details`: one call site between two named parties
//!
//! # Architecture
//!
//! ```text
//! MCP Request → graph lookup → MCP Response
//!     ↓              ↓              ↓
//! JSON-RPC      Arc<CallGraph>   JSON-RPC
//! over stdio    (immutable)      over stdio
//! ```

mod server;

pub use server::CallmapServer;
