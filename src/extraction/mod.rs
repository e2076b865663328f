//! Tree-sitter-driven extraction from Go source.
//!
//! Three per-file passes, all embarrassingly parallel by file:
//! - `imports`: package clause + import specs → `ImportMap`
//! - `returns`: declared return types of top-level functions and methods
//! - `variables`: assignment-by-assignment variable type inference
//!
//! Each pass parses the file independently with its own `GoParser`
//! (tree-sitter parsers are not thread-safe, so every worker owns one).

mod imports;
mod parser;
mod returns;
mod variables;

pub use imports::extract_imports;
pub use parser::{node_column, node_line, node_text, GoParser};
pub use returns::extract_return_types;
pub use variables::extract_variable_bindings;

pub(crate) use returns::extract_receiver_type;
