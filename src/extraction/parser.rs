//! Tree-sitter Go parser wrapper.
//!
//! One `GoParser` per worker thread; tree-sitter parser state is not
//! thread-safe. The wrapper pins the Go grammar at construction so parse
//! call sites stay one-liners.

use anyhow::{Context, Result};
use tree_sitter::{Language, Node, Parser as TsParser, Tree};

/// A tree-sitter parser configured for Go.
pub struct GoParser {
    parser: TsParser,
}

impl GoParser {
    pub fn new() -> Result<Self> {
        let mut parser = TsParser::new();
        let language: Language = tree_sitter_go::LANGUAGE.into();
        parser
            .set_language(&language)
            .context("failed to load Go grammar")?;
        Ok(Self { parser })
    }

    /// Parse Go source. None when tree-sitter gives up entirely
    /// (cancellation or grammar failure); syntax errors still yield a tree.
    pub fn parse(&mut self, source: &str) -> Option<Tree> {
        self.parser.parse(source, None)
    }
}

/// Text of a node within its source. Empty on any UTF-8 boundary error.
pub fn node_text<'s>(node: Node, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// 1-indexed line of a node's start.
pub fn node_line(node: Node) -> u32 {
    node.start_position().row as u32 + 1
}

/// 0-indexed column of a node's start.
pub fn node_column(node: Node) -> u32 {
    node.start_position().column as u32
}
