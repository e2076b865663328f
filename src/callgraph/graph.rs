//! The call graph store.
//!
//! petgraph's DiGraph holds the topology; around it sit three indexes the
//! query server needs: FQN → node, caller FQN → call sites (resolved and
//! unresolved), and short name → declared FQNs.
//!
//! Reverse edges are petgraph's incoming direction, so the edge /
//! reverse-edge mirror is consistent by construction. Duplicate edges
//! between the same pair are allowed - one per call site.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;

use crate::types::CallSite;

/// A function known to the graph: declared in the project, or synthesized
/// as a callee endpoint (stdlib / third-party), in which case `file` is
/// empty and `line` is 0.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionNode {
    pub fqn: String,
    /// Short name - the last `.`-separated segment of the FQN.
    pub name: String,
    pub file: String,
    pub line: u32,
}

impl FunctionNode {
    pub fn new(fqn: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        let fqn = fqn.into();
        let name = short_name(&fqn).to_string();
        Self {
            fqn,
            name,
            file: file.into(),
            line,
        }
    }

    fn stub(fqn: &str) -> Self {
        Self::new(fqn, "", 0)
    }
}

/// Last `.`-separated segment of an FQN.
pub(crate) fn short_name(fqn: &str) -> &str {
    fqn.rsplit('.').next().unwrap_or(fqn)
}

/// One call relationship. Multiple edges between the same pair are normal -
/// one per call site.
#[derive(Debug, Clone, Serialize)]
pub struct CallEdge {
    /// Line of the call expression in the caller's file.
    pub line: u32,
}

/// The whole-program call graph. Append-only during construction, frozen
/// (shared immutably) for the query server.
#[derive(Default)]
pub struct CallGraph {
    graph: DiGraph<FunctionNode, CallEdge>,
    /// FQN → node index.
    index: HashMap<String, NodeIndex>,
    /// Caller FQN → call sites in emission order.
    call_sites: HashMap<String, Vec<CallSite>>,
    /// Short name → FQNs of declared functions bearing that name.
    short_names: HashMap<String, Vec<String>>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a declared function. Idempotent; a stub node created earlier by
    /// an edge gets upgraded with the declaration's file and line.
    pub fn add_function(&mut self, node: FunctionNode) -> NodeIndex {
        let fqn = node.fqn.clone();
        let name = node.name.clone();

        let idx = match self.index.get(&fqn) {
            Some(&idx) => {
                if let Some(weight) = self.graph.node_weight_mut(idx) {
                    *weight = node;
                }
                idx
            }
            None => {
                let idx = self.graph.add_node(node);
                self.index.insert(fqn.clone(), idx);
                idx
            }
        };

        let fqns = self.short_names.entry(name).or_default();
        if !fqns.contains(&fqn) {
            fqns.push(fqn);
        }

        idx
    }

    /// Node for an edge endpoint, created as a stub when unseen. Stubs do
    /// not enter the short-name index; only declarations do.
    fn ensure_node(&mut self, fqn: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(fqn) {
            return idx;
        }
        let idx = self.graph.add_node(FunctionNode::stub(fqn));
        self.index.insert(fqn.to_string(), idx);
        idx
    }

    /// Add a call edge; endpoints are auto-created.
    pub fn add_call(&mut self, caller_fqn: &str, callee_fqn: &str, edge: CallEdge) {
        let caller = self.ensure_node(caller_fqn);
        let callee = self.ensure_node(callee_fqn);
        self.graph.add_edge(caller, callee, edge);
    }

    /// Record a call site under its caller.
    pub fn add_call_site(&mut self, caller_fqn: &str, site: CallSite) {
        self.call_sites
            .entry(caller_fqn.to_string())
            .or_default()
            .push(site);
    }

    /// Call sites recorded for a caller, in emission order.
    pub fn call_sites(&self, caller_fqn: &str) -> &[CallSite] {
        self.call_sites
            .get(caller_fqn)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn function(&self, fqn: &str) -> Option<&FunctionNode> {
        self.index.get(fqn).and_then(|&idx| self.graph.node_weight(idx))
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionNode> {
        self.graph.node_weights()
    }

    pub fn function_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Outgoing calls of a function: (callee, edge).
    pub fn callees_of(&self, fqn: &str) -> Vec<(&FunctionNode, &CallEdge)> {
        let Some(&idx) = self.index.get(fqn) else {
            return vec![];
        };
        self.graph
            .edges(idx)
            .filter_map(|e| {
                let target = self.graph.node_weight(e.target())?;
                Some((target, e.weight()))
            })
            .collect()
    }

    /// Incoming calls of a function: (caller, edge).
    pub fn callers_of(&self, fqn: &str) -> Vec<(&FunctionNode, &CallEdge)> {
        let Some(&idx) = self.index.get(fqn) else {
            return vec![];
        };
        self.graph
            .edges_directed(idx, petgraph::Direction::Incoming)
            .filter_map(|e| {
                let source = self.graph.node_weight(e.source())?;
                Some((source, e.weight()))
            })
            .collect()
    }

    /// Whether at least one edge caller → callee exists.
    pub fn has_edge(&self, caller_fqn: &str, callee_fqn: &str) -> bool {
        self.callees_of(caller_fqn)
            .iter()
            .any(|(node, _)| node.fqn == callee_fqn)
    }

    /// Resolve a user-supplied function name to FQNs. Accepts an exact FQN
    /// or a short name; short names may be ambiguous, so a set comes back.
    pub fn resolve_name(&self, name: &str) -> Vec<String> {
        if name.contains('.') && self.index.contains_key(name) {
            return vec![name.to_string()];
        }
        self.short_names.get(name).cloned().unwrap_or_default()
    }

    /// Declared functions bearing a short name.
    pub fn find_by_name(&self, name: &str) -> Vec<&FunctionNode> {
        self.short_names
            .get(name)
            .map(|fqns| fqns.iter().filter_map(|f| self.function(f)).collect())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for CallGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallGraph")
            .field("functions", &self.graph.node_count())
            .field("edges", &self.graph.edge_count())
            .field("callers_with_sites", &self.call_sites.len())
            .finish()
    }
}
