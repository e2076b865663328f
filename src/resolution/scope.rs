//! Per-function variable scopes with reassignment tracking.
//!
//! A variable can be bound more than once inside one function:
//!
//! ```go
//! user := GetUser(1)   // binding 1
//! user = NewUser()     // binding 2 (latest)
//! ```
//!
//! Bindings are kept as an ordered list per name - latest is last. Lookups
//! answer with the latest binding; the full history stays available for
//! reassignment queries and diagnostics.

use std::collections::HashMap;

use crate::types::{Location, TypeInfo};

/// A variable's inferred type at one specific assignment.
#[derive(Debug, Clone)]
pub struct VariableBinding {
    /// Variable name ("user", "resp", "cfg").
    pub var_name: String,
    /// Inferred type of the assigned value.
    pub type_info: TypeInfo,
    /// Text of the RHS expression the value came from.
    pub assigned_from: String,
    /// Where the assignment happens.
    pub location: Location,
}

/// Variable bindings for a single function or method body.
#[derive(Debug, Clone, Default)]
pub struct FunctionScope {
    /// FQN of the owning function, e.g. "github.com/myapp/handlers.HandleRequest".
    pub function_fqn: String,
    /// Variable name → bindings in source order; latest is last.
    variables: HashMap<String, Vec<VariableBinding>>,
}

impl FunctionScope {
    pub fn new(function_fqn: impl Into<String>) -> Self {
        Self {
            function_fqn: function_fqn.into(),
            variables: HashMap::new(),
        }
    }

    /// Append a binding. The blank identifier is never bound.
    pub fn add_variable(&mut self, binding: VariableBinding) {
        if binding.var_name == "_" {
            return;
        }
        self.variables
            .entry(binding.var_name.clone())
            .or_default()
            .push(binding);
    }

    /// Latest binding for a variable, if any.
    pub fn variable(&self, var_name: &str) -> Option<&VariableBinding> {
        self.variables.get(var_name)?.last()
    }

    pub fn has_variable(&self, var_name: &str) -> bool {
        self.variables
            .get(var_name)
            .map(|b| !b.is_empty())
            .unwrap_or(false)
    }

    /// Full binding history for a variable, in assignment order.
    pub fn all_bindings(&self, var_name: &str) -> &[VariableBinding] {
        self.variables
            .get(var_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of distinct variables bound in this scope.
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }
}
