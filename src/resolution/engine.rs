//! Thread-safe type inference engine.
//!
//! The engine is the only mutable shared object during extraction. Two maps
//! behind read/write locks:
//! - scopes: function FQN → variable bindings (populated by the variable
//!   pass, read by the call-graph builder for method dispatch)
//! - return types: function FQN → primary return type (populated by the
//!   return-type pass, read by the variable pass)
//!
//! Return-type lookups fall back to the stdlib manifest when the local table
//! misses. The local table always wins, so a project can shadow a stdlib
//! signature with its own declaration.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::registry::ModuleRegistry;
use crate::resolution::scope::{FunctionScope, VariableBinding};
use crate::types::{TypeInfo, TypeSource};

/// Go primitive and distinguished type names that qualify as `builtin.<name>`.
const PRIMITIVES: &[&str] = &[
    "string", "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16", "uint32",
    "uint64", "uintptr", "float32", "float64", "complex64", "complex128", "bool", "byte", "rune",
    "error",
];

/// Convert a raw return-type string into a fully-qualified type name.
///
/// `import_path` is the package the function belongs to, used to qualify
/// type names local to that package. Pointer and slice qualifiers are
/// stripped; the pipeline tracks the underlying type only.
///
/// ```text
/// "*Request",  "net/http"  → "net/http.Request"
/// "File",      "os"        → "os.File"
/// "string",    "fmt"       → "builtin.string"
/// "io.Reader", "net/http"  → "io.Reader"
/// "[]byte",    "os"        → "builtin.byte"
/// ```
///
/// Pure function of its inputs, and idempotent: a normalized FQN always
/// contains a `.` and passes through unchanged.
pub fn normalize_return_type(raw_type: &str, import_path: &str) -> Option<String> {
    let t = raw_type.strip_prefix('*').unwrap_or(raw_type);
    let t = t.strip_prefix("[]").unwrap_or(t);
    if t.is_empty() {
        return None;
    }
    if PRIMITIVES.contains(&t) {
        return Some(format!("builtin.{t}"));
    }
    // Cross-package reference already qualified (e.g. "io.Reader").
    if t.contains('.') {
        return Some(t.to_string());
    }
    // Unqualified name belongs to the function's own package.
    Some(format!("{import_path}.{t}"))
}

/// Shared type-inference state for one analysis run.
pub struct TypeInferenceEngine {
    /// Function FQN → variable scope.
    scopes: RwLock<HashMap<String, FunctionScope>>,
    /// Function FQN → primary return type.
    return_types: RwLock<HashMap<String, TypeInfo>>,
    /// Module registry, providing the optional stdlib loader.
    registry: Arc<ModuleRegistry>,
}

impl TypeInferenceEngine {
    pub fn new(registry: Arc<ModuleRegistry>) -> Self {
        Self {
            scopes: RwLock::new(HashMap::new()),
            return_types: RwLock::new(HashMap::new()),
            registry,
        }
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    // ----- scopes -----

    /// Record a variable binding in the named function's scope, creating the
    /// scope on first use.
    pub fn bind_variable(&self, function_fqn: &str, binding: VariableBinding) {
        let mut scopes = self.scopes.write().expect("scope lock poisoned");
        scopes
            .entry(function_fqn.to_string())
            .or_insert_with(|| FunctionScope::new(function_fqn))
            .add_variable(binding);
    }

    pub fn has_scope(&self, function_fqn: &str) -> bool {
        self.scopes
            .read()
            .expect("scope lock poisoned")
            .contains_key(function_fqn)
    }

    /// Latest binding of `var_name` in the named function's scope.
    pub fn latest_binding(&self, function_fqn: &str, var_name: &str) -> Option<VariableBinding> {
        let scopes = self.scopes.read().expect("scope lock poisoned");
        scopes.get(function_fqn)?.variable(var_name).cloned()
    }

    /// Type of the latest binding of `var_name`, if any.
    pub fn latest_binding_type(&self, function_fqn: &str, var_name: &str) -> Option<TypeInfo> {
        self.latest_binding(function_fqn, var_name)
            .map(|b| b.type_info)
    }

    /// Full binding history of `var_name` in assignment order.
    pub fn all_bindings(&self, function_fqn: &str, var_name: &str) -> Vec<VariableBinding> {
        let scopes = self.scopes.read().expect("scope lock poisoned");
        scopes
            .get(function_fqn)
            .map(|s| s.all_bindings(var_name).to_vec())
            .unwrap_or_default()
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.read().expect("scope lock poisoned").len()
    }

    // ----- return types -----

    /// Register a function's primary return type. Later registrations
    /// overwrite earlier ones.
    pub fn add_return_type(&self, function_fqn: &str, type_info: TypeInfo) {
        let mut types = self.return_types.write().expect("type lock poisoned");
        types.insert(function_fqn.to_string(), type_info);
    }

    pub fn has_return_type(&self, function_fqn: &str) -> bool {
        self.return_types
            .read()
            .expect("type lock poisoned")
            .contains_key(function_fqn)
    }

    /// Locally-registered return type only - no stdlib fallback. The
    /// variable-inference pass uses this so its own stdlib lookup can carry
    /// the deeper-fallback confidence.
    pub fn registered_return_type(&self, function_fqn: &str) -> Option<TypeInfo> {
        self.return_types
            .read()
            .expect("type lock poisoned")
            .get(function_fqn)
            .cloned()
    }

    /// Return type for a function FQN.
    ///
    /// Lookup order:
    /// 1. Locally-registered declarations - user code always wins, which
    ///    lets a project shadow a stdlib signature.
    /// 2. Stdlib manifest: the FQN is split on its last `.` into import path
    ///    and function name; the first non-error, non-empty return is
    ///    normalized and reported with confidence 1.0, source `stdlib`.
    pub fn return_type(&self, function_fqn: &str) -> Option<TypeInfo> {
        if let Some(info) = self.registered_return_type(function_fqn) {
            return Some(info);
        }

        let loader = self.registry.stdlib.as_ref()?;
        let dot = function_fqn.rfind('.')?;
        if dot == 0 {
            return None;
        }
        let (import_path, func_name) = (&function_fqn[..dot], &function_fqn[dot + 1..]);

        if !loader.validate(import_path) {
            return None;
        }
        let function = loader.function(import_path, func_name)?;
        for ret in &function.returns {
            if ret.ty.is_empty() || ret.ty == "error" {
                continue;
            }
            if let Some(type_fqn) = normalize_return_type(&ret.ty, import_path) {
                return Some(TypeInfo::new(type_fqn, 1.0, TypeSource::Stdlib));
            }
        }
        None
    }

    /// Primary return type of a stdlib function, via the manifest loader.
    ///
    /// This is the deeper fallback used while inferring variable types from
    /// call expressions; it involves one more hop of assumption than the
    /// direct lookup, hence confidence 0.9 and source `stdlib_registry`.
    pub fn stdlib_return_type(&self, import_path: &str, func_name: &str) -> Option<TypeInfo> {
        let loader = self.registry.stdlib.as_ref()?;
        if !loader.validate(import_path) {
            return None;
        }
        let function = loader.function(import_path, func_name)?;
        for ret in &function.returns {
            if ret.ty.is_empty() || ret.ty == "error" {
                continue;
            }
            if let Some(type_fqn) = normalize_return_type(&ret.ty, import_path) {
                return Some(TypeInfo::new(type_fqn, 0.9, TypeSource::StdlibRegistry));
            }
        }
        None
    }

    pub fn return_type_count(&self) -> usize {
        self.return_types.read().expect("type lock poisoned").len()
    }
}
