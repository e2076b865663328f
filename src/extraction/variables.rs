//! Variable binding inference: the second type-inference pass.
//!
//! Walks every assignment inside every function body and records the latest
//! binding for each assigned name, inferring the RHS type by node kind:
//!
//! ```text
//! GetUser()   → registered return type, else stdlib manifest
//! "Alice"     → builtin.string
//! 42          → builtin.int
//! true        → builtin.bool
//! user        → latest binding of `user` in this scope
//! User{}      → test.User (normalized type name)
//! &User{}     → test.User (pointer-ness discarded)
//! ```
//!
//! Multi-assignment distributes the single inferred RHS type across all LHS
//! targets. That is a deliberate approximation: for `a, b := f()` where `f`
//! returns `(X, Y)`, `b` receives `X`. It is sufficient to resolve
//! subsequent receiver-method dispatch, which is what the call-graph
//! builder needs.

use std::path::Path;

use anyhow::Result;
use tree_sitter::Node;

use crate::extraction::parser::{node_column, node_line, node_text, GoParser};
use crate::extraction::returns::extract_receiver_type;
use crate::resolution::{normalize_return_type, TypeInferenceEngine, VariableBinding};
use crate::types::{ImportMap, Location, TypeInfo, TypeSource};

/// Walk a file and populate the engine's scopes with variable bindings.
///
/// Requires the return-type pass to have run first so call-expression
/// inference can see project-declared signatures. Files not in the module
/// registry are skipped.
pub fn extract_variable_bindings(
    parser: &mut GoParser,
    file_path: &Path,
    source: &str,
    engine: &TypeInferenceEngine,
    import_map: &ImportMap,
) -> Result<()> {
    let Some(package_path) = engine.registry().package_of_file(file_path) else {
        return Ok(());
    };

    let ctx = PassContext {
        source,
        file: file_path.display().to_string(),
        package_path: package_path.to_string(),
        engine,
        import_map,
    };

    let tree = parser
        .parse(source)
        .ok_or_else(|| anyhow::anyhow!("failed to parse {}", file_path.display()))?;

    walk(tree.root_node(), "", &ctx);

    Ok(())
}

struct PassContext<'a> {
    source: &'a str,
    file: String,
    package_path: String,
    engine: &'a TypeInferenceEngine,
    import_map: &'a ImportMap,
}

/// Recursive traversal tracking the enclosing function's FQN.
fn walk(node: Node, current_fqn: &str, ctx: &PassContext) {
    let entered: Option<String> = match node.kind() {
        "function_declaration" => node
            .child_by_field_name("name")
            .map(|name| format!("{}.{}", ctx.package_path, node_text(name, ctx.source))),
        "method_declaration" => {
            match (
                node.child_by_field_name("name"),
                node.child_by_field_name("receiver"),
            ) {
                (Some(name), Some(receiver)) => extract_receiver_type(receiver, ctx.source).map(
                    |receiver_type| {
                        format!(
                            "{}.{receiver_type}.{}",
                            ctx.package_path,
                            node_text(name, ctx.source)
                        )
                    },
                ),
                _ => None,
            }
        }
        "short_var_declaration" | "assignment_statement" => {
            if !current_fqn.is_empty() {
                process_assignment(node, current_fqn, ctx);
            }
            None
        }
        _ => None,
    };

    let current = entered.as_deref().unwrap_or(current_fqn);

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        walk(child, current, ctx);
    }
}

/// Handle `x := value` and `x = value`, including multi-assignment forms.
fn process_assignment(node: Node, function_fqn: &str, ctx: &PassContext) {
    let (Some(left), Some(right)) = (
        node.child_by_field_name("left"),
        node.child_by_field_name("right"),
    ) else {
        return;
    };

    let assigned_from = node_text(right, ctx.source).to_string();

    let mut cursor = left.walk();
    for target in left.named_children(&mut cursor) {
        if target.kind() != "identifier" {
            continue;
        }
        let var_name = node_text(target, ctx.source);
        // The blank identifier is never bound.
        if var_name == "_" {
            continue;
        }

        let Some(type_info) = infer_rhs_type(right, function_fqn, ctx) else {
            continue;
        };

        ctx.engine.bind_variable(
            function_fqn,
            VariableBinding {
                var_name: var_name.to_string(),
                type_info,
                assigned_from: assigned_from.clone(),
                location: Location::new(&ctx.file, node_line(target))
                    .with_column(node_column(target)),
            },
        );
    }
}

/// Infer the type of a RHS expression node. None means "unsupported shape,
/// produce no binding".
fn infer_rhs_type(node: Node, function_fqn: &str, ctx: &PassContext) -> Option<TypeInfo> {
    match node.kind() {
        "interpreted_string_literal" | "raw_string_literal" => Some(literal("builtin.string")),
        "int_literal" => Some(literal("builtin.int")),
        "float_literal" => Some(literal("builtin.float64")),
        "imaginary_literal" => Some(literal("builtin.complex128")),
        "true" | "false" => Some(literal("builtin.bool")),
        "rune_literal" => Some(literal("builtin.rune")),
        "nil" => Some(literal("builtin.nil")),

        "call_expression" => infer_call_type(node, ctx),

        // Variable reference: copy the latest binding's type.
        "identifier" => {
            let var_name = node_text(node, ctx.source);
            ctx.engine.latest_binding_type(function_fqn, var_name)
        }

        // Struct literal: the written type name, normalized like a declared
        // return type.
        "composite_literal" => {
            let type_node = node.child_by_field_name("type")?;
            let type_name = node_text(type_node, ctx.source);
            normalize_return_type(type_name, &ctx.package_path)
                .map(|fqn| TypeInfo::new(fqn, 1.0, TypeSource::Literal))
        }

        // Only the address-of operator is handled; other unary operators
        // leave the target unbound.
        "unary_expression" => {
            let operator = node.child_by_field_name("operator")?;
            if node_text(operator, ctx.source) != "&" {
                return None;
            }
            let operand = node.child_by_field_name("operand")?;
            infer_rhs_type(operand, function_fqn, ctx)
        }

        // Multi-assignment RHS: distribute the first element's type.
        "expression_list" => {
            let first = node.named_child(0)?;
            infer_rhs_type(first, function_fqn, ctx)
        }

        _ => None,
    }
}

fn literal(type_fqn: &str) -> TypeInfo {
    TypeInfo::new(type_fqn, 1.0, TypeSource::Literal)
}

/// Infer from a call expression: registered declarations first, then the
/// stdlib manifest for qualified stdlib calls.
fn infer_call_type(call: Node, ctx: &PassContext) -> Option<TypeInfo> {
    let function = call.child_by_field_name("function")?;
    let target = call_target_name(function, ctx)?;

    let qualified = if target.contains('.') {
        target
    } else {
        format!("{}.{target}", ctx.package_path)
    };

    if let Some(info) = ctx.engine.registered_return_type(&qualified) {
        return Some(info);
    }

    let dot = qualified.rfind('.')?;
    if dot == 0 {
        return None;
    }
    ctx.engine
        .stdlib_return_type(&qualified[..dot], &qualified[dot + 1..])
}

/// Name a call targets, qualified through the import map when the selector
/// operand is a package alias.
///
/// `foo()` → "foo"; `http.Get()` → "net/http.Get" (alias resolved);
/// `obj.Method()` → "Method" (resolution deferred to the graph builder).
fn call_target_name(function: Node, ctx: &PassContext) -> Option<String> {
    match function.kind() {
        "identifier" => Some(node_text(function, ctx.source).to_string()),
        "selector_expression" => {
            let field = function.child_by_field_name("field")?;
            let field_name = node_text(field, ctx.source);

            let Some(operand) = function.child_by_field_name("operand") else {
                return Some(field_name.to_string());
            };
            let operand_name = node_text(operand, ctx.source);

            match ctx.import_map.lookup(operand_name) {
                Some(import_path) => Some(format!("{import_path}.{field_name}")),
                None => Some(field_name.to_string()),
            }
        }
        _ => None,
    }
}
