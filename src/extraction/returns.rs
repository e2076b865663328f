//! Return-type extraction: the first type-inference pass.
//!
//! For every top-level function and method declaration, record the primary
//! return type - the first declared return that is neither empty nor the
//! bare `error` type. Later passes use these entries to type variables
//! assigned from call expressions.

use std::path::Path;

use anyhow::Result;
use tree_sitter::Node;

use crate::extraction::parser::{node_text, GoParser};
use crate::resolution::{normalize_return_type, TypeInferenceEngine};
use crate::types::{TypeInfo, TypeSource};

/// Confidence attached to return types read from user declarations.
const DECLARATION_CONFIDENCE: f64 = 0.95;

/// Walk a file's top-level declarations and register each function's
/// primary return type with the engine.
///
/// Files whose directory is not in the module registry (vendored or
/// external code) are skipped silently.
pub fn extract_return_types(
    parser: &mut GoParser,
    file_path: &Path,
    source: &str,
    engine: &TypeInferenceEngine,
) -> Result<()> {
    let Some(package_path) = engine.registry().package_of_file(file_path) else {
        return Ok(());
    };
    let package_path = package_path.to_string();

    let tree = parser
        .parse(source)
        .ok_or_else(|| anyhow::anyhow!("failed to parse {}", file_path.display()))?;
    let root = tree.root_node();

    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        match child.kind() {
            "function_declaration" => {
                let Some(name) = child.child_by_field_name("name") else {
                    continue;
                };
                let fqn = format!("{package_path}.{}", node_text(name, source));
                register_primary_return(child, source, &fqn, &package_path, engine);
            }
            "method_declaration" => {
                let (Some(name), Some(receiver)) = (
                    child.child_by_field_name("name"),
                    child.child_by_field_name("receiver"),
                ) else {
                    continue;
                };
                let Some(receiver_type) = extract_receiver_type(receiver, source) else {
                    continue;
                };
                let fqn = format!(
                    "{package_path}.{receiver_type}.{}",
                    node_text(name, source)
                );
                register_primary_return(child, source, &fqn, &package_path, engine);
            }
            _ => {}
        }
    }

    Ok(())
}

/// Record the first usable declared return type for `fqn`, if any.
fn register_primary_return(
    decl: Node,
    source: &str,
    fqn: &str,
    package_path: &str,
    engine: &TypeInferenceEngine,
) {
    let Some(result) = decl.child_by_field_name("result") else {
        return;
    };

    for raw in collect_return_types(result, source) {
        if raw.is_empty() || raw == "error" {
            continue;
        }
        if let Some(type_fqn) = normalize_return_type(&raw, package_path) {
            engine.add_return_type(
                fqn,
                TypeInfo::new(type_fqn, DECLARATION_CONFIDENCE, TypeSource::Declaration),
            );
            return;
        }
    }
}

/// Raw type strings of a declared result list, in order.
///
/// A result is either a bare type node (`func F() User`) or a
/// parameter_list (`func F() (User, error)`, possibly with named returns).
fn collect_return_types(result: Node, source: &str) -> Vec<String> {
    if result.kind() != "parameter_list" {
        return vec![node_text(result, source).to_string()];
    }

    let mut types = Vec::new();
    let mut cursor = result.walk();
    for param in result.named_children(&mut cursor) {
        if param.kind() == "parameter_declaration" {
            if let Some(ty) = param.child_by_field_name("type") {
                types.push(node_text(ty, source).to_string());
            }
        }
    }
    types
}

/// Type name of a method receiver, pointer qualifier stripped.
/// `(u User)` and `(u *User)` both yield "User".
pub(crate) fn extract_receiver_type(receiver: Node, source: &str) -> Option<String> {
    let mut cursor = receiver.walk();
    for param in receiver.named_children(&mut cursor) {
        if param.kind() == "parameter_declaration" {
            if let Some(ty) = param.child_by_field_name("type") {
                let name = node_text(ty, source).trim_start_matches('*');
                if !name.is_empty() {
                    return Some(name.to_string());
                }
            }
        }
    }
    None
}
