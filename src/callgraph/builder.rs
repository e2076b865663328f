//! Per-file call extraction and target resolution.
//!
//! The builder walks a parsed file, records every declared function as a
//! graph node, and turns every call expression into a `CallSite`. Target
//! resolution tries, in order: package-alias selector, typed-variable
//! method dispatch, builtin, same-package bare call. Anything else is
//! recorded unresolved - no edge is fabricated.
//!
//! `is_stdlib` comes from exactly one place: a positive verdict from the
//! stdlib loader on the target's import path. Without a loader it is false
//! for every call site.

use std::path::Path;

use anyhow::Result;
use tree_sitter::Node;

use crate::callgraph::graph::FunctionNode;
use crate::extraction::{extract_receiver_type, node_column, node_line, node_text, GoParser};
use crate::resolution::TypeInferenceEngine;
use crate::types::{CallSite, ImportMap, Location};

/// Go's predeclared functions. Calls to these resolve as `builtin.<name>`
/// and are never stdlib-tagged (builtins are not packages).
pub const GO_BUILTINS: &[&str] = &[
    "append", "cap", "clear", "close", "complex", "copy", "delete", "imag", "len", "make", "max",
    "min", "new", "panic", "print", "println", "real", "recover",
];

/// Everything one file contributes to the graph.
#[derive(Debug, Default)]
pub struct FileCallData {
    /// Functions declared in this file.
    pub functions: Vec<FunctionNode>,
    /// (caller FQN, call site) pairs in source order.
    pub sites: Vec<(String, CallSite)>,
}

/// Extract declarations and call sites from one file.
///
/// Files outside the module registry are skipped (empty result). The caller
/// merges the result into the shared graph under its writer lock.
pub fn extract_file_calls(
    parser: &mut GoParser,
    file_path: &Path,
    source: &str,
    engine: &TypeInferenceEngine,
    import_map: &ImportMap,
) -> Result<FileCallData> {
    let Some(package_path) = engine.registry().package_of_file(file_path) else {
        return Ok(FileCallData::default());
    };

    let ctx = BuilderContext {
        source,
        file: file_path.display().to_string(),
        package_path: package_path.to_string(),
        engine,
        import_map,
    };

    let tree = parser
        .parse(source)
        .ok_or_else(|| anyhow::anyhow!("failed to parse {}", file_path.display()))?;

    let mut data = FileCallData::default();
    walk(tree.root_node(), "", &ctx, &mut data);

    Ok(data)
}

struct BuilderContext<'a> {
    source: &'a str,
    file: String,
    package_path: String,
    engine: &'a TypeInferenceEngine,
    import_map: &'a ImportMap,
}

fn walk(node: Node, current_fqn: &str, ctx: &BuilderContext, data: &mut FileCallData) {
    let entered: Option<String> = match node.kind() {
        "function_declaration" => node.child_by_field_name("name").map(|name| {
            let fqn = format!("{}.{}", ctx.package_path, node_text(name, ctx.source));
            data.functions
                .push(FunctionNode::new(&fqn, &ctx.file, node_line(node)));
            fqn
        }),
        "method_declaration" => {
            match (
                node.child_by_field_name("name"),
                node.child_by_field_name("receiver"),
            ) {
                (Some(name), Some(receiver)) => extract_receiver_type(receiver, ctx.source).map(
                    |receiver_type| {
                        let fqn = format!(
                            "{}.{receiver_type}.{}",
                            ctx.package_path,
                            node_text(name, ctx.source)
                        );
                        data.functions
                            .push(FunctionNode::new(&fqn, &ctx.file, node_line(node)));
                        fqn
                    },
                ),
                _ => None,
            }
        }
        "call_expression" => {
            if !current_fqn.is_empty() {
                record_call(node, current_fqn, ctx, data);
            }
            None
        }
        _ => None,
    };

    let current = entered.as_deref().unwrap_or(current_fqn);

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        walk(child, current, ctx, data);
    }
}

/// Turn one call expression into a call site under `caller_fqn`.
fn record_call(call: Node, caller_fqn: &str, ctx: &BuilderContext, data: &mut FileCallData) {
    let Some(function) = call.child_by_field_name("function") else {
        return;
    };

    let (object, name) = match function.kind() {
        "identifier" => (String::new(), node_text(function, ctx.source).to_string()),
        "selector_expression" => {
            let Some(field) = function.child_by_field_name("field") else {
                return;
            };
            let object = function
                .child_by_field_name("operand")
                .map(|op| node_text(op, ctx.source).to_string())
                .unwrap_or_default();
            (object, node_text(field, ctx.source).to_string())
        }
        // Function literals, index expressions, conversions - not call
        // targets this resolver models.
        _ => return,
    };

    let (target_fqn, is_stdlib) = resolve_call_target(&object, &name, caller_fqn, ctx);

    let location = Location::new(&ctx.file, node_line(call)).with_column(node_column(call));

    let site = match target_fqn {
        Some(fqn) => CallSite {
            target: name,
            target_fqn: fqn,
            location,
            resolved: true,
            is_stdlib,
        },
        None => CallSite {
            target: name,
            target_fqn: String::new(),
            location,
            resolved: false,
            is_stdlib: false,
        },
    };

    data.sites.push((caller_fqn.to_string(), site));
}

/// Resolve a call target. Returns (FQN guess, stdlib verdict); None means
/// unresolved.
fn resolve_call_target(
    object: &str,
    name: &str,
    caller_fqn: &str,
    ctx: &BuilderContext,
) -> (Option<String>, bool) {
    if !object.is_empty() {
        // Pattern 1: selector through a package alias.
        if let Some(import_path) = ctx.import_map.lookup(object) {
            let is_stdlib = ctx
                .engine
                .registry()
                .stdlib
                .as_ref()
                .map(|loader| loader.validate(import_path))
                .unwrap_or(false);
            return (Some(format!("{import_path}.{name}")), is_stdlib);
        }

        // Pattern 2: method dispatch through a typed variable.
        if let Some(type_info) = ctx.engine.latest_binding_type(caller_fqn, object) {
            return (Some(format!("{}.{name}", type_info.type_fqn)), false);
        }

        // Unknown receiver - unresolved.
        return (None, false);
    }

    // Pattern 3: bare call - builtin or same-package function.
    if GO_BUILTINS.contains(&name) {
        return (Some(format!("builtin.{name}")), false);
    }
    (Some(format!("{}.{name}", ctx.package_path)), false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::{extract_imports, extract_return_types, extract_variable_bindings};
    use crate::registry::ModuleRegistry;
    use crate::testutil::MockStdlibLoader;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn test_registry(loader: Option<MockStdlibLoader>) -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        registry.module_path = "test".to_string();
        registry.insert_mapping(PathBuf::from("/test"), "test".to_string());
        if let Some(loader) = loader {
            registry.stdlib = Some(Arc::new(loader));
        }
        registry
    }

    /// Run the full per-file pass stack and return the file's call data.
    fn extract(source: &str, loader: Option<MockStdlibLoader>) -> FileCallData {
        let engine = TypeInferenceEngine::new(Arc::new(test_registry(loader)));
        let mut parser = GoParser::new().unwrap();
        let file = Path::new("/test/main.go");

        let import_map = extract_imports(&mut parser, "/test/main.go", source).unwrap();
        extract_return_types(&mut parser, file, source, &engine).unwrap();
        extract_variable_bindings(&mut parser, file, source, &engine, &import_map).unwrap();
        extract_file_calls(&mut parser, file, source, &engine, &import_map).unwrap()
    }

    fn sites_of<'d>(data: &'d FileCallData, caller: &str) -> Vec<&'d CallSite> {
        data.sites
            .iter()
            .filter(|(c, _)| c == caller)
            .map(|(_, s)| s)
            .collect()
    }

    #[test]
    fn test_alias_call_stdlib_tagged() {
        let data = extract(
            "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tfmt.Println(\"hi\")\n}\n",
            Some(MockStdlibLoader::new(&["fmt"])),
        );

        let sites = sites_of(&data, "test.main");
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].target_fqn, "fmt.Println");
        assert!(sites[0].resolved);
        assert!(sites[0].is_stdlib);
    }

    #[test]
    fn test_alias_call_without_loader_never_stdlib() {
        let data = extract(
            "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tfmt.Println(\"hi\")\n}\n",
            None,
        );

        let sites = sites_of(&data, "test.main");
        assert_eq!(sites[0].target_fqn, "fmt.Println");
        assert!(sites[0].resolved);
        assert!(!sites[0].is_stdlib, "no loader → never stdlib");
    }

    #[test]
    fn test_third_party_alias_not_stdlib() {
        let data = extract(
            "package main\n\nimport \"github.com/gin-gonic/gin\"\n\nfunc main() {\n\tgin.Default()\n}\n",
            Some(MockStdlibLoader::new(&["fmt"])),
        );

        let sites = sites_of(&data, "test.main");
        assert_eq!(sites[0].target_fqn, "github.com/gin-gonic/gin.Default");
        assert!(sites[0].resolved);
        assert!(!sites[0].is_stdlib);
    }

    #[test]
    fn test_multi_segment_stdlib_path() {
        let data = extract(
            "package main\n\nimport \"net/http\"\n\nfunc main() {\n\thttp.ListenAndServe(\":80\", nil)\n}\n",
            Some(MockStdlibLoader::new(&["net/http"])),
        );

        let sites = sites_of(&data, "test.main");
        assert_eq!(sites[0].target_fqn, "net/http.ListenAndServe");
        assert!(sites[0].is_stdlib);
    }

    #[test]
    fn test_builtin_call() {
        let data = extract(
            "package main\n\nfunc main() {\n\ts := make([]int, 0)\n\t_ = append(s, 1)\n}\n",
            Some(MockStdlibLoader::new(&["fmt"])),
        );

        let sites = sites_of(&data, "test.main");
        let make_site = sites.iter().find(|s| s.target == "make").unwrap();
        assert_eq!(make_site.target_fqn, "builtin.make");
        assert!(make_site.resolved);
        assert!(!make_site.is_stdlib);

        let append_site = sites.iter().find(|s| s.target == "append").unwrap();
        assert_eq!(append_site.target_fqn, "builtin.append");
    }

    #[test]
    fn test_bare_call_qualified_to_package() {
        let data = extract(
            "package main\n\nfunc helper() {}\n\nfunc main() {\n\thelper()\n}\n",
            None,
        );

        let sites = sites_of(&data, "test.main");
        assert_eq!(sites[0].target_fqn, "test.helper");
        assert!(sites[0].resolved);
    }

    #[test]
    fn test_method_dispatch_through_typed_variable() {
        let source = "package main\n\ntype User struct{}\n\nfunc (u User) Name() string { return \"\" }\n\nfunc main() {\n\tu := User{}\n\t_ = u.Name()\n}\n";
        let data = extract(source, None);

        let sites = sites_of(&data, "test.main");
        let dispatch = sites.iter().find(|s| s.target == "Name").unwrap();
        assert_eq!(dispatch.target_fqn, "test.User.Name");
        assert!(dispatch.resolved);
        assert!(!dispatch.is_stdlib);
    }

    #[test]
    fn test_unknown_receiver_unresolved() {
        let data = extract(
            "package main\n\nfunc main() {\n\tobj.DoThing()\n}\n",
            Some(MockStdlibLoader::new(&["fmt"])),
        );

        let sites = sites_of(&data, "test.main");
        assert_eq!(sites.len(), 1);
        assert!(!sites[0].resolved);
        assert!(sites[0].target_fqn.is_empty());
        assert!(!sites[0].is_stdlib);
        assert_eq!(sites[0].target, "DoThing");
    }

    #[test]
    fn test_declared_functions_recorded() {
        let data = extract(
            "package main\n\ntype Svc struct{}\n\nfunc (s *Svc) Run() {}\n\nfunc main() {}\n",
            None,
        );

        let fqns: Vec<&str> = data.functions.iter().map(|f| f.fqn.as_str()).collect();
        assert!(fqns.contains(&"test.Svc.Run"));
        assert!(fqns.contains(&"test.main"));
        for f in &data.functions {
            assert_eq!(f.file, "/test/main.go");
            assert!(f.line > 0);
        }
    }

    #[test]
    fn test_calls_outside_functions_ignored() {
        // Package-level var initializer - no enclosing function.
        let data = extract("package main\n\nvar x = len(\"abc\")\n", None);
        assert!(data.sites.is_empty());
    }

    #[test]
    fn test_nested_call_arguments_both_recorded() {
        let data = extract(
            "package main\n\nimport \"fmt\"\n\nfunc inner() string { return \"\" }\n\nfunc main() {\n\tfmt.Println(inner())\n}\n",
            Some(MockStdlibLoader::new(&["fmt"])),
        );

        let sites = sites_of(&data, "test.main");
        assert_eq!(sites.len(), 2);
        assert!(sites.iter().any(|s| s.target_fqn == "fmt.Println"));
        assert!(sites.iter().any(|s| s.target_fqn == "test.inner"));
    }

    #[test]
    fn test_file_outside_registry_skipped() {
        let engine = TypeInferenceEngine::new(Arc::new(test_registry(None)));
        let mut parser = GoParser::new().unwrap();
        let import_map = ImportMap::new("/elsewhere/x.go");
        let data = extract_file_calls(
            &mut parser,
            Path::new("/elsewhere/x.go"),
            "package x\n\nfunc F() { G() }\n",
            &engine,
            &import_map,
        )
        .unwrap();
        assert!(data.functions.is_empty());
        assert!(data.sites.is_empty());
    }
}
