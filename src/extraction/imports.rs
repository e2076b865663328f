//! Import extraction: package clause and import specs → `ImportMap`.
//!
//! Handles all four alias shapes a Go import spec can take:
//!
//! ```go
//! import "fmt"                    // default alias: "fmt"
//! import h "net/http"             // explicit rename: "h"
//! import . "fmt"                  // dot import: "."
//! import _ "github.com/lib/pq"    // side-effect only: "_"
//! ```

use anyhow::Result;
use tree_sitter::Node;

use crate::extraction::parser::{node_text, GoParser};
use crate::types::ImportMap;

/// Parse a Go file and collect its package name and import bindings.
pub fn extract_imports(parser: &mut GoParser, file_path: &str, source: &str) -> Result<ImportMap> {
    let mut import_map = ImportMap::new(file_path);

    let tree = parser
        .parse(source)
        .ok_or_else(|| anyhow::anyhow!("failed to parse {file_path}"))?;
    let root = tree.root_node();

    // Package clause first.
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        if child.kind() == "package_clause" {
            let mut inner = child.walk();
            for pkg in child.named_children(&mut inner) {
                if pkg.kind() == "package_identifier" {
                    import_map.package_name = node_text(pkg, source).to_string();
                    break;
                }
            }
            break;
        }
    }

    collect_imports(root, source, &mut import_map);

    Ok(import_map)
}

/// Recursively find import declarations. Imports only appear at the top
/// level, but walking keeps this robust against wrapper nodes.
fn collect_imports(node: Node, source: &str, import_map: &mut ImportMap) {
    if node.kind() == "import_declaration" {
        process_import_declaration(node, source, import_map);
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_imports(child, source, import_map);
    }
}

/// An import_declaration holds either direct import_spec nodes or an
/// import_spec_list (grouped form).
fn process_import_declaration(node: Node, source: &str, import_map: &mut ImportMap) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "import_spec" => process_import_spec(child, source, import_map),
            "import_spec_list" => {
                let mut inner = child.walk();
                for spec in child.named_children(&mut inner) {
                    if spec.kind() == "import_spec" {
                        process_import_spec(spec, source, import_map);
                    }
                }
            }
            _ => {}
        }
    }
}

fn process_import_spec(node: Node, source: &str, import_map: &mut ImportMap) {
    let import_path = node
        .child_by_field_name("path")
        .map(|path| node_text(path, source).trim_matches('"').to_string())
        .unwrap_or_default();

    if import_path.is_empty() {
        return;
    }

    let local_name = match node.child_by_field_name("name") {
        // Explicit alias: a rename, ".", or "_".
        Some(name) => node_text(name, source).to_string(),
        // Default: last segment of the import path.
        None => default_local_name(&import_path).to_string(),
    };

    import_map.add_import(local_name, import_path);
}

/// Default local name of an import path - its last segment.
///
/// "fmt" → "fmt", "net/http" → "http",
/// "github.com/myapp/handlers" → "handlers"
fn default_local_name(import_path: &str) -> &str {
    match import_path.rfind('/') {
        Some(idx) => &import_path[idx + 1..],
        None => import_path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imports_of(source: &str) -> ImportMap {
        let mut parser = GoParser::new().unwrap();
        extract_imports(&mut parser, "main.go", source).unwrap()
    }

    #[test]
    fn test_default_local_name() {
        assert_eq!(default_local_name("fmt"), "fmt");
        assert_eq!(default_local_name("net/http"), "http");
        assert_eq!(default_local_name("github.com/myapp/handlers"), "handlers");
    }

    #[test]
    fn test_simple_imports() {
        let map = imports_of("package main\n\nimport \"fmt\"\nimport \"os\"\n\nfunc main() {}\n");
        assert_eq!(map.package_name, "main");
        assert_eq!(map.lookup("fmt"), Some("fmt"));
        assert_eq!(map.lookup("os"), Some("os"));
    }

    #[test]
    fn test_grouped_imports_with_default_alias() {
        let map = imports_of(
            "package server\n\nimport (\n\t\"fmt\"\n\t\"net/http\"\n)\n\nfunc Serve() {}\n",
        );
        assert_eq!(map.package_name, "server");
        assert_eq!(map.lookup("fmt"), Some("fmt"));
        assert_eq!(map.lookup("http"), Some("net/http"));
    }

    #[test]
    fn test_renamed_import() {
        let map = imports_of("package main\n\nimport h \"net/http\"\n");
        assert_eq!(map.lookup("h"), Some("net/http"));
        assert_eq!(map.lookup("http"), None);
    }

    #[test]
    fn test_dot_import() {
        let map = imports_of("package main\n\nimport . \"fmt\"\n");
        assert_eq!(map.lookup("."), Some("fmt"));
    }

    #[test]
    fn test_blank_import() {
        let map = imports_of("package main\n\nimport _ \"github.com/lib/pq\"\n");
        // Side-effect imports still appear in the map, bound to "_".
        assert_eq!(map.lookup("_"), Some("github.com/lib/pq"));
    }

    #[test]
    fn test_mixed_group() {
        let map = imports_of(
            "package main\n\nimport (\n\t\"strings\"\n\tmyhttp \"net/http\"\n\t_ \"embed\"\n)\n",
        );
        assert_eq!(map.lookup("strings"), Some("strings"));
        assert_eq!(map.lookup("myhttp"), Some("net/http"));
        assert_eq!(map.lookup("_"), Some("embed"));
        assert_eq!(map.imports.len(), 3);
    }

    #[test]
    fn test_no_imports() {
        let map = imports_of("package tiny\n\nfunc F() {}\n");
        assert_eq!(map.package_name, "tiny");
        assert!(map.imports.is_empty());
    }
}
