//! End-to-end analysis pipeline.
//!
//! ```text
//! go.mod → ModuleRegistry → StdlibLoader (optional)
//!              ↓
//!   discover .go files → read once
//!              ↓
//!   pass A: imports + return types   (parallel by file)
//!   pass B: variable bindings        (parallel by file)
//!   pass C: call extraction          (parallel by file, single-writer merge)
//!              ↓
//!   frozen Arc<CallGraph> for the query server
//! ```
//!
//! Per-file failures are logged and skipped; only a broken go.mod aborts.
//! The pipeline always yields some graph for a well-formed project.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use dashmap::DashMap;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::callgraph::builder::extract_file_calls;
use crate::callgraph::graph::CallGraph;
use crate::config::Config;
use crate::discovery::find_go_files;
use crate::extraction::{
    extract_imports, extract_return_types, extract_variable_bindings, GoParser,
};
use crate::registry::{init_stdlib_loader, ModuleRegistry};
use crate::resolution::{ImportClassifier, ImportKind, TypeInferenceEngine};
use crate::types::ImportMap;

/// Everything one analysis run produces. The graph and engine are frozen
/// and shareable across server workers.
pub struct Analysis {
    pub registry: Arc<ModuleRegistry>,
    pub engine: Arc<TypeInferenceEngine>,
    pub graph: Arc<CallGraph>,
    pub stats: AnalysisStats,
}

/// Counters describing one run, for the CLI summary and logs.
#[derive(Debug, Default, Clone, Serialize)]
pub struct AnalysisStats {
    pub files: usize,
    pub skipped_files: usize,
    pub packages: usize,
    pub functions: usize,
    pub edges: usize,
    pub call_sites: usize,
    pub resolved_call_sites: usize,
    pub stdlib_call_sites: usize,
    pub return_types: usize,
    pub scopes: usize,
    pub stdlib_imports: usize,
    pub third_party_imports: usize,
    pub local_imports: usize,
}

impl AnalysisStats {
    /// Fraction of call sites the resolver could qualify.
    pub fn resolution_rate(&self) -> f64 {
        if self.call_sites == 0 {
            return 1.0;
        }
        self.resolved_call_sites as f64 / self.call_sites as f64
    }
}

/// Run the whole pipeline for a project root.
pub fn analyze(project_root: &Path, config: &Config) -> Result<Analysis> {
    // Phase 1: module registry. go.mod problems are the only fatal errors.
    let mut registry = ModuleRegistry::build(project_root)?;

    // Phase 2: stdlib manifest - graceful degradation inside.
    init_stdlib_loader(&mut registry, project_root, config);
    let registry = Arc::new(registry);

    // Discover and read every source file once.
    let files = find_go_files(project_root)?;
    info!("discovered {} Go files", files.len());

    let skipped = AtomicUsize::new(0);
    let sources: Vec<(PathBuf, String)> = files
        .into_par_iter()
        .filter_map(|path| match std::fs::read_to_string(&path) {
            Ok(source) => Some((path, source)),
            Err(err) => {
                warn!("skipping unreadable {}: {}", path.display(), err);
                skipped.fetch_add(1, Ordering::Relaxed);
                None
            }
        })
        .collect();

    let engine = Arc::new(TypeInferenceEngine::new(registry.clone()));
    let import_maps: DashMap<PathBuf, ImportMap> = DashMap::new();

    // Pass A: imports + declared return types, parallel by file.
    sources.par_iter().for_each_init(new_worker_parser, |parser, (path, source)| {
        match extract_imports(parser, &path.display().to_string(), source) {
            Ok(map) => {
                import_maps.insert(path.clone(), map);
            }
            Err(err) => {
                warn!("import extraction failed for {}: {}", path.display(), err);
                skipped.fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
        if let Err(err) = extract_return_types(parser, path, source, &engine) {
            debug!("return-type pass failed for {}: {}", path.display(), err);
        }
    });

    // Pass B: variable bindings, needs pass A's return types and imports.
    sources.par_iter().for_each_init(new_worker_parser, |parser, (path, source)| {
        let Some(import_map) = import_maps.get(path) else {
            return;
        };
        if let Err(err) = extract_variable_bindings(parser, path, source, &engine, &import_map) {
            debug!("variable pass failed for {}: {}", path.display(), err);
        }
    });

    // Pass C: call extraction. Parsing stays parallel; emission into the
    // shared graph serializes under a single writer lock.
    let graph = Mutex::new(CallGraph::new());
    sources.par_iter().for_each_init(new_worker_parser, |parser, (path, source)| {
        let Some(import_map) = import_maps.get(path) else {
            return;
        };
        let data = match extract_file_calls(parser, path, source, &engine, &import_map) {
            Ok(data) => data,
            Err(err) => {
                warn!("call extraction failed for {}: {}", path.display(), err);
                return;
            }
        };

        let mut graph = graph.lock().expect("graph lock poisoned");
        for function in data.functions {
            graph.add_function(function);
        }
        for (caller, site) in data.sites {
            if site.resolved {
                graph.add_call(
                    &caller,
                    &site.target_fqn,
                    crate::callgraph::graph::CallEdge {
                        line: site.location.line,
                    },
                );
            }
            graph.add_call_site(&caller, site);
        }
    });

    let graph = graph.into_inner().expect("graph lock poisoned");

    let mut stats = AnalysisStats {
        files: sources.len(),
        skipped_files: skipped.load(Ordering::Relaxed),
        packages: registry.dir_to_import.len(),
        functions: graph.function_count(),
        edges: graph.edge_count(),
        return_types: engine.return_type_count(),
        scopes: engine.scope_count(),
        ..Default::default()
    };
    for node in graph.functions() {
        for site in graph.call_sites(&node.fqn) {
            stats.call_sites += 1;
            if site.resolved {
                stats.resolved_call_sites += 1;
            }
            if site.is_stdlib {
                stats.stdlib_call_sites += 1;
            }
        }
    }

    // Classify every imported path for the run summary.
    let classifier = ImportClassifier::new(&registry);
    for entry in import_maps.iter() {
        for import_path in entry.value().imports.values() {
            match classifier.classify(import_path) {
                ImportKind::Stdlib => stats.stdlib_imports += 1,
                ImportKind::ThirdParty => stats.third_party_imports += 1,
                ImportKind::Local => stats.local_imports += 1,
            }
        }
    }

    info!(
        "call graph: {} functions, {} edges, {} call sites ({:.0}% resolved, {} stdlib)",
        stats.functions,
        stats.edges,
        stats.call_sites,
        stats.resolution_rate() * 100.0,
        stats.stdlib_call_sites,
    );

    Ok(Analysis {
        registry,
        engine,
        graph: Arc::new(graph),
        stats,
    })
}

/// Per-worker parser. Grammar load only fails on an ABI mismatch between
/// tree-sitter and the Go grammar, which is a build defect.
fn new_worker_parser() -> GoParser {
    GoParser::new().expect("Go grammar failed to load")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    fn offline_config() -> Config {
        Config {
            // Nothing listens on port 1 - loader stays absent.
            registry_base_url: "http://127.0.0.1:1".to_string(),
            cache_enabled: false,
            ..Config::default()
        }
    }

    fn write_project(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("callmap_test_pipeline_{name}"));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("util")).unwrap();

        fs::write(
            dir.join("go.mod"),
            "module github.com/example/app\n\ngo 1.21\n",
        )
        .unwrap();
        fs::write(
            dir.join("main.go"),
            "package main\n\nimport (\n\t\"fmt\"\n\t\"github.com/example/app/util\"\n)\n\nfunc main() {\n\tfmt.Println(util.Greeting())\n}\n",
        )
        .unwrap();
        fs::write(
            dir.join("util/util.go"),
            "package util\n\nfunc Greeting() string {\n\treturn \"hello\"\n}\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_analyze_without_stdlib_loader() {
        let dir = write_project("offline");
        let analysis = analyze(&dir, &offline_config()).unwrap();

        assert!(analysis.registry.stdlib.is_none());
        assert_eq!(analysis.registry.module_path, "github.com/example/app");

        let graph = &analysis.graph;
        assert!(graph.function("github.com/example/app.main").is_some());
        assert!(graph
            .function("github.com/example/app/util.Greeting")
            .is_some());

        // fmt.Println resolves via the alias but is never stdlib-tagged
        // without a loader.
        let sites = graph.call_sites("github.com/example/app.main");
        let println = sites.iter().find(|s| s.target == "Println").unwrap();
        assert_eq!(println.target_fqn, "fmt.Println");
        assert!(println.resolved);
        assert!(!println.is_stdlib);

        // Cross-package call through the module-local alias.
        let greeting = sites.iter().find(|s| s.target == "Greeting").unwrap();
        assert_eq!(
            greeting.target_fqn,
            "github.com/example/app/util.Greeting"
        );
        assert!(graph.has_edge(
            "github.com/example/app.main",
            "github.com/example/app/util.Greeting"
        ));

        assert!(analysis.stats.call_sites >= 2);
        assert_eq!(analysis.stats.stdlib_call_sites, 0);

        // With no loader, the classifier falls back to the offline
        // heuristic: "fmt" still counts as a stdlib import.
        assert_eq!(analysis.stats.stdlib_imports, 1);
        assert_eq!(analysis.stats.local_imports, 1);

        // Every resolved call site implies its edge.
        for node in graph.functions() {
            for site in graph.call_sites(&node.fqn) {
                if site.resolved {
                    assert!(
                        graph.has_edge(&node.fqn, &site.target_fqn),
                        "resolved site {} → {} has no edge",
                        node.fqn,
                        site.target_fqn
                    );
                }
            }
        }

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_analyze_with_stdlib_loader() {
        let dir = write_project("online");

        // One-shot manifest server.
        let manifest = serde_json::json!({
            "schemaVersion": "1.0.0",
            "registryVersion": "v1",
            "goVersion": {"major": 1, "minor": 21},
            "packages": [{"importPath": "fmt", "functions": [
                {"name": "Println", "signature": "func Println(a ...any) (n int, err error)",
                 "returns": []}
            ]}]
        })
        .to_string();

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 8192];
                let _ = stream.read(&mut buf);
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{manifest}",
                    manifest.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });

        let config = Config {
            registry_base_url: format!("http://{addr}"),
            cache_enabled: false,
            ..Config::default()
        };
        let analysis = analyze(&dir, &config).unwrap();

        assert!(analysis.registry.stdlib.is_some());

        let sites = analysis.graph.call_sites("github.com/example/app.main");
        let println = sites.iter().find(|s| s.target == "Println").unwrap();
        assert!(println.is_stdlib, "loader validated fmt → stdlib tag");
        assert!(analysis.stats.stdlib_call_sites >= 1);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_analyze_missing_go_mod_fails() {
        let dir = std::env::temp_dir().join("callmap_test_pipeline_nogomod");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        assert!(analyze(&dir, &offline_config()).is_err());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_analyze_survives_unparseable_file() {
        let dir = write_project("broken");
        // Tree-sitter still yields a tree for broken syntax; the passes
        // extract what they can and the run keeps going.
        fs::write(dir.join("broken.go"), "package main\n\nfunc {{{{\n").unwrap();

        let analysis = analyze(&dir, &offline_config()).unwrap();
        assert!(analysis.graph.function_count() > 0);

        fs::remove_dir_all(&dir).unwrap();
    }
}
