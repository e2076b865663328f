//! callmap CLI - build and summarize a Go call graph.
//!
//! Runs the full pipeline and prints a summary:
//!
//! 1. Module registry: go.mod + directory ↔ import path mapping
//! 2. Stdlib manifest: version-pinned fetch (cached, optional)
//! 3. Extraction: imports, return types, variable bindings
//! 4. Call graph: resolved edges with stdlib tags
//!
//! For the MCP server over stdio, use the `callmap-mcp` binary.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use owo_colors::OwoColorize;

use callmap::callgraph::analyze;
use callmap::config::Config;

/// Whole-program Go call-graph analysis with stdlib awareness.
///
/// Examples:
///   callmap .                          # analyze the current module
///   callmap ~/src/service --stats      # include most-called functions
///   callmap . --base-url http://...    # point at a manifest mirror
#[derive(Parser, Debug)]
#[command(name = "callmap")]
#[command(version)]
#[command(about, long_about = None)]
struct Cli {
    /// Project root containing go.mod
    #[arg(value_name = "ROOT", default_value = ".")]
    root: PathBuf,

    /// Print the most-called functions after the summary
    #[arg(long)]
    stats: bool,

    /// Override the stdlib manifest registry base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Skip the on-disk manifest cache
    #[arg(long)]
    no_cache: bool,

    /// Verbose logging (debug-level progress on stderr)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "callmap=debug" } else { "callmap=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load(&cli.root);
    if let Some(base_url) = cli.base_url {
        config.registry_base_url = base_url;
    }
    if cli.no_cache {
        config.cache_enabled = false;
    }

    let analysis = analyze(&cli.root, &config)?;
    let stats = &analysis.stats;

    println!(
        "{} {}",
        "module".bold(),
        analysis.registry.module_path.cyan()
    );
    if !analysis.registry.go_version.is_empty() {
        println!("{} {}", "go    ".bold(), analysis.registry.go_version);
    }
    println!(
        "{} {} files, {} packages, {} skipped",
        "source".bold(),
        stats.files,
        stats.packages,
        stats.skipped_files
    );
    println!(
        "{} {} functions, {} edges",
        "graph ".bold(),
        stats.functions.to_string().green(),
        stats.edges.to_string().green()
    );
    println!(
        "{} {} sites, {:.0}% resolved, {} stdlib",
        "calls ".bold(),
        stats.call_sites,
        stats.resolution_rate() * 100.0,
        stats.stdlib_call_sites.to_string().yellow()
    );
    println!(
        "{} {} stdlib, {} third-party, {} local",
        "import".bold(),
        stats.stdlib_imports,
        stats.third_party_imports,
        stats.local_imports
    );
    match &analysis.registry.stdlib {
        Some(loader) => println!(
            "{} {} packages in manifest",
            "stdlib".bold(),
            loader.package_count()
        ),
        None => println!("{} {}", "stdlib".bold(), "manifest unavailable".dimmed()),
    }

    if cli.stats {
        print_most_called(&analysis);
    }

    Ok(())
}

/// Top declared functions by caller count.
fn print_most_called(analysis: &callmap::Analysis) {
    let mut ranked: Vec<(&str, usize)> = analysis
        .graph
        .functions()
        .filter(|f| !f.file.is_empty())
        .map(|f| (f.fqn.as_str(), analysis.graph.callers_of(&f.fqn).len()))
        .filter(|(_, callers)| *callers > 0)
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    if ranked.is_empty() {
        return;
    }

    println!("\n{}", "most called".bold());
    for (fqn, callers) in ranked.iter().take(10) {
        println!("  {:>4}  {}", callers.to_string().green(), fqn);
    }
}
