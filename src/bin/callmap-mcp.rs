//! callmap MCP server binary.
//!
//! Builds the call graph for a Go project, then serves it over MCP on
//! stdio. This enables AI assistants to navigate caller/callee
//! relationships and inspect call sites with stdlib metadata.
//!
//! # Usage
//!
//! ```bash
//! callmap-mcp /path/to/go/project
//! ```
//!
//! Logging goes to stderr; stdout carries the JSON-RPC transport.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rmcp::{transport::stdio, ServiceExt};

use callmap::callgraph::analyze;
use callmap::config::Config;
use callmap::mcp::CallmapServer;

/// Serve a Go project's call graph over MCP (stdio transport).
#[derive(Parser, Debug)]
#[command(name = "callmap-mcp")]
#[command(version)]
struct Cli {
    /// Project root containing go.mod
    #[arg(value_name = "ROOT", default_value = ".")]
    root: PathBuf,

    /// Override the stdlib manifest registry base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Skip the on-disk manifest cache
    #[arg(long)]
    no_cache: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout is the MCP transport; keep logs on stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("callmap=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(&cli.root);
    if let Some(base_url) = cli.base_url {
        config.registry_base_url = base_url;
    }
    if cli.no_cache {
        config.cache_enabled = false;
    }
    let request_timeout = config.request_timeout;

    // Graph construction is blocking work (file I/O, parsing); keep the
    // runtime's core threads free.
    let root = cli.root.clone();
    let analysis = tokio::task::spawn_blocking(move || analyze(&root, &config)).await??;

    let server = CallmapServer::new(analysis.graph, analysis.registry, request_timeout);
    let service = server.serve(stdio()).await?;

    // Runs until the client disconnects.
    service.waiting().await?;

    Ok(())
}
