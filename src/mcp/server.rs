//! MCP server implementation for callmap.
//!
//! The server owns the frozen analysis artifacts (`Arc<CallGraph>`,
//! `Arc<ModuleRegistry>`) and dispatches each tool call onto a blocking
//! worker under a per-request deadline. A panic inside a handler converts
//! to an error result; the server keeps serving.
//!
//! Tool payloads are serialized into a single JSON text content block, so
//! clients get structured data regardless of transport rendering.

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rmcp::{
    handler::server::{router::tool::ToolRouter, tool::Parameters},
    model::{ErrorCode, ErrorData as McpError, *},
    tool, tool_handler, tool_router, ServerHandler,
};
use serde::{Deserialize, Serialize};

use crate::callgraph::CallGraph;
use crate::registry::ModuleRegistry;
use crate::types::Location;

/// Callmap MCP server - navigation over a built call graph.
#[derive(Clone)]
pub struct CallmapServer {
    graph: Arc<CallGraph>,
    registry: Arc<ModuleRegistry>,
    request_timeout: Duration,
    tool_router: ToolRouter<CallmapServer>,
}

// ---------------------------------------------------------------------------
// Tool request / payload shapes
// ---------------------------------------------------------------------------

/// Request for the get_callees tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetCalleesRequest {
    /// Function to inspect - a short name ("Handle") or an exact FQN.
    #[schemars(description = "Function to inspect: short name or exact FQN")]
    pub function: String,
}

/// Request for the get_callers tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetCallersRequest {
    /// Function to inspect - a short name or an exact FQN.
    #[schemars(description = "Function to inspect: short name or exact FQN")]
    pub function: String,
}

/// Request for the get_call_details tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetCallDetailsRequest {
    /// Calling function - short name or FQN.
    #[schemars(description = "Calling function: short name or exact FQN")]
    pub caller: String,
    /// Called function's short name as written at the call site.
    #[schemars(description = "Callee short name as written at the call site")]
    pub target: String,
}

/// Stdlib metadata attached to stdlib call targets. The package is always
/// present once the import path validates; signature and return types only
/// when the manifest knows them.
#[derive(Debug, Serialize)]
struct StdlibInfo {
    package: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    return_types: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct CalleeEntry {
    target: String,
    target_fqn: String,
    location: Location,
    is_stdlib: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    stdlib_info: Option<StdlibInfo>,
}

#[derive(Debug, Serialize)]
struct CalleesPayload {
    function: String,
    matches: Vec<String>,
    callees: Vec<CalleeEntry>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Serialize)]
struct CallerEntry {
    caller_fqn: String,
    location: Location,
    /// Serialized only when true, so local and third-party callers are not
    /// cluttered with a redundant flag.
    #[serde(skip_serializing_if = "is_false")]
    is_stdlib: bool,
}

#[derive(Debug, Serialize)]
struct CallersPayload {
    function: String,
    matches: Vec<String>,
    callers: Vec<CallerEntry>,
}

#[derive(Debug, Serialize)]
struct Resolution {
    resolved: bool,
    target_fqn: String,
    is_stdlib: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    stdlib_info: Option<StdlibInfo>,
}

#[derive(Debug, Serialize)]
struct CallSiteDetails {
    target: String,
    location: Location,
    resolution: Resolution,
}

#[derive(Debug, Serialize)]
struct CallDetailsPayload {
    caller: String,
    call_site: CallSiteDetails,
}

// ---------------------------------------------------------------------------
// Pure lookup logic (sync, panic-free by construction)
// ---------------------------------------------------------------------------

/// Stdlib metadata for a target FQN, when the loader validates its import
/// path. None when no loader is attached, the FQN cannot be split, or the
/// package is not stdlib.
fn stdlib_info_for_fqn(registry: &ModuleRegistry, fqn: &str) -> Option<StdlibInfo> {
    let loader = registry.stdlib.as_ref()?;

    let dot = fqn.rfind('.')?;
    if dot == 0 {
        return None;
    }
    let (import_path, func_name) = (&fqn[..dot], &fqn[dot + 1..]);

    if !loader.validate(import_path) {
        return None;
    }

    let mut info = StdlibInfo {
        package: import_path.to_string(),
        signature: None,
        return_types: None,
    };

    // Package membership alone is worth reporting; the function may be
    // missing from the manifest.
    if let Some(function) = loader.function(import_path, func_name) {
        if !function.signature.is_empty() {
            info.signature = Some(function.signature.clone());
        }
        let returns: Vec<String> = function
            .returns
            .iter()
            .filter(|r| !r.ty.is_empty())
            .map(|r| r.ty.clone())
            .collect();
        if !returns.is_empty() {
            info.return_types = Some(returns);
        }
    }

    Some(info)
}

fn compute_callees(
    graph: &CallGraph,
    registry: &ModuleRegistry,
    function: &str,
) -> Result<CalleesPayload, String> {
    let matches = graph.resolve_name(function);
    if matches.is_empty() {
        return Err(format!("function not found: {function}"));
    }

    let mut callees = Vec::new();
    for fqn in &matches {
        for site in graph.call_sites(fqn) {
            if !site.resolved {
                continue;
            }
            let stdlib_info = if site.is_stdlib {
                stdlib_info_for_fqn(registry, &site.target_fqn)
            } else {
                None
            };
            callees.push(CalleeEntry {
                target: site.target.clone(),
                target_fqn: site.target_fqn.clone(),
                location: site.location.clone(),
                is_stdlib: site.is_stdlib,
                stdlib_info,
            });
        }
    }

    Ok(CalleesPayload {
        function: function.to_string(),
        matches,
        callees,
    })
}

fn compute_callers(graph: &CallGraph, function: &str) -> Result<CallersPayload, String> {
    let matches = graph.resolve_name(function);
    if matches.is_empty() {
        return Err(format!("function not found: {function}"));
    }

    let mut callers = Vec::new();
    for fqn in &matches {
        for (caller, edge) in graph.callers_of(fqn) {
            // Pull the matching call site back out of the caller's table
            // for the precise location and the stdlib verdict.
            let site = graph
                .call_sites(&caller.fqn)
                .iter()
                .find(|s| s.resolved && s.target_fqn == *fqn && s.location.line == edge.line)
                .cloned();

            let (location, is_stdlib) = match site {
                Some(site) => (site.location, site.is_stdlib),
                None => (Location::new(&caller.file, edge.line), false),
            };

            callers.push(CallerEntry {
                caller_fqn: caller.fqn.clone(),
                location,
                is_stdlib,
            });
        }
    }

    Ok(CallersPayload {
        function: function.to_string(),
        matches,
        callers,
    })
}

fn compute_call_details(
    graph: &CallGraph,
    registry: &ModuleRegistry,
    caller: &str,
    target: &str,
) -> Result<CallDetailsPayload, String> {
    let matches = graph.resolve_name(caller);
    if matches.is_empty() {
        return Err(format!("function not found: {caller}"));
    }

    for caller_fqn in &matches {
        if let Some(site) = graph
            .call_sites(caller_fqn)
            .iter()
            .find(|s| s.target == target)
        {
            let stdlib_info = if site.is_stdlib {
                stdlib_info_for_fqn(registry, &site.target_fqn)
            } else {
                None
            };
            return Ok(CallDetailsPayload {
                caller: caller_fqn.clone(),
                call_site: CallSiteDetails {
                    target: site.target.clone(),
                    location: site.location.clone(),
                    resolution: Resolution {
                        resolved: site.resolved,
                        target_fqn: site.target_fqn.clone(),
                        is_stdlib: site.is_stdlib,
                        stdlib_info,
                    },
                },
            });
        }
    }

    Err(format!("no call site from {caller} to {target}"))
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[tool_router]
impl CallmapServer {
    /// Create a server over frozen analysis artifacts.
    pub fn new(
        graph: Arc<CallGraph>,
        registry: Arc<ModuleRegistry>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            graph,
            registry,
            request_timeout,
            tool_router: Self::tool_router(),
        }
    }

    /// Run tool work on a blocking worker under the per-request deadline.
    /// Timeouts and panics both surface as error results, never as a dead
    /// server.
    async fn run_tool<T, F>(&self, work: F) -> Result<CallToolResult, McpError>
    where
        T: Serialize + Send + 'static,
        F: FnOnce() -> Result<T, String> + Send + 'static,
    {
        let handle = tokio::task::spawn_blocking(work);
        match tokio::time::timeout(self.request_timeout, handle).await {
            Err(_) => Ok(CallToolResult::error(vec![Content::text(
                "request deadline exceeded",
            )])),
            Ok(Err(join_err)) => Ok(CallToolResult::error(vec![Content::text(format!(
                "internal error: {join_err}"
            ))])),
            Ok(Ok(Err(message))) => Ok(CallToolResult::error(vec![Content::text(message)])),
            Ok(Ok(Ok(payload))) => {
                let json = serde_json::to_string_pretty(&payload).map_err(|e| McpError {
                    code: ErrorCode(-32603),
                    message: Cow::from(format!("JSON serialization failed: {e}")),
                    data: None,
                })?;
                Ok(CallToolResult::success(vec![Content::text(json)]))
            }
        }
    }

    /// List the functions a given function calls.
    ///
    /// Each callee carries its resolved FQN, source location, and stdlib
    /// verdict; stdlib callees additionally carry a `stdlib_info` block
    /// with the package, signature, and return types when the manifest
    /// loader is present.
    #[tool(
        name = "get_callees",
        description = "List the functions a given function calls, with source locations and stdlib metadata. The function may be a short name or an exact fully-qualified name; ambiguous short names return all matches."
    )]
    async fn get_callees(
        &self,
        Parameters(request): Parameters<GetCalleesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let graph = self.graph.clone();
        let registry = self.registry.clone();
        self.run_tool(move || compute_callees(&graph, &registry, &request.function))
            .await
    }

    /// List the functions that call a given function.
    #[tool(
        name = "get_callers",
        description = "List the functions that call a given function, with the call-site location of each. The function may be a short name or an exact fully-qualified name."
    )]
    async fn get_callers(
        &self,
        Parameters(request): Parameters<GetCallersRequest>,
    ) -> Result<CallToolResult, McpError> {
        let graph = self.graph.clone();
        self.run_tool(move || compute_callers(&graph, &request.function))
            .await
    }

    /// Inspect one call site between two named parties.
    #[tool(
        name = "get_call_details",
        description = "Inspect a single call site between a caller and a callee: resolution verdict, qualified target, stdlib metadata when applicable."
    )]
    async fn get_call_details(
        &self,
        Parameters(request): Parameters<GetCallDetailsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let graph = self.graph.clone();
        let registry = self.registry.clone();
        self.run_tool(move || {
            compute_call_details(&graph, &registry, &request.caller, &request.target)
        })
        .await
    }
}

#[tool_handler]
impl ServerHandler for CallmapServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "callmap".into(),
                version: env!("CARGO_PKG_VERSION").into(),
            },
            instructions: Some(
                "Whole-program Go call-graph navigation. \
                 Use get_callees / get_callers to walk caller-callee \
                 relationships and get_call_details to inspect a single \
                 call site, including standard-library metadata."
                    .to_string(),
            ),
        }
    }
}
