//! Configuration loading from callmap.toml.
//!
//! ```toml
//! [registry]
//! base-url = "https://assets.example.dev/registries"
//! cache = true
//!
//! [server]
//! timeout-ms = 5000
//! ```
//!
//! All keys are optional; missing sections fall back to defaults. CLI flags
//! override whatever the file says.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// CDN root for versioned Go stdlib manifests. Overridable via
/// `[registry] base-url` or `--base-url` for tests and mirrors.
pub const DEFAULT_REGISTRY_BASE_URL: &str = "https://assets.callmap.dev/registries";

/// Default per-request deadline for the MCP server.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;

/// Resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Where this config came from, for display. None = defaults.
    pub source: Option<String>,
    /// Base URL for the stdlib manifest registry.
    pub registry_base_url: String,
    /// Whether the on-disk manifest cache is consulted.
    pub cache_enabled: bool,
    /// Per-request deadline for server tools.
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: None,
            registry_base_url: DEFAULT_REGISTRY_BASE_URL.to_string(),
            cache_enabled: true,
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }
}

/// Raw file shape as deserialized from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct RawConfig {
    registry: Option<RawRegistry>,
    server: Option<RawServer>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct RawRegistry {
    base_url: Option<String>,
    cache: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct RawServer {
    timeout_ms: Option<u64>,
}

impl Config {
    /// Load configuration from `<directory>/callmap.toml`, falling back to
    /// defaults when the file is missing or unparseable.
    pub fn load(directory: &Path) -> Self {
        let path = directory.join("callmap.toml");
        let Ok(content) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        let raw: RawConfig = match toml::from_str(&content) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!("ignoring malformed {}: {}", path.display(), err);
                return Self::default();
            }
        };
        Self::from_raw(raw, path.display().to_string())
    }

    fn from_raw(raw: RawConfig, source: String) -> Self {
        let defaults = Self::default();
        let registry = raw.registry.unwrap_or_default();
        let server = raw.server.unwrap_or_default();
        Self {
            source: Some(source),
            registry_base_url: registry.base_url.unwrap_or(defaults.registry_base_url),
            cache_enabled: registry.cache.unwrap_or(defaults.cache_enabled),
            request_timeout: server
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_timeout),
        }
    }
}
