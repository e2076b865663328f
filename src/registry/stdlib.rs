//! Version-pinned Go stdlib manifest: fetch, index, query.
//!
//! The manifest is the authoritative answer to "is this import path part of
//! the standard library" - nothing else in the pipeline is allowed to make
//! that call. It is fetched once per build from
//! `<baseURL>/go<major.minor>/manifest.json`, optionally via the on-disk
//! cache, and indexed into per-package function/type maps.
//!
//! Failure is non-fatal by design: on any transport or parse error the
//! loader stays absent, `is_stdlib` stays false everywhere, and analysis
//! proceeds without stdlib enrichment.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::ManifestCache;
use crate::config::Config;
use crate::registry::module::ModuleRegistry;
use crate::registry::version::{detect_go_version, normalize_go_version};

/// HTTP timeout for the manifest fetch. The fetch runs on a worker thread
/// at build start; a hung CDN should not stall analysis for long.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Manifest document (wire format)
// ---------------------------------------------------------------------------

/// Top-level manifest document as served by the registry CDN.
/// Optional fields are tolerated throughout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub schema_version: String,
    #[serde(default)]
    pub registry_version: String,
    #[serde(default)]
    pub go_version: VersionInfo,
    #[serde(default)]
    pub packages: Vec<PackageEntry>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct VersionInfo {
    #[serde(default)]
    pub major: u32,
    #[serde(default)]
    pub minor: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageEntry {
    pub import_path: String,
    #[serde(default)]
    pub functions: Vec<StdlibFunction>,
    #[serde(default)]
    pub types: Vec<StdlibType>,
}

/// An exported stdlib function: name, display signature, ordered returns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StdlibFunction {
    pub name: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub returns: Vec<ReturnValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReturnValue {
    #[serde(rename = "type", default)]
    pub ty: String,
}

/// An exported stdlib type (struct, interface, alias).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StdlibType {
    pub name: String,
    #[serde(default)]
    pub kind: String,
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// Query surface the rest of the pipeline sees. A trait so tests can swap in
/// fixed-table mocks without any network access.
pub trait StdlibLoader: Send + Sync {
    /// Whether the import path belongs to this stdlib version. Absence is
    /// authoritative: false means "not in this stdlib".
    fn validate(&self, import_path: &str) -> bool;

    /// Look up an exported function of a stdlib package.
    fn function(&self, import_path: &str, name: &str) -> Option<&StdlibFunction>;

    /// Look up an exported type of a stdlib package.
    fn get_type(&self, import_path: &str, name: &str) -> Option<&StdlibType>;

    /// Number of packages in the loaded manifest.
    fn package_count(&self) -> usize;
}

/// Per-package index built from one manifest entry.
#[derive(Debug, Default)]
struct PackageIndex {
    functions: HashMap<String, StdlibFunction>,
    types: HashMap<String, StdlibType>,
}

/// The concrete manifest-backed loader. Immutable after construction.
pub struct StdlibRegistry {
    version: String,
    packages: HashMap<String, PackageIndex>,
}

impl StdlibRegistry {
    /// Load the manifest for `(base_url, version)`, consulting the disk
    /// cache first when one is provided. A fresh fetch is written back to
    /// the cache best-effort.
    pub fn load(base_url: &str, version: &str, cache: Option<&ManifestCache>) -> Result<Self> {
        if let Some(cache) = cache {
            if let Some(manifest) = cache.get(base_url, version) {
                debug!("stdlib manifest for go{version} served from cache");
                return Ok(Self::from_manifest(version, manifest));
            }
        }

        let manifest = fetch_manifest(base_url, version)?;

        if let Some(cache) = cache {
            if let Err(err) = cache.set(base_url, version, &manifest) {
                debug!("failed to cache stdlib manifest: {err}");
            }
        }

        Ok(Self::from_manifest(version, manifest))
    }

    /// Index a parsed manifest into per-package lookup tables.
    pub fn from_manifest(version: &str, manifest: Manifest) -> Self {
        let mut packages = HashMap::with_capacity(manifest.packages.len());
        for entry in manifest.packages {
            let mut index = PackageIndex::default();
            for f in entry.functions {
                index.functions.insert(f.name.clone(), f);
            }
            for t in entry.types {
                index.types.insert(t.name.clone(), t);
            }
            packages.insert(entry.import_path, index);
        }
        Self {
            version: version.to_string(),
            packages,
        }
    }

    /// The "major.minor" version this manifest is keyed on.
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl StdlibLoader for StdlibRegistry {
    fn validate(&self, import_path: &str) -> bool {
        self.packages.contains_key(import_path)
    }

    fn function(&self, import_path: &str, name: &str) -> Option<&StdlibFunction> {
        self.packages.get(import_path)?.functions.get(name)
    }

    fn get_type(&self, import_path: &str, name: &str) -> Option<&StdlibType> {
        self.packages.get(import_path)?.types.get(name)
    }

    fn package_count(&self) -> usize {
        self.packages.len()
    }
}

/// URL of the manifest for a given base and "major.minor" version.
pub fn manifest_url(base_url: &str, version: &str) -> String {
    format!("{}/go{}/manifest.json", base_url.trim_end_matches('/'), version)
}

/// Fetch and parse the manifest over HTTP (blocking).
fn fetch_manifest(base_url: &str, version: &str) -> Result<Manifest> {
    let url = manifest_url(base_url, version);

    let agent = ureq::AgentBuilder::new().timeout(FETCH_TIMEOUT).build();
    let body = agent
        .get(&url)
        .call()
        .with_context(|| format!("failed to fetch {url}"))?
        .into_string()
        .with_context(|| format!("failed to read manifest body from {url}"))?;

    serde_json::from_str(&body).with_context(|| format!("failed to parse manifest from {url}"))
}

/// Resolve the project's toolchain version and attach a stdlib loader to the
/// registry. On any failure the loader stays unset and a warning is logged
/// once; the pipeline continues without stdlib metadata.
pub fn init_stdlib_loader(registry: &mut ModuleRegistry, project_root: &Path, config: &Config) {
    let version = {
        let v = normalize_go_version(&registry.go_version);
        if v.is_empty() {
            detect_go_version(project_root)
        } else {
            v
        }
    };

    let cache = if config.cache_enabled {
        match ManifestCache::open(project_root) {
            Ok(cache) => Some(cache),
            Err(err) => {
                debug!("manifest cache unavailable: {err}");
                None
            }
        }
    } else {
        None
    };

    match StdlibRegistry::load(&config.registry_base_url, &version, cache.as_ref()) {
        Ok(remote) => {
            info!(
                "loaded Go {} stdlib manifest ({} packages)",
                version,
                remote.package_count()
            );
            registry.stdlib = Some(Arc::new(remote));
        }
        Err(err) => {
            warn!("failed to load Go {version} stdlib manifest: {err:#}");
        }
    }
}
