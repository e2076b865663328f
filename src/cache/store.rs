//! Persistent stdlib-manifest cache using redb.
//!
//! Cache structure:
//! - Database: .callmap.cache/manifests.redb (redb provides ACID guarantees)
//! - Key: "{base_url}|go{version}" — the manifest identity
//! - Value: bincode-serialized Manifest
//!
//! Design:
//! - Bincode for compact binary serialization
//! - Cache directory under the project root keeps state next to the analysis
//! - Any read error degrades to a cache miss; the caller refetches

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use redb::{Database, ReadableTable, TableDefinition};

use crate::registry::Manifest;

/// Key = "{base_url}|go{version}", Value = bincode Manifest bytes.
const MANIFESTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("manifests");

/// On-disk manifest cache backed by redb.
pub struct ManifestCache {
    db: Database,
    #[allow(dead_code)]
    cache_dir: PathBuf,
}

impl ManifestCache {
    /// Open or create the cache database under `<root>/.callmap.cache/`.
    pub fn open(root: &Path) -> Result<Self> {
        let cache_dir = root.join(".callmap.cache");

        fs::create_dir_all(&cache_dir)
            .with_context(|| format!("failed to create cache directory {}", cache_dir.display()))?;

        let db_path = cache_dir.join("manifests.redb");
        let db = Database::create(&db_path)
            .with_context(|| format!("failed to open cache database {}", db_path.display()))?;

        Ok(Self { db, cache_dir })
    }

    fn key(base_url: &str, version: &str) -> String {
        format!("{base_url}|go{version}")
    }

    /// Cached manifest for `(base_url, version)`, or None on miss or any
    /// read/decode error.
    pub fn get(&self, base_url: &str, version: &str) -> Option<Manifest> {
        let read_txn = self.db.begin_read().ok()?;
        let table = read_txn.open_table(MANIFESTS_TABLE).ok()?;

        let key = Self::key(base_url, version);
        let value_guard = table.get(key.as_str()).ok()??;
        bincode::deserialize(value_guard.value()).ok()
    }

    /// Store a manifest for `(base_url, version)`, overwriting any previous
    /// entry.
    pub fn set(&self, base_url: &str, version: &str, manifest: &Manifest) -> Result<()> {
        let bytes = bincode::serialize(manifest).context("failed to serialize manifest")?;

        let write_txn = self
            .db
            .begin_write()
            .context("failed to begin cache write transaction")?;
        {
            let mut table = write_txn
                .open_table(MANIFESTS_TABLE)
                .context("failed to open manifests table")?;
            let key = Self::key(base_url, version);
            table
                .insert(key.as_str(), bytes.as_slice())
                .with_context(|| format!("failed to insert cache entry for {key}"))?;
        }
        write_txn.commit().context("failed to commit cache write")?;

        Ok(())
    }
}
