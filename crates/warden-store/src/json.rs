//! JSON file-backed record store.
//!
//! One file per record, grouped into a directory per kind:
//!
//! ```text
//! <base>/
//!   zones/
//!     spawn.json
//!     market.json
//!   promotions/
//!     spawn.json
//! ```
//!
//! Records are written through a temporary file and renamed into place so
//! a crash mid-write never leaves a truncated record behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::store::{RecordKind, RecordStore, StoreError, StoreResult};

/// JSON file-backed record store implementation.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    base: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `base`. Directories are created lazily on
    /// first save.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// The directory this store writes under.
    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    fn record_path(&self, kind: RecordKind, key: &str) -> StoreResult<PathBuf> {
        validate_key(key)?;
        Ok(self.base.join(kind.as_str()).join(format!("{key}.json")))
    }

    async fn write_atomic(&self, path: &Path, bytes: &[u8]) -> StoreResult<()> {
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

/// Keys become file names; anything that could escape the collection
/// directory is rejected.
fn validate_key(key: &str) -> StoreResult<()> {
    if key.is_empty()
        || !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        || key.starts_with('.')
    {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn load_all(&self, kind: RecordKind) -> StoreResult<Vec<(String, Value)>> {
        let dir = self.base.join(kind.as_str());
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let bytes = tokio::fs::read(&path).await?;
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(value) => records.push((key.to_string(), value)),
                Err(e) => {
                    warn!(kind = %kind, key, error = %e, "skipping corrupt record");
                }
            }
        }
        Ok(records)
    }

    async fn load(&self, kind: RecordKind, key: &str) -> StoreResult<Value> {
        let path = self.record_path(kind, key)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    kind,
                    key: key.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn save(&self, kind: RecordKind, key: &str, record: &Value) -> StoreResult<()> {
        let path = self.record_path(kind, key)?;
        let bytes = serde_json::to_vec_pretty(record)?;
        self.write_atomic(&path, &bytes).await
    }

    async fn exists(&self, kind: RecordKind, key: &str) -> StoreResult<bool> {
        let path = self.record_path(kind, key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn delete(&self, kind: RecordKind, key: &str) -> StoreResult<bool> {
        let path = self.record_path(kind, key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
