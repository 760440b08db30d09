//! In-memory record store.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::store::{RecordKind, RecordStore, StoreError, StoreResult};

/// In-memory record store implementation.
///
/// This is suitable for single-process use and testing. Nothing survives
/// process exit; use [`JsonFileStore`](crate::JsonFileStore) for durable
/// records.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<RecordKind, HashMap<String, Value>>>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records across all kinds.
    pub async fn len(&self) -> usize {
        self.records.read().await.values().map(HashMap::len).sum()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn load_all(&self, kind: RecordKind) -> StoreResult<Vec<(String, Value)>> {
        let records = self.records.read().await;
        Ok(records
            .get(&kind)
            .map(|table| {
                table
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn load(&self, kind: RecordKind, key: &str) -> StoreResult<Value> {
        let records = self.records.read().await;
        records
            .get(&kind)
            .and_then(|table| table.get(key))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind,
                key: key.to_string(),
            })
    }

    async fn save(&self, kind: RecordKind, key: &str, record: &Value) -> StoreResult<()> {
        let mut records = self.records.write().await;
        records
            .entry(kind)
            .or_default()
            .insert(key.to_string(), record.clone());
        Ok(())
    }

    async fn exists(&self, kind: RecordKind, key: &str) -> StoreResult<bool> {
        let records = self.records.read().await;
        Ok(records
            .get(&kind)
            .map_or(false, |table| table.contains_key(key)))
    }

    async fn delete(&self, kind: RecordKind, key: &str) -> StoreResult<bool> {
        let mut records = self.records.write().await;
        Ok(records
            .get_mut(&kind)
            .map_or(false, |table| table.remove(key).is_some()))
    }
}
