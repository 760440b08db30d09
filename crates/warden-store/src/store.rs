//! Record store abstraction
//!
//! This module provides the persistence abstraction the engine saves
//! through. Records are keyed JSON documents grouped by kind; the store
//! knows nothing about zone or promotion semantics.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Record store error types.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failure
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be serialized or deserialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No record under this key
    #[error("record not found: {kind}/{key}")]
    NotFound { kind: RecordKind, key: String },

    /// Key contains characters the backend cannot represent
    #[error("invalid record key: {0}")]
    InvalidKey(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// The kinds of records the engine persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Custom zone definitions, one record per zone.
    Zone,
    /// Accumulated auto-promotion presence, one record per zone.
    PromotionLedger,
}

impl RecordKind {
    /// Stable collection name used by file-backed stores.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zone => "zones",
            Self::PromotionLedger => "promotions",
        }
    }

    /// All record kinds.
    pub fn all() -> [RecordKind; 2] {
        [Self::Zone, Self::PromotionLedger]
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record store trait for persistence backends.
///
/// All methods take `&self`; implementations handle their own locking.
/// Callers snapshot state before saving so no zone or membership lock is
/// ever held across an `await` into the store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Load every record of a kind as (key, document) pairs.
    ///
    /// Missing collections are empty, not errors. Individually corrupt
    /// records are skipped with a warning; loading must not abort startup.
    async fn load_all(&self, kind: RecordKind) -> StoreResult<Vec<(String, Value)>>;

    /// Load one record.
    async fn load(&self, kind: RecordKind, key: &str) -> StoreResult<Value>;

    /// Write a record, replacing any previous document under the key.
    async fn save(&self, kind: RecordKind, key: &str, record: &Value) -> StoreResult<()>;

    /// Whether a record exists under the key.
    async fn exists(&self, kind: RecordKind, key: &str) -> StoreResult<bool>;

    /// Delete a record. Returns whether one existed.
    async fn delete(&self, kind: RecordKind, key: &str) -> StoreResult<bool>;
}
