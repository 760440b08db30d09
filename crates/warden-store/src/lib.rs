//! # Warden Store
//!
//! Persistence adapters for Warden. The engine persists keyed JSON
//! documents through the [`RecordStore`] trait; this crate provides the
//! in-memory backend for tests and single-process use and the JSON
//! file-per-record backend for durable state.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use serde_json::json;
//! use warden_store::{JsonFileStore, RecordKind, RecordStore};
//!
//! # async fn example() -> warden_store::StoreResult<()> {
//! let store = JsonFileStore::new("data/warden");
//! store
//!     .save(RecordKind::Zone, "spawn", &json!({"name": "spawn"}))
//!     .await?;
//!
//! for (key, record) in store.load_all(RecordKind::Zone).await? {
//!     println!("{key}: {record}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod memory;
pub mod store;

#[cfg(feature = "json")]
pub mod json;

pub use memory::MemoryStore;
pub use store::{RecordKind, RecordStore, StoreError, StoreResult};

#[cfg(feature = "json")]
pub use json::JsonFileStore;
