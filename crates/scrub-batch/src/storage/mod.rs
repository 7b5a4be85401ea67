//! Storage gateway.
//!
//! Every object the pipeline touches lives in a named store (a bucket, a
//! directory) under a slash-separated key. [`ObjectStore`] is the only way the
//! pipeline reaches them, so the orchestrator runs unchanged against the
//! in-memory store in tests and the filesystem store from the CLI.

pub mod local;
pub mod memory;

pub use local::LocalStore;
pub use memory::MemoryStore;

use crate::error::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// User-defined object metadata
pub type Metadata = BTreeMap<String, String>;

/// Object attributes returned by [`ObjectStore::head`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectHead {
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub metadata: Metadata,
}

/// Storage backend trait
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object's bytes
    async fn get(&self, store_id: &str, key: &str) -> Result<Vec<u8>>;

    /// Fetch an object's attributes without its body
    async fn head(&self, store_id: &str, key: &str) -> Result<ObjectHead>;

    /// Write an object, replacing any existing one
    async fn put(&self, store_id: &str, key: &str, bytes: Vec<u8>, metadata: Metadata)
        -> Result<()>;

    /// Copy an object across stores; `metadata` replaces the source's
    async fn copy(
        &self,
        src_store_id: &str,
        src_key: &str,
        dest_store_id: &str,
        dest_key: &str,
        metadata: Metadata,
    ) -> Result<()>;

    /// Remove an object; removing a missing object succeeds
    async fn delete(&self, store_id: &str, key: &str) -> Result<()>;

    /// Keys starting with `prefix`, in lexicographic order
    async fn list(&self, store_id: &str, prefix: &str) -> Result<Vec<String>>;

    /// Backend name for logs
    fn backend_name(&self) -> &'static str;
}
