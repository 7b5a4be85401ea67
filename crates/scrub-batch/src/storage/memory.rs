//! In-memory object store

use super::{Metadata, ObjectHead, ObjectStore, Result};
use crate::error::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Arc<Vec<u8>>,
    metadata: Metadata,
    last_modified: DateTime<Utc>,
}

/// DashMap-backed store keyed by `(store_id, key)`
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: DashMap<(String, String), StoredObject>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without metadata
    pub fn insert(&self, store_id: &str, key: &str, bytes: impl Into<Vec<u8>>) {
        self.insert_at(store_id, key, bytes, Utc::now());
    }

    /// Seed an object with an explicit modification time
    pub fn insert_at(
        &self,
        store_id: &str,
        key: &str,
        bytes: impl Into<Vec<u8>>,
        last_modified: DateTime<Utc>,
    ) {
        self.objects.insert(
            (store_id.to_string(), key.to_string()),
            StoredObject {
                bytes: Arc::new(bytes.into()),
                metadata: Metadata::new(),
                last_modified,
            },
        );
    }

    pub fn contains(&self, store_id: &str, key: &str) -> bool {
        self.objects
            .contains_key(&(store_id.to_string(), key.to_string()))
    }

    /// Number of objects across all stores
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn lookup(&self, store_id: &str, key: &str) -> Result<StoredObject> {
        self.objects
            .get(&(store_id.to_string(), key.to_string()))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StorageError::not_found(store_id, key))
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, store_id: &str, key: &str) -> Result<Vec<u8>> {
        Ok(self.lookup(store_id, key)?.bytes.as_ref().clone())
    }

    async fn head(&self, store_id: &str, key: &str) -> Result<ObjectHead> {
        let object = self.lookup(store_id, key)?;
        Ok(ObjectHead {
            size: object.bytes.len() as u64,
            last_modified: object.last_modified,
            metadata: object.metadata,
        })
    }

    async fn put(
        &self,
        store_id: &str,
        key: &str,
        bytes: Vec<u8>,
        metadata: Metadata,
    ) -> Result<()> {
        self.objects.insert(
            (store_id.to_string(), key.to_string()),
            StoredObject {
                bytes: Arc::new(bytes),
                metadata,
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn copy(
        &self,
        src_store_id: &str,
        src_key: &str,
        dest_store_id: &str,
        dest_key: &str,
        metadata: Metadata,
    ) -> Result<()> {
        let source = self.lookup(src_store_id, src_key)?;
        self.objects.insert(
            (dest_store_id.to_string(), dest_key.to_string()),
            StoredObject {
                bytes: source.bytes,
                metadata,
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn delete(&self, store_id: &str, key: &str) -> Result<()> {
        self.objects.remove(&(store_id.to_string(), key.to_string()));
        Ok(())
    }

    async fn list(&self, store_id: &str, prefix: &str) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .objects
            .iter()
            .filter(|entry| entry.key().0 == store_id && entry.key().1.starts_with(prefix))
            .map(|entry| entry.key().1.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
