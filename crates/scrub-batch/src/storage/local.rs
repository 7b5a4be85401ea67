//! Local filesystem object store.
//!
//! Layout under the root directory:
//!
//! ```text
//! {root}/{store_id}/{key}                  object bytes
//! {root}/{store_id}/.meta/{key}.json       metadata sidecar
//! ```

use super::{Metadata, ObjectHead, ObjectStore, Result};
use crate::error::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;

const META_DIR: &str = ".meta";

/// Filesystem-backed store; each store id is a directory under `root`
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn store_dir(&self, store_id: &str) -> Result<PathBuf> {
        check_relative(store_id)?;
        Ok(self.root.join(store_id))
    }

    fn object_path(&self, store_id: &str, key: &str) -> Result<PathBuf> {
        check_relative(key)?;
        if key.starts_with(META_DIR) {
            return Err(StorageError::Permanent(format!("reserved key: {key}")));
        }
        Ok(self.store_dir(store_id)?.join(key))
    }

    fn meta_path(&self, store_id: &str, key: &str) -> Result<PathBuf> {
        check_relative(key)?;
        Ok(self
            .store_dir(store_id)?
            .join(META_DIR)
            .join(format!("{key}.json")))
    }

    async fn read_metadata(&self, store_id: &str, key: &str) -> Result<Metadata> {
        match fs::read(self.meta_path(store_id, key)?).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Metadata::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_metadata(&self, store_id: &str, key: &str, metadata: &Metadata) -> Result<()> {
        let path = self.meta_path(store_id, key)?;
        if metadata.is_empty() {
            return remove_if_exists(&path).await;
        }
        write_file(&path, &serde_json::to_vec_pretty(metadata)?).await
    }
}

/// Reject keys that would escape the store directory
fn check_relative(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && Path::new(key)
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if valid {
        Ok(())
    } else {
        Err(StorageError::Permanent(format!("invalid key: {key:?}")))
    }
}

fn map_not_found(err: std::io::Error, store_id: &str, key: &str) -> StorageError {
    if err.kind() == ErrorKind::NotFound {
        StorageError::not_found(store_id, key)
    } else {
        err.into()
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, bytes).await?;
    Ok(())
}

async fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn get(&self, store_id: &str, key: &str) -> Result<Vec<u8>> {
        fs::read(self.object_path(store_id, key)?)
            .await
            .map_err(|e| map_not_found(e, store_id, key))
    }

    async fn head(&self, store_id: &str, key: &str) -> Result<ObjectHead> {
        let attrs = fs::metadata(self.object_path(store_id, key)?)
            .await
            .map_err(|e| map_not_found(e, store_id, key))?;
        if !attrs.is_file() {
            return Err(StorageError::not_found(store_id, key));
        }

        let last_modified: DateTime<Utc> = attrs.modified()?.into();
        Ok(ObjectHead {
            size: attrs.len(),
            last_modified,
            metadata: self.read_metadata(store_id, key).await?,
        })
    }

    async fn put(
        &self,
        store_id: &str,
        key: &str,
        bytes: Vec<u8>,
        metadata: Metadata,
    ) -> Result<()> {
        write_file(&self.object_path(store_id, key)?, &bytes).await?;
        self.write_metadata(store_id, key, &metadata).await?;
        debug!(store_id, key, size = bytes.len(), "Stored object");
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
        let dest = self.object_path(dest_store_id, dest_key)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::copy(self.object_path(src_store_id, src_key)?, &dest)
            .await
            .map_err(|e| map_not_found(e, src_store_id, src_key))?;
        self.write_metadata(dest_store_id, dest_key, &metadata).await
    }

    async fn delete(&self, store_id: &str, key: &str) -> Result<()> {
        remove_if_exists(&self.object_path(store_id, key)?).await?;
        remove_if_exists(&self.meta_path(store_id, key)?).await
    }

    async fn list(&self, store_id: &str, prefix: &str) -> Result<Vec<String>> {
        let base = self.store_dir(store_id)?;
        let mut keys = Vec::new();
        let mut pending = vec![base.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    if dir != base || entry.file_name() != META_DIR {
                        pending.push(path);
                    }
                    continue;
                }

                let Ok(relative) = path.strip_prefix(&base) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}
