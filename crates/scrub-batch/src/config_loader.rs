//! Per-user redaction config resolution with a modification-time cache

use crate::error::StorageError;
use crate::keys;
use crate::retry::{retry, RetryPolicy};
use crate::storage::ObjectStore;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use scrub_guard::{RedactionConfig, Redactor};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// A parsed config together with its compiled redactor
#[derive(Clone)]
pub struct ResolvedConfig {
    pub config: Arc<RedactionConfig>,
    pub redactor: Arc<Redactor>,
}

impl ResolvedConfig {
    fn compile(config: RedactionConfig) -> Result<Self, scrub_guard::GuardError> {
        let redactor = Redactor::new(config.clone())?;
        Ok(Self {
            config: Arc::new(config),
            redactor: Arc::new(redactor),
        })
    }

    fn fallback() -> Self {
        Self {
            config: Arc::new(RedactionConfig::default()),
            redactor: Arc::new(Redactor::passthrough()),
        }
    }
}

#[derive(Clone)]
struct CacheEntry {
    resolved: ResolvedConfig,
    last_modified: DateTime<Utc>,
}

/// Process-local cache of resolved configs keyed by user.
///
/// Entries are only reused while the stored object's `last_modified` is
/// unchanged, so an edited config takes effect on the next lookup.
#[derive(Default)]
pub struct ConfigCache {
    entries: DashMap<String, CacheEntry>,
}

impl ConfigCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn cache_key(user_id: Option<&str>) -> String {
        user_id.unwrap_or_default().to_string()
    }

    fn lookup(&self, user_id: Option<&str>, last_modified: DateTime<Utc>) -> Option<ResolvedConfig> {
        self.entries
            .get(&Self::cache_key(user_id))
            .filter(|entry| entry.last_modified == last_modified)
            .map(|entry| entry.resolved.clone())
    }

    fn insert(&self, user_id: Option<&str>, resolved: ResolvedConfig, last_modified: DateTime<Utc>) {
        self.entries.insert(
            Self::cache_key(user_id),
            CacheEntry {
                resolved,
                last_modified,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[derive(Error, Debug)]
enum LoadError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("invalid config: {0}")]
    Invalid(#[from] scrub_guard::GuardError),
}

/// Resolves the redaction config that applies to a user's files
pub struct ConfigLoader {
    store: Arc<dyn ObjectStore>,
    store_id: String,
    cache: Arc<ConfigCache>,
    retry: RetryPolicy,
}

impl ConfigLoader {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        store_id: impl Into<String>,
        cache: Arc<ConfigCache>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            store_id: store_id.into(),
            cache,
            retry,
        }
    }

    /// The config for `user_id`. Never fails: a missing, unreadable or
    /// invalid config resolves to the empty default.
    pub async fn resolve(&self, user_id: Option<&str>) -> Arc<RedactionConfig> {
        self.resolve_compiled(user_id).await.config
    }

    /// Like [`resolve`](Self::resolve), with the compiled redactor
    pub async fn resolve_compiled(&self, user_id: Option<&str>) -> ResolvedConfig {
        let key = keys::config_key(user_id);
        match self.load(user_id, &key).await {
            Ok(resolved) => resolved,
            Err(LoadError::Storage(e)) if e.is_not_found() => {
                debug!(user_id = ?user_id, key = %key, "No redaction config, using defaults");
                ResolvedConfig::fallback()
            }
            Err(e) => {
                warn!(user_id = ?user_id, key = %key, error = %e, "Unusable redaction config, using defaults");
                ResolvedConfig::fallback()
            }
        }
    }

    async fn load(&self, user_id: Option<&str>, key: &str) -> Result<ResolvedConfig, LoadError> {
        let head = retry(&self.retry, "config_head", || self.store.head(&self.store_id, key)).await?;

        if let Some(cached) = self.cache.lookup(user_id, head.last_modified) {
            debug!(user_id = ?user_id, "Redaction config cache hit");
            return Ok(cached);
        }

        let bytes = retry(&self.retry, "config_get", || self.store.get(&self.store_id, key)).await?;
        let resolved = ResolvedConfig::compile(RedactionConfig::from_slice(&bytes)?)?;

        self.cache.insert(user_id, resolved.clone(), head.last_modified);
        debug!(
            user_id = ?user_id,
            replacements = resolved.config.replacements.len(),
            conditional_rules = resolved.config.conditional_rules.len(),
            "Loaded redaction config"
        );
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::TimeZone;

    const ACME: &str = r#"{"replacements":[{"find":"ACME","replace":"[X]"}]}"#;

    fn loader(store: Arc<MemoryStore>, cache: Arc<ConfigCache>) -> ConfigLoader {
        ConfigLoader::new(store, "config", cache, RetryPolicy::no_retry())
    }

    #[tokio::test]
    async fn test_missing_config_is_default() {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(ConfigCache::new());
        let config = loader(store, cache.clone()).resolve(Some("u1")).await;
        assert_eq!(*config, RedactionConfig::default());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_config_is_default() {
        let store = Arc::new(MemoryStore::new());
        store.insert("config", "users/u1/config/redaction.json", "{not json");
        let config = loader(store, Arc::new(ConfigCache::new()))
            .resolve(Some("u1"))
            .await;
        assert!(!config.has_rules());
    }

    #[tokio::test]
    async fn test_cache_reused_until_modified() {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(ConfigCache::new());
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        store.insert_at("config", "users/u1/config/redaction.json", ACME, t1);

        let loader = loader(store.clone(), cache.clone());
        let first = loader.resolve_compiled(Some("u1")).await;
        let second = loader.resolve_compiled(Some("u1")).await;
        assert!(Arc::ptr_eq(&first.redactor, &second.redactor));
        assert_eq!(cache.len(), 1);

        let t2 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        store.insert_at(
            "config",
            "users/u1/config/redaction.json",
            r#"{"replacements":[{"find":"Globex","replace":"[Y]"}]}"#,
            t2,
        );
        let third = loader.resolve(Some("u1")).await;
        assert_eq!(third.replacements[0].find, "Globex");
    }

    #[tokio::test]
    async fn test_shared_config_without_user() {
        let store = Arc::new(MemoryStore::new());
        store.insert("config", "config/redaction.json", ACME);
        let config = loader(store, Arc::new(ConfigCache::new())).resolve(None).await;
        assert_eq!(config.replacements.len(), 1);
    }
}
