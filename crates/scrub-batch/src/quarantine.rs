//! Quarantine routing for files that cannot be processed safely

use crate::error::StorageError;
use crate::keys;
use crate::retry::{retry, RetryPolicy};
use crate::storage::{Metadata, ObjectStore};
use crate::types::{FileReference, QuarantineRecord};
use std::sync::Arc;
use tracing::{info, warn};

/// Copies rejected originals into the quarantine store
pub struct QuarantineRouter {
    store: Arc<dyn ObjectStore>,
    quarantine_store: String,
    retry: RetryPolicy,
}

impl QuarantineRouter {
    pub fn new(store: Arc<dyn ObjectStore>, quarantine_store: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            store,
            quarantine_store: quarantine_store.into(),
            retry,
        }
    }

    /// Copy the original to its quarantine key, tagged with the reason.
    /// Returns the quarantine key.
    pub async fn quarantine(&self, reference: &FileReference, reason: &str) -> Result<String, StorageError> {
        let record = QuarantineRecord::new(reference, reason);
        let dest_key = keys::quarantine_key(reference.key());
        let metadata = record_metadata(&record);

        let copied = retry(&self.retry, "quarantine_copy", || {
            self.store.copy(
                reference.store_id(),
                reference.key(),
                &self.quarantine_store,
                &dest_key,
                metadata.clone(),
            )
        })
        .await;

        match copied {
            Ok(()) => {
                info!(
                    file = %reference,
                    quarantine_key = %dest_key,
                    reason = %record.reason(),
                    "File quarantined"
                );
                Ok(dest_key)
            }
            Err(e) => {
                warn!(file = %reference, error = %e, "Quarantine copy failed");
                Err(e)
            }
        }
    }
}

/// Object metadata written on the quarantine copy
pub fn record_metadata(record: &QuarantineRecord) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("quarantine-reason".to_string(), record.reason().to_string());
    metadata.insert("original-store-id".to_string(), record.original_store_id.clone());
    metadata.insert("original-key".to_string(), record.original_key.clone());
    if let Some(user_id) = &record.user_id {
        metadata.insert("user-id".to_string(), user_id.clone());
    }
    metadata
}
