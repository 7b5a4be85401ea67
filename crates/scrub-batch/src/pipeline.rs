//! Per-file processing: validate, extract, redact, normalize, commit

use crate::config_loader::{ConfigCache, ConfigLoader};
use crate::error::{ProcessingError, Result};
use crate::keys;
use crate::quarantine::QuarantineRouter;
use crate::retry::retry;
use crate::settings::BatchSettings;
use crate::storage::{Metadata, ObjectStore};
use crate::types::{FileReference, ProcessingResult};
use crate::validate::{check_size, validate_upload};
use chrono::{DateTime, Utc};
use scrub_extract::{DocumentFormat, ExtractError, ExtractResult};
use scrub_guard::{normalize, AuditLogger, RedactionOutcome};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Text ready to commit, with what produced it
struct Sanitized {
    extracted: ExtractResult,
    outcome: RedactionOutcome,
    output: String,
}

/// Runs one file through the whole pipeline and always yields a result
pub struct FilePipeline {
    store: Arc<dyn ObjectStore>,
    settings: Arc<BatchSettings>,
    config_loader: ConfigLoader,
    quarantine: QuarantineRouter,
    audit: AuditLogger,
}

impl FilePipeline {
    pub fn new(store: Arc<dyn ObjectStore>, settings: Arc<BatchSettings>, cache: Arc<ConfigCache>) -> Self {
        Self {
            config_loader: ConfigLoader::new(
                store.clone(),
                settings.config_store.clone(),
                cache,
                settings.retry.clone(),
            ),
            quarantine: QuarantineRouter::new(
                store.clone(),
                settings.quarantine_store.clone(),
                settings.retry.clone(),
            ),
            audit: AuditLogger::new(settings.audit.clone()),
            store,
            settings,
        }
    }

    /// Process `reference`; `batch_started` stamps the output key
    pub async fn process(&self, reference: &FileReference, batch_started: DateTime<Utc>) -> ProcessingResult {
        let result = match self.run(reference, batch_started).await {
            Ok(result) => result,
            Err(err) if err.should_quarantine() => self.route_to_quarantine(reference, &err).await,
            Err(err) => {
                warn!(file = %reference, error = %err, "File processing failed");
                ProcessingResult::error(reference.clone(), err.to_string())
            }
        };

        info!(
            file = %reference,
            status = result.status.as_str(),
            redacted = result.redacted,
            output_key = ?result.output_key,
            "File processed"
        );
        result
    }

    async fn run(&self, reference: &FileReference, batch_started: DateTime<Utc>) -> Result<ProcessingResult> {
        let (store_id, key) = (reference.store_id(), reference.key());
        let retry_policy = &self.settings.retry;

        let head = retry(retry_policy, "head", || self.store.head(store_id, key)).await?;
        let format = validate_upload(reference, head.size, self.settings.max_file_size)?;

        let bytes = retry(retry_policy, "get", || self.store.get(store_id, key)).await?;
        check_size(bytes.len() as u64, self.settings.max_file_size)?;

        let resolved = self.config_loader.resolve_compiled(reference.user_id()).await;
        let sanitized = self.sanitize(format, bytes, resolved.redactor.clone()).await?;

        self.audit.log(
            &reference.to_string(),
            reference.user_id(),
            &sanitized.extracted.text,
            &sanitized.outcome,
        );

        let ext = reference.extension().unwrap_or_default();
        let output_key = keys::output_key(key, &format.output_extension(&ext), batch_started);
        let metadata = output_metadata(reference, format, &ext, &sanitized);
        let redacted = sanitized.outcome.redacted;
        let output = sanitized.output.into_bytes();

        retry(retry_policy, "put_output", || {
            self.store.put(
                &self.settings.output_store,
                &output_key,
                output.clone(),
                metadata.clone(),
            )
        })
        .await?;
        debug!(file = %reference, output_key = %output_key, "Output committed");

        if let Err(e) = retry(retry_policy, "delete_original", || self.store.delete(store_id, key)).await {
            warn!(file = %reference, error = %e, "Output committed but original not deleted");
            return Ok(ProcessingResult::error(
                reference.clone(),
                format!("Output committed but original not deleted: {e}"),
            )
            .with_output_key(output_key));
        }

        Ok(ProcessingResult::success(reference.clone(), redacted, output_key))
    }

    /// Extraction, redaction and normalization are CPU-bound and run off the
    /// async workers
    async fn sanitize(
        &self,
        format: DocumentFormat,
        bytes: Vec<u8>,
        redactor: Arc<scrub_guard::Redactor>,
    ) -> Result<Sanitized> {
        let extractor_config = self.settings.extractor.clone();
        let line_ending = self.settings.line_ending;

        let task = tokio::task::spawn_blocking(move || {
            let extracted = scrub_extract::extract(format, &bytes, &extractor_config)?;
            let outcome = redactor.redact(&extracted.text);
            let output = normalize(&outcome.text, line_ending);
            Ok::<_, ExtractError>(Sanitized {
                extracted,
                outcome,
                output,
            })
        });

        match task.await {
            Ok(sanitized) => Ok(sanitized?),
            Err(e) if e.is_panic() => Err(ProcessingError::Extraction(ExtractError::Parse(
                format!("{format} extractor crashed"),
            ))),
            Err(e) => Err(ProcessingError::unknown(format!("extraction task failed: {e}"))),
        }
    }

    async fn route_to_quarantine(&self, reference: &FileReference, err: &ProcessingError) -> ProcessingResult {
        let reason = err.to_string();
        let quarantine_key = match self.quarantine.quarantine(reference, &reason).await {
            Ok(key) => key,
            Err(e) => {
                return ProcessingResult::error(
                    reference.clone(),
                    format!("Quarantine failed: {e} (original failure: {reason})"),
                );
            }
        };

        if self.settings.delete_quarantined_originals {
            let deleted = retry(&self.settings.retry, "delete_quarantined", || {
                self.store.delete(reference.store_id(), reference.key())
            })
            .await;
            if let Err(e) = deleted {
                warn!(file = %reference, error = %e, "Quarantined original not deleted");
            }
        }

        ProcessingResult::quarantined(reference.clone(), reason, quarantine_key)
    }
}

/// Object metadata written on the sanitized output
fn output_metadata(
    reference: &FileReference,
    format: DocumentFormat,
    original_ext: &str,
    sanitized: &Sanitized,
) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("processing-status".to_string(), "success".to_string());
    metadata.insert("original-key".to_string(), reference.key().to_string());
    metadata.insert("redacted".to_string(), sanitized.outcome.redacted.to_string());
    metadata.insert("content-type".to_string(), format.output_content_type().to_string());
    if format.is_converted() {
        metadata.insert("converted-from".to_string(), original_ext.to_string());
    }
    if let Some(user_id) = reference.user_id() {
        metadata.insert("user-id".to_string(), user_id.to_string());
    }
    if let Some(skipped) = sanitized.extracted.metadata("skipped_sheets") {
        metadata.insert("skipped-sheets".to_string(), skipped.to_string());
    }
    if sanitized.extracted.is_partial() {
        metadata.insert(
            "unreadable-units".to_string(),
            sanitized.extracted.placeholders.to_string(),
        );
    }
    metadata
}
