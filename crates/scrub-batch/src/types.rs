//! Core types for batch processing

use crate::keys;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Maximum length of a quarantine reason, in bytes
pub const MAX_REASON_BYTES: usize = 255;

/// A file to process: a key in a named store.
///
/// The owning user is derived from a `users/{user_id}/` key prefix when the
/// reference is built and cannot change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "FileReferenceInput")]
pub struct FileReference {
    store_id: String,
    key: String,
    user_id: Option<String>,
}

/// Wire form of a [`FileReference`] in a batch trigger
#[derive(Debug, Clone, Deserialize)]
pub struct FileReferenceInput {
    pub store_id: String,
    pub key: String,
}

impl From<FileReferenceInput> for FileReference {
    fn from(input: FileReferenceInput) -> Self {
        FileReference::new(input.store_id, input.key)
    }
}

impl FileReference {
    pub fn new(store_id: impl Into<String>, key: impl Into<String>) -> Self {
        let key = key.into();
        let user_id = keys::split_user_prefix(&key).0.map(str::to_string);
        Self {
            store_id: store_id.into(),
            key,
            user_id,
        }
    }

    pub fn store_id(&self) -> &str {
        &self.store_id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Lowercased file extension
    pub fn extension(&self) -> Option<String> {
        keys::extension(&self.key)
    }
}

impl std::fmt::Display for FileReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.store_id, self.key)
    }
}

/// Terminal state of one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    /// Output committed and original removed
    Success,
    /// Copied to quarantine
    Quarantined,
    /// Could not be processed or quarantined
    Error,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Success => "success",
            ProcessingStatus::Quarantined => "quarantined",
            ProcessingStatus::Error => "error",
        }
    }
}

/// Outcome for one dispatched file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub file_reference: FileReference,
    pub status: ProcessingStatus,
    /// Whether any rule changed the text
    pub redacted: bool,
    pub error_detail: Option<String>,
    /// Key of the sanitized output, when one was written
    pub output_key: Option<String>,
    /// Key of the quarantine copy, when one was written
    pub quarantine_key: Option<String>,
}

impl ProcessingResult {
    pub fn success(file_reference: FileReference, redacted: bool, output_key: String) -> Self {
        Self {
            file_reference,
            status: ProcessingStatus::Success,
            redacted,
            error_detail: None,
            output_key: Some(output_key),
            quarantine_key: None,
        }
    }

    pub fn quarantined(
        file_reference: FileReference,
        reason: impl Into<String>,
        quarantine_key: String,
    ) -> Self {
        Self {
            file_reference,
            status: ProcessingStatus::Quarantined,
            redacted: false,
            error_detail: Some(reason.into()),
            output_key: None,
            quarantine_key: Some(quarantine_key),
        }
    }

    pub fn error(file_reference: FileReference, detail: impl Into<String>) -> Self {
        Self {
            file_reference,
            status: ProcessingStatus::Error,
            redacted: false,
            error_detail: Some(detail.into()),
            output_key: None,
            quarantine_key: None,
        }
    }

    /// Keep the key of an output that was written before the failure
    pub fn with_output_key(mut self, output_key: String) -> Self {
        self.output_key = Some(output_key);
        self
    }
}

/// Why and from where a file was quarantined
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarantineRecord {
    reason: String,
    pub original_store_id: String,
    pub original_key: String,
    pub user_id: Option<String>,
}

impl QuarantineRecord {
    pub fn new(reference: &FileReference, reason: &str) -> Self {
        Self {
            reason: truncate_reason(reason).to_string(),
            original_store_id: reference.store_id().to_string(),
            original_key: reference.key().to_string(),
            user_id: reference.user_id().map(str::to_string),
        }
    }

    /// The reason, at most [`MAX_REASON_BYTES`] long
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Cut `reason` to at most [`MAX_REASON_BYTES`] without splitting a character
pub fn truncate_reason(reason: &str) -> &str {
    if reason.len() <= MAX_REASON_BYTES {
        return reason;
    }
    let mut end = MAX_REASON_BYTES;
    while !reason.is_char_boundary(end) {
        end -= 1;
    }
    &reason[..end]
}

/// One invocation's work, created by the orchestrator and never persisted
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub file_references: Vec<FileReference>,
    pub sub_batch_size: usize,
    pub wall_clock_budget: Duration,
    pub started: Instant,
    /// Wall-clock start, used in output keys
    pub started_at: DateTime<Utc>,
}

impl BatchJob {
    pub fn new(
        file_references: Vec<FileReference>,
        sub_batch_size: usize,
        wall_clock_budget: Duration,
    ) -> Self {
        Self {
            file_references,
            sub_batch_size: sub_batch_size.max(1),
            wall_clock_budget,
            started: Instant::now(),
            started_at: Utc::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn budget_exhausted(&self) -> bool {
        self.elapsed() >= self.wall_clock_budget
    }
}

/// Summary of one batch run, including partial runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// One result per dispatched file, in input order
    pub results: Vec<ProcessingResult>,
    /// Number of references received
    pub total: usize,
    /// References never dispatched because the run stopped early
    pub unprocessed: Vec<FileReference>,
    pub timed_out: bool,
    /// Set when the batch could not start at all
    pub aborted: Option<String>,
    pub elapsed: Duration,
}

impl BatchReport {
    fn count(&self, status: ProcessingStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(ProcessingStatus::Success)
    }

    pub fn quarantined(&self) -> usize {
        self.count(ProcessingStatus::Quarantined)
    }

    pub fn errored(&self) -> usize {
        self.count(ProcessingStatus::Error)
    }

    /// Whether every received reference was dispatched
    pub fn is_complete(&self) -> bool {
        self.aborted.is_none() && self.unprocessed.is_empty()
    }
}
