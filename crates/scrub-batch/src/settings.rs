//! Batch settings

use crate::error::SettingsError;
use crate::retry::RetryPolicy;
use scrub_extract::ExtractorConfig;
use scrub_guard::{AuditConfig, LineEnding};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default maximum upload size: 50 MiB
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Settings for one batch invocation, usually loaded from a TOML file.
///
/// ```toml
/// output_store = "sanitized"
/// wall_clock_budget_secs = 600
/// max_workers = 8
///
/// [retry]
/// max_attempts = 5
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Store receiving sanitized output
    pub output_store: String,
    /// Store receiving quarantined originals
    pub quarantine_store: String,
    /// Store holding per-user redaction configs
    pub config_store: String,

    /// Stop dispatching new sub-batches after this many seconds
    pub wall_clock_budget_secs: u64,
    /// Files per sub-batch
    pub sub_batch_size: usize,
    /// Files processed concurrently within a sub-batch
    pub max_workers: usize,
    /// Largest accepted upload, in bytes
    pub max_file_size: u64,

    /// Line endings of sanitized output
    pub line_ending: LineEnding,
    /// Remove the original once a quarantine copy exists
    pub delete_quarantined_originals: bool,

    pub retry: RetryPolicy,
    pub extractor: ExtractorConfig,
    pub audit: AuditConfig,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            output_store: "output".to_string(),
            quarantine_store: "quarantine".to_string(),
            config_store: "config".to_string(),
            wall_clock_budget_secs: 14 * 60,
            sub_batch_size: 10,
            max_workers: 4,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            line_ending: LineEnding::default(),
            delete_quarantined_originals: true,
            retry: RetryPolicy::default(),
            extractor: ExtractorConfig::default(),
            audit: AuditConfig::default(),
        }
    }
}

impl BatchSettings {
    /// Load and validate settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate settings from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |msg: &str| Err(SettingsError::Invalid(msg.to_string()));

        for (name, value) in [
            ("output_store", &self.output_store),
            ("quarantine_store", &self.quarantine_store),
            ("config_store", &self.config_store),
        ] {
            if value.trim().is_empty() {
                return Err(SettingsError::Invalid(format!("{name} must not be empty")));
            }
        }
        if self.wall_clock_budget_secs == 0 {
            return invalid("wall_clock_budget_secs must be positive");
        }
        if self.sub_batch_size == 0 {
            return invalid("sub_batch_size must be at least 1");
        }
        if self.max_workers == 0 {
            return invalid("max_workers must be at least 1");
        }
        if self.max_file_size == 0 {
            return invalid("max_file_size must be positive");
        }
        if self.retry.max_attempts == 0 {
            return invalid("retry.max_attempts must be at least 1");
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return invalid("retry.base_delay_ms must not exceed retry.max_delay_ms");
        }
        Ok(())
    }

    pub fn wall_clock_budget(&self) -> Duration {
        Duration::from_secs(self.wall_clock_budget_secs)
    }

    pub fn with_output_store(mut self, store_id: impl Into<String>) -> Self {
        self.output_store = store_id.into();
        self
    }

    pub fn with_quarantine_store(mut self, store_id: impl Into<String>) -> Self {
        self.quarantine_store = store_id.into();
        self
    }

    pub fn with_config_store(mut self, store_id: impl Into<String>) -> Self {
        self.config_store = store_id.into();
        self
    }

    pub fn with_wall_clock_budget(mut self, budget: Duration) -> Self {
        self.wall_clock_budget_secs = budget.as_secs();
        self
    }

    pub fn with_sub_batch_size(mut self, size: usize) -> Self {
        self.sub_batch_size = size;
        self
    }

    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers;
        self
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    pub fn with_delete_quarantined_originals(mut self, delete: bool) -> Self {
        self.delete_quarantined_originals = delete;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_extractor(mut self, extractor: ExtractorConfig) -> Self {
        self.extractor = extractor;
        self
    }
}
