//! Extraction result types

use crate::format::DocumentFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of content extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractResult {
    /// The extracted text content
    pub text: String,

    /// Format the text was extracted from
    pub format: DocumentFormat,

    /// Original document length in bytes
    pub original_length: usize,

    /// Number of units (pages, slides) replaced by a placeholder
    pub placeholders: usize,

    /// Format-specific details (page_count, skipped_sheets, extraction_method, ...)
    pub metadata: BTreeMap<String, String>,
}

impl ExtractResult {
    /// Create a new extraction result
    pub fn new(text: String, format: DocumentFormat) -> Self {
        Self {
            text,
            format,
            original_length: 0,
            placeholders: 0,
            metadata: BTreeMap::new(),
        }
    }

    /// Set the original length
    pub fn with_original_length(mut self, length: usize) -> Self {
        self.original_length = length;
        self
    }

    /// Set the placeholder count
    pub fn with_placeholders(mut self, placeholders: usize) -> Self {
        self.placeholders = placeholders;
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Look up a metadata value
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Whether any unit of the document had to be replaced by a placeholder
    pub fn is_partial(&self) -> bool {
        self.placeholders > 0
    }
}
