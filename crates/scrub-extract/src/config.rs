//! Extractor configuration

use serde::{Deserialize, Serialize};

/// Configuration for content extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum extracted text length (in bytes)
    pub max_text_length: usize,

    /// Maximum decompressed size of a single container part (in bytes)
    pub max_part_size: u64,

    /// Shortest printable run kept when scanning legacy binary documents
    pub min_run_length: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_text_length: 20 * 1024 * 1024,
            max_part_size: 64 * 1024 * 1024,
            min_run_length: 4,
        }
    }
}

impl ExtractorConfig {
    /// Create a new config with custom max text length
    pub fn with_max_text_length(mut self, max_text_length: usize) -> Self {
        self.max_text_length = max_text_length;
        self
    }

    /// Create a new config with custom max part size
    pub fn with_max_part_size(mut self, max_part_size: u64) -> Self {
        self.max_part_size = max_part_size;
        self
    }

    /// Create a new config with custom minimum run length for legacy scanning
    pub fn with_min_run_length(mut self, min_run_length: usize) -> Self {
        self.min_run_length = min_run_length;
        self
    }
}
