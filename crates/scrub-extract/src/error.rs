//! Error types for content extraction

use thiserror::Error;

/// Result type for extraction operations
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Errors that can occur during content extraction
#[derive(Error, Debug)]
pub enum ExtractError {
    /// PDF could not be loaded
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Office container (zip) could not be opened or read
    #[error("Archive error: {0}")]
    Archive(String),

    /// A required part is missing from the container
    #[error("Missing document part: {0}")]
    MissingPart(String),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Delimited text could not be parsed or re-emitted
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Extracted text too large
    #[error("Content too large: {size} bytes exceeds max {max} bytes")]
    ContentTooLarge { size: usize, max: usize },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<lopdf::Error> for ExtractError {
    fn from(err: lopdf::Error) -> Self {
        ExtractError::Pdf(err.to_string())
    }
}

impl From<zip::result::ZipError> for ExtractError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::FileNotFound => {
                ExtractError::MissingPart("file not found in archive".to_string())
            }
            other => ExtractError::Archive(other.to_string()),
        }
    }
}
