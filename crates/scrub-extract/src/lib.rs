//! # Scrub Extract
//!
//! Plain-text extraction for uploaded documents.
//!
//! Every supported upload format is a variant of [`DocumentFormat`], resolved
//! once from the file extension. Each variant has an [`Extractor`] that turns
//! raw bytes into plain text for the redaction engine in `scrub-guard`.
//!
//! ## Features
//!
//! - **Plain and delimited text**: UTF-8/UTF-16 decoding, CSV/TSV re-emission
//! - **PDF**: page-by-page extraction via `lopdf`
//! - **Word**: direct `word/document.xml` parsing with a lenient fallback for
//!   damaged containers and legacy `.doc` files
//! - **Excel**: first worksheet as CSV, remaining sheets listed in a header
//! - **PowerPoint**: slide-by-slide text with a header line per slide
//!
//! Structured extractors degrade per unit: one unreadable page or slide becomes
//! a placeholder line instead of failing the whole document.
//!
//! ## Example
//!
//! ```rust
//! use scrub_extract::{extract, DocumentFormat, ExtractorConfig};
//!
//! let format = DocumentFormat::from_extension("txt").unwrap();
//! let result = extract(format, b"Quarterly numbers", &ExtractorConfig::default())?;
//! assert_eq!(result.text, "Quarterly numbers");
//! # Ok::<(), scrub_extract::ExtractError>(())
//! ```

pub mod config;
pub mod delimited;
pub mod error;
pub mod format;
pub mod ooxml;
pub mod pdf;
pub mod presentation;
pub mod result;
pub mod spreadsheet;
pub mod text;
pub mod word;

pub use config::ExtractorConfig;
pub use error::{ExtractError, Result};
pub use format::DocumentFormat;
pub use result::ExtractResult;

pub use delimited::DelimitedExtractor;
pub use pdf::PdfExtractor;
pub use presentation::PresentationExtractor;
pub use spreadsheet::SpreadsheetExtractor;
pub use text::PlainTextExtractor;
pub use word::WordExtractor;

/// Common trait for all extractors
pub trait Extractor: Send + Sync {
    /// The format this extractor handles
    fn format(&self) -> DocumentFormat;

    /// Extract plain text from raw document bytes
    fn extract(&self, bytes: &[u8]) -> Result<ExtractResult>;
}

/// The extractor for a format
pub fn extractor_for(format: DocumentFormat, config: &ExtractorConfig) -> Box<dyn Extractor> {
    match format {
        DocumentFormat::PlainText => Box::new(PlainTextExtractor::new()),
        DocumentFormat::DelimitedText { delimiter } => {
            Box::new(DelimitedExtractor::new(delimiter))
        }
        DocumentFormat::PdfDocument => Box::new(PdfExtractor::new(config.clone())),
        DocumentFormat::WordDocument => Box::new(WordExtractor::new(config.clone())),
        DocumentFormat::Spreadsheet => Box::new(SpreadsheetExtractor::new(config.clone())),
        DocumentFormat::Presentation => Box::new(PresentationExtractor::new(config.clone())),
    }
}

/// Extract text from `bytes` with the extractor for `format`, enforcing the
/// configured output size limit
pub fn extract(format: DocumentFormat, bytes: &[u8], config: &ExtractorConfig) -> Result<ExtractResult> {
    let result = extractor_for(format, config).extract(bytes)?;

    if result.text.len() > config.max_text_length {
        return Err(ExtractError::ContentTooLarge {
            size: result.text.len(),
            max: config.max_text_length,
        });
    }

    Ok(result.with_original_length(bytes.len()))
}
