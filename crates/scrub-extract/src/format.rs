//! Supported upload formats

use serde::{Deserialize, Serialize};

/// Extensions accepted at ingestion
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "txt", "text", "md", "log", "csv", "tsv", "pdf", "doc", "docx", "xlsx", "pptx",
];

/// A supported document format, resolved once from the upload's extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    PlainText,
    DelimitedText { delimiter: u8 },
    PdfDocument,
    WordDocument,
    Spreadsheet,
    Presentation,
}

impl DocumentFormat {
    /// Resolve a format from a file extension (case-insensitive, without the dot)
    pub fn from_extension(ext: &str) -> Option<Self> {
        let format = match ext.to_ascii_lowercase().as_str() {
            "txt" | "text" | "md" | "log" => DocumentFormat::PlainText,
            "csv" => DocumentFormat::DelimitedText { delimiter: b',' },
            "tsv" => DocumentFormat::DelimitedText { delimiter: b'\t' },
            "pdf" => DocumentFormat::PdfDocument,
            "doc" | "docx" => DocumentFormat::WordDocument,
            "xlsx" => DocumentFormat::Spreadsheet,
            "pptx" => DocumentFormat::Presentation,
            _ => return None,
        };
        Some(format)
    }

    /// Whether the output is in a different format than the upload.
    ///
    /// Tab-separated uploads are re-emitted as CSV because normalization folds
    /// tabs into spaces.
    pub fn is_converted(&self) -> bool {
        !matches!(
            self,
            DocumentFormat::PlainText | DocumentFormat::DelimitedText { delimiter: b',' }
        )
    }

    /// Extension of the sanitized output object.
    ///
    /// Text formats keep their own extension; converted formats use a
    /// plain-text-compatible one.
    pub fn output_extension(&self, original_ext: &str) -> String {
        match self {
            DocumentFormat::PlainText | DocumentFormat::DelimitedText { delimiter: b',' } => {
                original_ext.to_ascii_lowercase()
            }
            DocumentFormat::DelimitedText { .. } | DocumentFormat::Spreadsheet => {
                "csv".to_string()
            }
            _ => "txt".to_string(),
        }
    }

    /// MIME type of the sanitized output
    pub fn output_content_type(&self) -> &'static str {
        match self {
            DocumentFormat::DelimitedText { .. } | DocumentFormat::Spreadsheet => "text/csv",
            _ => "text/plain",
        }
    }

    /// Short name used in logs and object metadata
    pub fn name(&self) -> &'static str {
        match self {
            DocumentFormat::PlainText => "text",
            DocumentFormat::DelimitedText { .. } => "delimited",
            DocumentFormat::PdfDocument => "pdf",
            DocumentFormat::WordDocument => "word",
            DocumentFormat::Spreadsheet => "spreadsheet",
            DocumentFormat::Presentation => "presentation",
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
