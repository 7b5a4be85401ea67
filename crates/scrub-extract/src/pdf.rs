//! PDF document content extraction

use crate::{
    config::ExtractorConfig, error::Result, format::DocumentFormat, ExtractError, ExtractResult,
    Extractor,
};
use lopdf::Document;
use tracing::{debug, warn};

/// PDF document content extractor
pub struct PdfExtractor {
    config: ExtractorConfig,
}

impl PdfExtractor {
    /// Create a new PDF extractor with the given configuration
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Extract text from a loaded document, page by page
    fn extract_from_document(&self, doc: &Document) -> Result<ExtractResult> {
        let pages = doc.get_pages();
        let mut text_parts: Vec<String> = Vec::with_capacity(pages.len());
        let mut unreadable: Vec<u32> = Vec::new();
        let mut total_len = 0usize;

        for page_num in pages.keys() {
            let part = match doc.extract_text(&[*page_num]) {
                Ok(page_text) => clean_text(&page_text),
                Err(e) => {
                    debug!(page = page_num, error = %e, "PDF page text extraction failed");
                    unreadable.push(*page_num);
                    page_placeholder(*page_num)
                }
            };
            if part.is_empty() {
                continue;
            }

            total_len += part.len();
            if total_len > self.config.max_text_length {
                return Err(ExtractError::ContentTooLarge {
                    size: total_len,
                    max: self.config.max_text_length,
                });
            }
            text_parts.push(part);
        }

        if !unreadable.is_empty() {
            warn!(
                pages = pages.len(),
                unreadable = unreadable.len(),
                "PDF extracted with unreadable pages"
            );
        }

        let unreadable_list = unreadable
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",");

        Ok(
            ExtractResult::new(text_parts.join("\n\n"), DocumentFormat::PdfDocument)
                .with_placeholders(unreadable.len())
                .with_metadata("page_count", pages.len().to_string())
                .with_metadata("unreadable_pages", unreadable_list),
        )
    }
}

impl Extractor for PdfExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::PdfDocument
    }

    fn extract(&self, bytes: &[u8]) -> Result<ExtractResult> {
        let doc = Document::load_mem(bytes)?;
        self.extract_from_document(&doc)
    }
}

/// Placeholder line for a page whose text could not be extracted
pub fn page_placeholder(page: u32) -> String {
    format!("[Page {page}: text could not be extracted]")
}

/// Collapse whitespace runs, keeping the first newline of each run
fn clean_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_was_whitespace = false;

    for c in text.chars() {
        if c.is_whitespace() {
            if !prev_was_whitespace {
                result.push(if c == '\n' { '\n' } else { ' ' });
                prev_was_whitespace = true;
            }
        } else {
            result.push(c);
            prev_was_whitespace = false;
        }
    }

    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    fn hello_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal("Hello World")]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_extracts_page_text() {
        let result = PdfExtractor::new(ExtractorConfig::default())
            .extract(&hello_pdf())
            .unwrap();
        assert!(result.text.contains("Hello World"));
        assert_eq!(result.metadata("page_count"), Some("1"));
        assert!(!result.is_partial());
    }

    #[test]
    fn test_garbage_is_an_error() {
        let err = PdfExtractor::new(ExtractorConfig::default())
            .extract(b"definitely not a pdf")
            .unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn test_placeholder_text() {
        assert_eq!(page_placeholder(3), "[Page 3: text could not be extracted]");
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  a \n\n  b\t\tc "), "a\nb c");
    }
}
