//! Word document extraction.
//!
//! Extraction is tiered. A well-formed `.docx` is read straight from
//! `word/document.xml`. When that part is missing or damaged but the zip
//! container opens, every other `word/*.xml` part is scanned for text runs.
//! Anything that is not a zip container (legacy `.doc`, truncated uploads) is
//! scavenged for printable UTF-16LE and ASCII runs.

use crate::{
    config::ExtractorConfig,
    error::{ExtractError, Result},
    format::DocumentFormat,
    ooxml::{self, XmlEvent, XmlTokens},
    ExtractResult, Extractor,
};
use tracing::{debug, warn};

const DOCUMENT_PART: &str = "word/document.xml";

/// How the text of a Word document was recovered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordMethod {
    DocumentXml,
    XmlParts,
    BinaryScan,
}

impl WordMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            WordMethod::DocumentXml => "document_xml",
            WordMethod::XmlParts => "xml_parts",
            WordMethod::BinaryScan => "binary_scan",
        }
    }
}

/// Word (`.docx`, `.doc`) extractor
pub struct WordExtractor {
    config: ExtractorConfig,
}

impl WordExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    fn from_container(&self, bytes: &[u8]) -> Result<(String, WordMethod)> {
        let mut archive = ooxml::open_archive(bytes)?;

        match ooxml::read_part(&mut archive, DOCUMENT_PART, self.config.max_part_size)
            .and_then(|xml| paragraphs_to_text(&xml))
        {
            Ok(text) => return Ok((text, WordMethod::DocumentXml)),
            Err(e) => debug!(error = %e, "document.xml unreadable, scanning other parts"),
        }

        let mut parts: Vec<String> = Vec::new();
        for name in ooxml::part_names(&archive) {
            if name == DOCUMENT_PART || !name.starts_with("word/") || !name.ends_with(".xml") {
                continue;
            }
            let text = ooxml::read_part(&mut archive, &name, self.config.max_part_size)
                .and_then(|xml| paragraphs_to_text(&xml));
            match text {
                Ok(text) if !text.trim().is_empty() => parts.push(text),
                Ok(_) => {}
                Err(e) => debug!(part = %name, error = %e, "Skipping unreadable Word part"),
            }
        }

        if parts.is_empty() {
            return Err(ExtractError::MissingPart(DOCUMENT_PART.to_string()));
        }
        Ok((parts.join("\n\n"), WordMethod::XmlParts))
    }
}

impl Extractor for WordExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::WordDocument
    }

    fn extract(&self, bytes: &[u8]) -> Result<ExtractResult> {
        let (text, method) = match self.from_container(bytes) {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "Word container unreadable, falling back to binary scan");
                let text = scan_binary_text(bytes, self.config.min_run_length);
                if text.is_empty() {
                    return Err(ExtractError::Parse(format!(
                        "no readable text in Word document ({e})"
                    )));
                }
                (text, WordMethod::BinaryScan)
            }
        };

        Ok(ExtractResult::new(text, self.format())
            .with_metadata("extraction_method", method.as_str()))
    }
}

/// Convert WordprocessingML to text: one line per paragraph, breaks kept.
/// Tabs become a single space, as the ASCII output has no tab stops. Only
/// `w:t` runs contribute characters.
pub fn paragraphs_to_text(xml: &str) -> Result<String> {
    let mut out = String::new();
    let mut in_text = false;
    // tab stop definitions inside paragraph properties share the `tab` name
    let mut in_tab_stops = false;

    for event in XmlTokens::new(xml) {
        let event = event?;
        match (&event, event.local_name()) {
            (XmlEvent::Start { empty: false, .. }, Some("t")) => in_text = true,
            (XmlEvent::End { .. }, Some("t")) => in_text = false,
            (XmlEvent::Start { empty: false, .. }, Some("tabs")) => in_tab_stops = true,
            (XmlEvent::End { .. }, Some("tabs")) => in_tab_stops = false,
            (XmlEvent::Start { .. }, Some("tab")) if !in_tab_stops => out.push(' '),
            (XmlEvent::Start { .. }, Some("br" | "cr")) => out.push('\n'),
            (XmlEvent::End { .. }, Some("p")) => out.push('\n'),
            (XmlEvent::Text(text), None) if in_text => out.push_str(text),
            _ => {}
        }
    }

    Ok(out.trim_end().to_string())
}

/// Recover printable text runs from an arbitrary binary.
///
/// Both UTF-16LE and single-byte runs of at least `min_run` characters are
/// collected and returned in file order, one run per line.
pub fn scan_binary_text(bytes: &[u8], min_run: usize) -> String {
    let min_run = min_run.max(1);
    let mut runs: Vec<(usize, String)> = Vec::new();

    // single-byte runs
    let mut start = 0;
    let mut current = String::new();
    for (i, &b) in bytes.iter().enumerate() {
        if is_printable(b) {
            if current.is_empty() {
                start = i;
            }
            current.push(b as char);
        } else {
            push_run(&mut runs, start, &mut current, min_run);
        }
    }
    push_run(&mut runs, start, &mut current, min_run);

    // UTF-16LE runs, both alignments
    for offset in 0..2 {
        let mut i = offset;
        while i + 1 < bytes.len() {
            let (lo, hi) = (bytes[i], bytes[i + 1]);
            if hi == 0 && is_printable(lo) {
                if current.is_empty() {
                    start = i;
                }
                current.push(lo as char);
            } else {
                push_run(&mut runs, start, &mut current, min_run);
            }
            i += 2;
        }
        push_run(&mut runs, start, &mut current, min_run);
    }

    runs.sort_by_key(|(offset, _)| *offset);
    runs.dedup_by(|a, b| a.1 == b.1);

    runs.into_iter()
        .map(|(_, run)| run)
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_printable(b: u8) -> bool {
    (0x20..0x7f).contains(&b) || b == b'\t'
}

fn push_run(runs: &mut Vec<(usize, String)>, start: usize, current: &mut String, min_run: usize) {
    let run = std::mem::take(current);
    let trimmed = run.trim();
    if trimmed.chars().count() >= min_run && trimmed.chars().any(|c| c.is_ascii_alphanumeric()) {
        runs.push((start, trimmed.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::fixtures::zip_parts;

    const BODY: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Contract with ACME</w:t></w:r><w:r><w:t xml:space="preserve"> Corporation</w:t></w:r></w:p>
    <w:p><w:r><w:t>Name</w:t><w:tab/><w:t>Jane</w:t><w:br/><w:t>Second line</w:t></w:r></w:p>
  </w:body>
</w:document>"#;

    fn extractor() -> WordExtractor {
        WordExtractor::new(ExtractorConfig::default())
    }

    #[test]
    fn test_docx_paragraphs() {
        let docx = zip_parts(&[("word/document.xml", BODY)]);
        let result = extractor().extract(&docx).unwrap();
        assert_eq!(
            result.text,
            "Contract with ACME Corporation\nName Jane\nSecond line"
        );
        assert_eq!(result.metadata("extraction_method"), Some("document_xml"));
    }

    #[test]
    fn test_tab_becomes_space_and_tab_stops_are_ignored() {
        let xml = r#"<w:document><w:body><w:p>
            <w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr>
            <w:r><w:t>Total</w:t><w:tab/><w:t>42</w:t></w:r>
        </w:p></w:body></w:document>"#;
        assert_eq!(paragraphs_to_text(xml).unwrap(), "Total 42");
    }

    #[test]
    fn test_damaged_document_part_falls_back_to_other_parts() {
        let docx = zip_parts(&[
            ("word/document.xml", "<w:document><w:body><w:p"),
            ("word/footer1.xml", "<w:ftr><w:p><w:t>Confidential</w:t></w:p></w:ftr>"),
        ]);
        let result = extractor().extract(&docx).unwrap();
        assert_eq!(result.text, "Confidential");
        assert_eq!(result.metadata("extraction_method"), Some("xml_parts"));
    }

    #[test]
    fn test_legacy_binary_scan() {
        let mut doc = vec![0xD0, 0xCF, 0x11, 0xE0, 0x00, 0x01];
        doc.extend("Quarterly report".encode_utf16().flat_map(|u| u.to_le_bytes()));
        doc.extend([0x00, 0x00, 0x03]);
        let result = extractor().extract(&doc).unwrap();
        assert!(result.text.contains("Quarterly report"));
        assert_eq!(result.metadata("extraction_method"), Some("binary_scan"));
    }

    #[test]
    fn test_nothing_readable_is_an_error() {
        let err = extractor().extract(&[0u8, 1, 2, 3, 0xff]).unwrap_err();
        assert!(matches!(err, ExtractError::Parse(_)));
    }

    #[test]
    fn test_scan_respects_min_run() {
        assert_eq!(scan_binary_text(b"\x00ab\x00abcdef\x00", 4), "abcdef");
    }
}
