//! PowerPoint extraction

use crate::{
    config::ExtractorConfig,
    error::{ExtractError, Result},
    format::DocumentFormat,
    ooxml::{self, XmlEvent, XmlTokens},
    ExtractResult, Extractor,
};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

static SLIDE_PART: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").unwrap());

/// PowerPoint (`.pptx`) extractor.
///
/// Slides are emitted in numeric order, each under a `--- Slide N ---` header.
pub struct PresentationExtractor {
    config: ExtractorConfig,
}

impl PresentationExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }
}

impl Extractor for PresentationExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Presentation
    }

    fn extract(&self, bytes: &[u8]) -> Result<ExtractResult> {
        let mut archive = ooxml::open_archive(bytes)?;

        let mut slides: Vec<(u32, String)> = ooxml::part_names(&archive)
            .into_iter()
            .filter_map(|name| {
                let number = SLIDE_PART.captures(&name)?.get(1)?.as_str().parse().ok()?;
                Some((number, name))
            })
            .collect();
        if slides.is_empty() {
            return Err(ExtractError::MissingPart("ppt/slides/slide1.xml".to_string()));
        }
        slides.sort_by_key(|(number, _)| *number);

        let mut sections = Vec::with_capacity(slides.len());
        let mut unreadable: Vec<u32> = Vec::new();
        for (number, part) in &slides {
            let body = ooxml::read_part(&mut archive, part, self.config.max_part_size)
                .and_then(|xml| slide_to_text(&xml));
            let body = match body {
                Ok(body) => body,
                Err(e) => {
                    debug!(slide = number, error = %e, "Slide content extraction failed");
                    unreadable.push(*number);
                    slide_placeholder(*number)
                }
            };

            let mut section = format!("--- Slide {number} ---");
            if !body.is_empty() {
                section.push('\n');
                section.push_str(&body);
            }
            sections.push(section);
        }

        if !unreadable.is_empty() {
            warn!(
                slides = slides.len(),
                unreadable = unreadable.len(),
                "Presentation extracted with unreadable slides"
            );
        }

        let unreadable_list = unreadable
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",");

        Ok(ExtractResult::new(sections.join("\n\n"), self.format())
            .with_placeholders(unreadable.len())
            .with_metadata("slide_count", slides.len().to_string())
            .with_metadata("unreadable_slides", unreadable_list))
    }
}

/// Placeholder line for a slide whose content could not be extracted
pub fn slide_placeholder(slide: u32) -> String {
    format!("[Slide {slide}: content could not be extracted]")
}

/// Text of one slide: each DrawingML paragraph on its own line
pub fn slide_to_text(xml: &str) -> Result<String> {
    let mut out = String::new();
    let mut in_text = false;

    for event in XmlTokens::new(xml) {
        let event = event?;
        match (&event, event.local_name()) {
            (XmlEvent::Start { empty: false, .. }, Some("t")) => in_text = true,
            (XmlEvent::End { .. }, Some("t")) => in_text = false,
            (XmlEvent::Start { .. }, Some("br")) => out.push('\n'),
            (XmlEvent::End { .. }, Some("p")) => out.push('\n'),
            (XmlEvent::Text(text), None) if in_text => out.push_str(text),
            _ => {}
        }
    }

    Ok(ooxml::tidy_lines(&out))
}
