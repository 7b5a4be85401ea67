//! Shared helpers for Office Open XML containers (docx, xlsx, pptx).
//!
//! OOXML files are zip archives of XML parts. Text extraction only needs a
//! forgiving pull tokenizer over those parts, so this module provides one
//! instead of a full XML parser: tags, text and CDATA are reported in
//! document order, entities are decoded, and everything else is skipped.

use crate::error::{ExtractError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// An opened OOXML container
pub type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

/// Open raw bytes as a zip container
pub fn open_archive(bytes: &[u8]) -> Result<Archive<'_>> {
    Ok(ZipArchive::new(Cursor::new(bytes))?)
}

/// Read a part as UTF-8, refusing parts that decompress beyond `max_size`
pub fn read_part(archive: &mut Archive<'_>, name: &str, max_size: u64) -> Result<String> {
    let file = archive.by_name(name).map_err(|e| match e {
        zip::result::ZipError::FileNotFound => ExtractError::MissingPart(name.to_string()),
        other => other.into(),
    })?;

    if file.size() > max_size {
        return Err(ExtractError::Parse(format!(
            "part {name} is {} bytes, limit is {max_size}",
            file.size()
        )));
    }

    let mut content = String::with_capacity(file.size() as usize);
    file.take(max_size + 1).read_to_string(&mut content)?;
    Ok(content)
}

/// Names of all parts in the container, in archive order
pub fn part_names(archive: &Archive<'_>) -> Vec<String> {
    archive.file_names().map(str::to_string).collect()
}

/// A token produced by [`XmlTokens`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent<'a> {
    /// Opening tag; `empty` is true for self-closing tags
    Start {
        name: &'a str,
        attrs: &'a str,
        empty: bool,
    },
    /// Closing tag
    End { name: &'a str },
    /// Character data with entities decoded
    Text(Cow<'a, str>),
}

impl XmlEvent<'_> {
    /// Local name of a start or end tag (namespace prefix removed)
    pub fn local_name(&self) -> Option<&str> {
        match self {
            XmlEvent::Start { name, .. } | XmlEvent::End { name } => Some(local_name(name)),
            XmlEvent::Text(_) => None,
        }
    }
}

/// Pull tokenizer over an XML document
pub struct XmlTokens<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> XmlTokens<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn skip_past(&mut self, terminator: &str) -> Result<()> {
        match self.src[self.pos..].find(terminator) {
            Some(offset) => {
                self.pos += offset + terminator.len();
                Ok(())
            }
            None => Err(unterminated(self.pos)),
        }
    }
}

impl<'a> Iterator for XmlTokens<'a> {
    type Item = Result<XmlEvent<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let rest = &self.src[self.pos..];
            if rest.is_empty() {
                return None;
            }

            if !rest.starts_with('<') {
                let end = rest.find('<').unwrap_or(rest.len());
                self.pos += end;
                return Some(Ok(XmlEvent::Text(unescape(&rest[..end]))));
            }

            if rest.starts_with("<![CDATA[") {
                let start = self.pos + "<![CDATA[".len();
                return Some(match self.src[start..].find("]]>") {
                    Some(offset) => {
                        self.pos = start + offset + "]]>".len();
                        Ok(XmlEvent::Text(Cow::Borrowed(&self.src[start..start + offset])))
                    }
                    None => Err(unterminated(self.pos)),
                });
            }

            if rest.starts_with("<!--") {
                if let Err(e) = self.skip_past("-->") {
                    return Some(Err(e));
                }
                continue;
            }

            if rest.starts_with("<?") || rest.starts_with("<!") {
                if let Err(e) = self.skip_past(">") {
                    return Some(Err(e));
                }
                continue;
            }

            let Some(close) = rest.find('>') else {
                return Some(Err(unterminated(self.pos)));
            };
            let inner = &rest[1..close];
            self.pos += close + 1;

            if let Some(name) = inner.strip_prefix('/') {
                return Some(Ok(XmlEvent::End { name: name.trim() }));
            }

            let (inner, empty) = match inner.strip_suffix('/') {
                Some(stripped) => (stripped, true),
                None => (inner, false),
            };
            let name_end = inner
                .find(|c: char| c.is_ascii_whitespace())
                .unwrap_or(inner.len());
            if name_end == 0 {
                return Some(Err(ExtractError::Parse(format!(
                    "empty tag name at offset {}",
                    self.pos
                ))));
            }

            return Some(Ok(XmlEvent::Start {
                name: &inner[..name_end],
                attrs: &inner[name_end..],
                empty,
            }));
        }
    }
}

fn unterminated(offset: usize) -> ExtractError {
    ExtractError::Parse(format!("unterminated markup at offset {offset}"))
}

/// Strip a namespace prefix from a tag name
pub fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

static ATTR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_][\w.:-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

/// Value of the attribute `key` (exact, prefixed name) with entities decoded
pub fn attr<'a>(attrs: &'a str, key: &str) -> Option<Cow<'a, str>> {
    ATTR_PATTERN.captures_iter(attrs).find_map(|caps| {
        if caps.get(1)?.as_str() != key {
            return None;
        }
        let value = caps.get(2).or_else(|| caps.get(3))?;
        Some(unescape(value.as_str()))
    })
}

/// Decode the predefined XML entities and numeric character references.
///
/// Unknown or malformed references are kept verbatim.
pub fn unescape(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|semi| *semi <= 12)
            .and_then(|semi| decode_entity(&tail[1..semi]).map(|c| (c, semi)));

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                entity.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}

/// Collapse a run of text lines: trim each, drop empty ones
pub fn tidy_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
