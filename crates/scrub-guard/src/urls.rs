//! Link and URL stripping
//!
//! Anchors and Markdown links keep their visible text; bare URLs are dropped.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static HTML_ANCHOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<a\b[^>]*>(?P<text>.*?)</a\s*>").unwrap());

static MARKDOWN_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"!?\[(?P<text>[^\]\n]*)\]\([^)\s]*(?:\s+"[^"]*")?\)"#).unwrap()
});

static BARE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\b(?:(?:https?|ftp)://|www\.)[^\s<>"']+"#).unwrap());

/// Sentence punctuation that may trail a bare URL and belongs to the prose
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']'];

/// Strip links from `text`, returning the new text and the number of links removed
pub fn strip_urls(text: &str) -> (String, usize) {
    let mut count = 0;

    let text = HTML_ANCHOR.replace_all(text, |caps: &Captures| {
        count += 1;
        caps["text"].to_string()
    });

    let text = MARKDOWN_LINK.replace_all(&text, |caps: &Captures| {
        count += 1;
        caps["text"].to_string()
    });

    let text = BARE_URL.replace_all(&text, |caps: &Captures| {
        count += 1;
        let url = &caps[0];
        let kept = url.trim_end_matches(TRAILING_PUNCTUATION);
        url[kept.len()..].to_string()
    });

    (text.into_owned(), count)
}
