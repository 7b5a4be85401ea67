//! Output normalization to 7-bit ASCII
//!
//! Runs once on the fully redacted text. Typographic punctuation and space
//! variants are folded to their closest ASCII form; every other non-ASCII code
//! point becomes a space so nothing in the output resembles a replacement glyph.

use serde::{Deserialize, Serialize};

/// Line terminator written to output objects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    Crlf,
    /// Keep `\r\n` where the input had it, `\n` otherwise
    Preserve,
}

/// ASCII replacement for a non-ASCII character, if one is defined
fn fold(c: char) -> Option<&'static str> {
    let folded = match c {
        // quotes and primes
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' | '\u{00B4}' => "'",
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' | '\u{00AB}'
        | '\u{00BB}' => "\"",
        '\u{2039}' => "<",
        '\u{203A}' => ">",
        // dashes and hyphens
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2212}' | '\u{00AD}' => "-",
        '\u{2014}' | '\u{2015}' => "--",
        // ellipsis and bullets
        '\u{2026}' => "...",
        '\u{2022}' | '\u{2023}' | '\u{25E6}' | '\u{2043}' | '\u{2219}' | '\u{00B7}' => "*",
        // math
        '\u{00D7}' => "x",
        '\u{00F7}' => "/",
        '\u{00B1}' => "+/-",
        '\u{2264}' => "<=",
        '\u{2265}' => ">=",
        '\u{2260}' => "!=",
        '\u{2248}' => "~",
        '\u{2044}' | '\u{2215}' => "/",
        // symbols
        '\u{00A9}' => "(c)",
        '\u{00AE}' => "(R)",
        '\u{2122}' => "(TM)",
        '\u{00B0}' => " deg",
        // spaces
        '\u{00A0}' | '\u{2002}' | '\u{2003}' | '\u{2004}' | '\u{2005}' | '\u{2006}'
        | '\u{2007}' | '\u{2008}' | '\u{2009}' | '\u{200A}' | '\u{202F}' | '\u{205F}'
        | '\u{3000}' => " ",
        // zero width
        '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' => "",
        _ => return None,
    };
    Some(folded)
}

struct AsciiWriter {
    out: String,
    line_ending: LineEnding,
}

impl AsciiWriter {
    fn push(&mut self, c: char) {
        if c == ' ' {
            // collapse runs of spaces
            if !self.out.ends_with(' ') {
                self.out.push(' ');
            }
        } else {
            self.out.push(c);
        }
    }

    fn push_str(&mut self, s: &str) {
        for c in s.chars() {
            self.push(c);
        }
    }

    fn trim_trailing_spaces(&mut self) {
        let trimmed = self.out.trim_end_matches(' ').len();
        self.out.truncate(trimmed);
    }

    fn line_break(&mut self, was_crlf: bool) {
        self.trim_trailing_spaces();
        let crlf = match self.line_ending {
            LineEnding::Lf => false,
            LineEnding::Crlf => true,
            LineEnding::Preserve => was_crlf,
        };
        self.out.push_str(if crlf { "\r\n" } else { "\n" });
    }
}

/// Normalize text to 7-bit ASCII with the requested line terminator
pub fn normalize(text: &str, line_ending: LineEnding) -> String {
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    let mut writer = AsciiWriter {
        out: String::with_capacity(text.len()),
        line_ending,
    };

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                let was_crlf = chars.peek() == Some(&'\n');
                if was_crlf {
                    chars.next();
                }
                writer.line_break(was_crlf);
            }
            '\n' | '\u{2028}' | '\u{2029}' | '\u{0085}' => writer.line_break(false),
            ' '..='~' => writer.push(c),
            c if c.is_ascii_control() => writer.push(' '),
            c => match fold(c) {
                Some(s) => writer.push_str(s),
                None => writer.push(' '),
            },
        }
    }

    writer.trim_trailing_spaces();
    writer.out
}

/// Whether `text` satisfies the output guarantees for `line_ending`
pub fn is_normalized(text: &str, line_ending: LineEnding) -> bool {
    let allowed_cr = !matches!(line_ending, LineEnding::Lf);
    text.chars().all(|c| match c {
        ' '..='~' | '\n' => true,
        '\r' => allowed_cr,
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_typographic_folding() {
        let input = "\u{201C}Quoted\u{201D} \u{2014} it\u{2019}s 5\u{00D7}3 \u{2264} 20\u{2026}";
        assert_eq!(
            normalize(input, LineEnding::Lf),
            "\"Quoted\" -- it's 5x3 <= 20..."
        );
    }

    #[test]
    fn test_bom_and_unknown_code_points() {
        let input = "\u{FEFF}Caf\u{00E9} \u{4E2D}\u{6587} end";
        assert_eq!(normalize(input, LineEnding::Lf), "Caf end");
    }

    #[test]
    fn test_spaces_collapse() {
        let input = "a\u{00A0}\u{00A0} \t b\u{202F}c";
        assert_eq!(normalize(input, LineEnding::Lf), "a b c");
    }

    #[test]
    fn test_line_endings() {
        let input = "one  \r\ntwo\nthree\rfour";
        assert_eq!(normalize(input, LineEnding::Lf), "one\ntwo\nthree\nfour");
        assert_eq!(
            normalize(input, LineEnding::Crlf),
            "one\r\ntwo\r\nthree\r\nfour"
        );
        assert_eq!(
            normalize(input, LineEnding::Preserve),
            "one\r\ntwo\nthree\nfour"
        );
    }

    #[test]
    fn test_control_characters_removed() {
        let out = normalize("a\u{0007}b\u{0000}c\u{001B}[0m", LineEnding::Lf);
        assert_eq!(out, "a b c [0m");
        assert!(is_normalized(&out, LineEnding::Lf));
    }

    proptest! {
        #[test]
        fn prop_output_is_ascii(input in any::<String>()) {
            let out = normalize(&input, LineEnding::Lf);
            prop_assert!(out.is_ascii());
            prop_assert!(is_normalized(&out, LineEnding::Lf));
        }

        #[test]
        fn prop_crlf_output_has_no_lone_terminators(input in any::<String>()) {
            let out = normalize(&input, LineEnding::Crlf);
            prop_assert!(is_normalized(&out, LineEnding::Crlf));
            prop_assert_eq!(out.matches('\r').count(), out.matches('\n').count());
        }

        #[test]
        fn prop_normalize_is_stable(input in any::<String>()) {
            let once = normalize(&input, LineEnding::Lf);
            prop_assert_eq!(normalize(&once, LineEnding::Lf), once.clone());
        }
    }
}
