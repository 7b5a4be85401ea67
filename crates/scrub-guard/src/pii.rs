//! PII (Personally Identifiable Information) detection and redaction

use crate::config::PatternToggles;
use crate::types::{PiiKind, RuleHit, RuleStep};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

struct PiiPatterns {
    email: Regex,
    credit_card: Regex,
    ssn: Regex,
    phone: Regex,
    ip_v4: Regex,
    ip_v6: Regex,
    drivers_license: Regex,
}

static PATTERNS: Lazy<PiiPatterns> = Lazy::new(|| PiiPatterns {
    // Email addresses
    email: Regex::new(r"(?i)\b[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}\b").unwrap(),
    // Payment cards: 4-4-4-4 with optional separators, 4-6-5 (Amex), or a bare 15-16 digit run
    credit_card: Regex::new(
        r"\b(?:\d{4}[- ]?){3}\d{4}\b|\b\d{4}[- ]?\d{6}[- ]?\d{5}\b|\b\d{15,16}\b",
    )
    .unwrap(),
    // SSN: 123-45-6789 or 123 45 6789
    ssn: Regex::new(r"\b\d{3}[- ]\d{2}[- ]\d{4}\b").unwrap(),
    // Phone numbers: optional +1, area code with or without parentheses
    phone: Regex::new(r"(?:\+?\b1[-. ]?)?(?:\(\d{3}\)|\b\d{3})[-. ]?\d{3}[-. ]?\d{4}\b").unwrap(),
    // IPv4 addresses
    ip_v4: Regex::new(
        r"\b(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\b",
    )
    .unwrap(),
    // IPv6 addresses (full form)
    ip_v6: Regex::new(r"\b(?:[0-9a-fA-F]{1,4}:){7}[0-9a-fA-F]{1,4}\b").unwrap(),
    // Driver's license: a label followed by a number containing at least one digit
    drivers_license: Regex::new(
        r"(?P<label>\b(?i:driver'?s?\s+licen[cs]e|DL)(?:\s*(?i:#|no\.?|number))?\s*[:#]?\s*)[A-Za-z]{0,3}[0-9][A-Za-z0-9-]{4,14}\b",
    )
    .unwrap(),
});

/// PII detector for identifying and redacting sensitive information
pub struct PiiDetector {
    toggles: PatternToggles,
}

impl PiiDetector {
    /// Create a new PII detector for the enabled patterns
    pub fn new(toggles: PatternToggles) -> Self {
        Self { toggles }
    }

    /// Whether a detector is switched on
    pub fn is_enabled(&self, kind: PiiKind) -> bool {
        match kind {
            PiiKind::Email => self.toggles.email,
            PiiKind::CreditCard => self.toggles.credit_card,
            PiiKind::Ssn => self.toggles.ssn,
            PiiKind::Phone => self.toggles.phone,
            PiiKind::IpAddress => self.toggles.ip_address,
            PiiKind::DriversLicense => self.toggles.drivers_license,
        }
    }

    /// Replace every enabled detector's matches with its token.
    ///
    /// Detectors run in [`PiiKind::ALL`] order, each over the output of the
    /// previous one. Returns the new text and one hit per detector that matched.
    pub fn redact(&self, text: &str) -> (String, Vec<RuleHit>) {
        let mut current = text.to_string();
        let mut hits = Vec::new();

        for kind in PiiKind::ALL {
            if !self.is_enabled(kind) {
                continue;
            }

            let (next, count) = redact_kind(kind, &current);
            if count > 0 {
                hits.push(RuleHit {
                    step: RuleStep::Pattern,
                    rule: kind.name().to_string(),
                    count,
                });
                current = next;
            }
        }

        (current, hits)
    }
}

fn redact_kind(kind: PiiKind, text: &str) -> (String, usize) {
    let patterns = &*PATTERNS;
    match kind {
        PiiKind::Email => replace_counted(&patterns.email, text, kind.token()),
        PiiKind::Ssn => replace_counted(&patterns.ssn, text, kind.token()),
        PiiKind::Phone => replace_counted(&patterns.phone, text, kind.token()),
        PiiKind::CreditCard => {
            // Only Luhn-valid digit runs count as card numbers
            let mut count = 0;
            let out = patterns.credit_card.replace_all(text, |caps: &Captures| {
                let digits: String = caps[0].chars().filter(|c| c.is_ascii_digit()).collect();
                if luhn_check(&digits) {
                    count += 1;
                    kind.token().to_string()
                } else {
                    caps[0].to_string()
                }
            });
            (out.into_owned(), count)
        }
        PiiKind::IpAddress => {
            let (v4, c4) = replace_counted(&patterns.ip_v4, text, kind.token());
            let (v6, c6) = replace_counted(&patterns.ip_v6, &v4, kind.token());
            (v6, c4 + c6)
        }
        PiiKind::DriversLicense => {
            let mut count = 0;
            let out = patterns.drivers_license.replace_all(text, |caps: &Captures| {
                count += 1;
                format!("{}{}", &caps["label"], kind.token())
            });
            (out.into_owned(), count)
        }
    }
}

fn replace_counted(pattern: &Regex, text: &str, token: &str) -> (String, usize) {
    let count = pattern.find_iter(text).count();
    if count == 0 {
        return (text.to_string(), 0);
    }
    (
        pattern.replace_all(text, regex::NoExpand(token)).into_owned(),
        count,
    )
}

/// Luhn algorithm for credit card validation
fn luhn_check(number: &str) -> bool {
    let digits: Vec<u32> = number.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() < 13 {
        return false;
    }

    let mut sum = 0;
    let mut double = false;

    for &digit in digits.iter().rev() {
        let mut d = digit;
        if double {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
        double = !double;
    }

    sum % 10 == 0
}
