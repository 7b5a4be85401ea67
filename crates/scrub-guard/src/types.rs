//! Core types for Scrub Guard

use serde::{Deserialize, Serialize};

/// Result of running the rule engine over one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionOutcome {
    /// The redacted text (not yet normalized)
    pub text: String,
    /// Whether any step changed the text
    pub redacted: bool,
    /// Per-rule match counts, in application order
    pub hits: Vec<RuleHit>,
}

impl RedactionOutcome {
    /// Total number of matches replaced across all steps
    pub fn total_matches(&self) -> usize {
        self.hits.iter().map(|h| h.count).sum()
    }

    /// Match count for one step
    pub fn matches_in(&self, step: RuleStep) -> usize {
        self.hits
            .iter()
            .filter(|h| h.step == step)
            .map(|h| h.count)
            .sum()
    }
}

/// One rule that matched at least once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleHit {
    /// Engine step the rule belongs to
    pub step: RuleStep,
    /// Rule label: conditional rule name, `replacement#N`, or detector name
    pub rule: String,
    /// Number of matches replaced
    pub count: usize,
}

/// Engine steps, in application order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStep {
    UrlStripping,
    Conditional,
    Replacement,
    Pattern,
}

impl std::fmt::Display for RuleStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleStep::UrlStripping => write!(f, "url_stripping"),
            RuleStep::Conditional => write!(f, "conditional"),
            RuleStep::Replacement => write!(f, "replacement"),
            RuleStep::Pattern => write!(f, "pattern"),
        }
    }
}

/// Built-in PII detector kinds, in registry order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiKind {
    /// Email address
    Email,
    /// Payment card number
    CreditCard,
    /// Social Security Number
    Ssn,
    /// Telephone number
    Phone,
    /// IPv4 or IPv6 address
    IpAddress,
    /// Driver's license number
    DriversLicense,
}

impl PiiKind {
    /// Every detector, in the order the engine applies them
    pub const ALL: [PiiKind; 6] = [
        PiiKind::Email,
        PiiKind::CreditCard,
        PiiKind::Ssn,
        PiiKind::Phone,
        PiiKind::IpAddress,
        PiiKind::DriversLicense,
    ];

    /// Key used in the config's `patterns` object
    pub fn name(&self) -> &'static str {
        match self {
            PiiKind::Email => "email",
            PiiKind::CreditCard => "credit_card",
            PiiKind::Ssn => "ssn",
            PiiKind::Phone => "phone",
            PiiKind::IpAddress => "ip_address",
            PiiKind::DriversLicense => "drivers_license",
        }
    }

    /// Replacement token written in place of a match
    pub fn token(&self) -> &'static str {
        match self {
            PiiKind::Email => "[EMAIL]",
            PiiKind::CreditCard => "[CREDIT_CARD]",
            PiiKind::Ssn => "[SSN]",
            PiiKind::Phone => "[PHONE]",
            PiiKind::IpAddress => "[IP_ADDRESS]",
            PiiKind::DriversLicense => "[LICENSE]",
        }
    }
}

impl std::fmt::Display for PiiKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Audit record for one redacted document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Object key of the source document
    pub source: String,
    /// Owning user, when known
    pub user_id: Option<String>,
    /// Hash of the original text (the text itself is never logged)
    pub content_hash: String,
    /// Whether the text was changed
    pub redacted: bool,
    /// Matches per step
    pub hits: Vec<RuleHit>,
}
