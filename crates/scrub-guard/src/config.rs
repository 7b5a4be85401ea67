//! Per-user redaction configuration

use crate::error::{GuardError, Result};
use serde::{Deserialize, Serialize};

/// Maximum number of global replacement entries a config may carry
pub const MAX_REPLACEMENTS: usize = 100;

/// Current schema version written by [`RedactionConfig::default`]
pub const CONFIG_VERSION: u32 = 1;

/// A user's redaction rule set.
///
/// Unknown keys are ignored and missing keys fall back to the documented
/// defaults, so an empty JSON object deserializes to the same value as
/// [`RedactionConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactionConfig {
    /// Schema version
    pub version: u32,
    /// Global find/replace pairs, applied in order
    pub replacements: Vec<Replacement>,
    /// Case rule for the global replacements
    pub case_sensitive: bool,
    /// Built-in PII detectors to enable
    pub patterns: PatternToggles,
    /// Trigger-gated replacement groups, applied in order
    pub conditional_rules: Vec<ConditionalRule>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            replacements: Vec::new(),
            case_sensitive: false,
            patterns: PatternToggles::default(),
            conditional_rules: Vec::new(),
        }
    }
}

impl RedactionConfig {
    /// Parse and validate a JSON config document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON config document from raw bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let config: Self = serde_json::from_slice(bytes)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the limits a stored config must respect
    pub fn validate(&self) -> Result<()> {
        if self.replacements.len() > MAX_REPLACEMENTS {
            return Err(GuardError::invalid_config(format!(
                "{} replacements exceeds the maximum of {}",
                self.replacements.len(),
                MAX_REPLACEMENTS
            )));
        }

        if let Some(index) = self.replacements.iter().position(|r| r.find.is_empty()) {
            return Err(GuardError::invalid_config(format!(
                "replacement #{} has an empty 'find' field",
                index + 1
            )));
        }

        Ok(())
    }

    /// Whether applying this config can change any text besides URLs
    pub fn has_rules(&self) -> bool {
        !self.replacements.is_empty()
            || self.conditional_rules.iter().any(|r| r.enabled)
            || self.patterns.any_enabled()
    }

    /// Add a global replacement
    pub fn with_replacement(mut self, find: impl Into<String>, replace: impl Into<String>) -> Self {
        self.replacements.push(Replacement::new(find, replace));
        self
    }

    /// Set the case rule for global replacements
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Replace the PII detector toggles
    pub fn with_patterns(mut self, patterns: PatternToggles) -> Self {
        self.patterns = patterns;
        self
    }

    /// Append a conditional rule
    pub fn with_conditional_rule(mut self, rule: ConditionalRule) -> Self {
        self.conditional_rules.push(rule);
        self
    }
}

/// A literal find/replace pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    #[serde(default)]
    pub find: String,
    #[serde(default)]
    pub replace: String,
}

impl Replacement {
    pub fn new(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            find: find.into(),
            replace: replace.into(),
        }
    }
}

/// Toggles for the built-in PII detectors.
///
/// Serialized as a `name -> bool` object; names not listed here are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternToggles {
    /// US social security numbers
    pub ssn: bool,
    /// Payment card numbers (Luhn-checked)
    pub credit_card: bool,
    /// Telephone numbers
    pub phone: bool,
    /// Email addresses
    pub email: bool,
    /// IPv4 and IPv6 addresses
    pub ip_address: bool,
    /// Driver's license numbers
    pub drivers_license: bool,
}

impl PatternToggles {
    /// Every detector enabled
    pub fn all() -> Self {
        Self {
            ssn: true,
            credit_card: true,
            phone: true,
            email: true,
            ip_address: true,
            drivers_license: true,
        }
    }

    pub fn any_enabled(&self) -> bool {
        self.ssn
            || self.credit_card
            || self.phone
            || self.email
            || self.ip_address
            || self.drivers_license
    }
}

/// A replacement group that only applies when a trigger term is present
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionalRule {
    pub name: String,
    pub enabled: bool,
    pub trigger: Trigger,
    pub replacements: Vec<RuleReplacement>,
}

impl Default for ConditionalRule {
    fn default() -> Self {
        Self {
            name: String::new(),
            enabled: true,
            trigger: Trigger::default(),
            replacements: Vec::new(),
        }
    }
}

impl ConditionalRule {
    /// Create an enabled rule with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a trigger term
    pub fn with_trigger(mut self, term: impl Into<String>) -> Self {
        self.trigger.contains.push(term.into());
        self
    }

    /// Set the trigger case rule
    pub fn with_trigger_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.trigger.case_sensitive = case_sensitive;
        self
    }

    /// Add a replacement that inherits the trigger case rule
    pub fn with_replacement(mut self, find: impl Into<String>, replace: impl Into<String>) -> Self {
        self.replacements.push(RuleReplacement {
            find: find.into(),
            replace: replace.into(),
            case_sensitive: None,
        });
        self
    }

    /// Enable or disable the rule
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Trigger terms searched for in the original text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Trigger {
    pub contains: Vec<String>,
    pub case_sensitive: bool,
}

/// A conditional rule's replacement; `case_sensitive` falls back to the trigger's
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleReplacement {
    #[serde(default)]
    pub find: String,
    #[serde(default)]
    pub replace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<bool>,
}
