//! Audit logging for redaction runs

use crate::types::{AuditEntry, RedactionOutcome};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::info;

/// Audit logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Enable audit logging
    pub enabled: bool,
    /// Include per-rule hit counts in the event
    pub log_hits: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_hits: true,
        }
    }
}

/// Audit logger
#[derive(Debug, Clone, Default)]
pub struct AuditLogger {
    config: AuditConfig,
}

impl AuditLogger {
    /// Create a new audit logger
    pub fn new(config: AuditConfig) -> Self {
        Self { config }
    }

    /// Build the audit entry for one document; the text itself is only hashed
    pub fn entry(
        &self,
        source: &str,
        user_id: Option<&str>,
        original: &str,
        outcome: &RedactionOutcome,
    ) -> AuditEntry {
        AuditEntry {
            source: source.to_string(),
            user_id: user_id.map(str::to_string),
            content_hash: hash_content(original),
            redacted: outcome.redacted,
            hits: if self.config.log_hits {
                outcome.hits.clone()
            } else {
                Vec::new()
            },
        }
    }

    /// Log a redaction event
    pub fn log(
        &self,
        source: &str,
        user_id: Option<&str>,
        original: &str,
        outcome: &RedactionOutcome,
    ) -> Option<AuditEntry> {
        if !self.config.enabled {
            return None;
        }

        let entry = self.entry(source, user_id, original, outcome);
        info!(
            target: "scrub::audit",
            source = %entry.source,
            user_id = ?entry.user_id,
            content_hash = %entry.content_hash,
            redacted = entry.redacted,
            matches = outcome.total_matches(),
            hits = ?entry.hits,
            "Redaction audit"
        );
        Some(entry)
    }
}

/// Hash content for audit (privacy-preserving)
fn hash_content(content: &str) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConditionalRule, RedactionConfig};
    use crate::engine::Redactor;
    use crate::types::{RuleHit, RuleStep};

    fn outcome() -> RedactionOutcome {
        RedactionOutcome {
            text: "[SSN]".to_string(),
            redacted: true,
            hits: vec![RuleHit {
                step: RuleStep::Pattern,
                rule: "ssn".to_string(),
                count: 1,
            }],
        }
    }

    #[test]
    fn test_entry_never_contains_text() {
        let logger = AuditLogger::default();
        let entry = logger
            .log("users/u1/a.txt", Some("u1"), "123-45-6789", &outcome())
            .unwrap();
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("123-45-6789"));
        assert_eq!(entry.user_id.as_deref(), Some("u1"));
        assert_eq!(entry.hits.len(), 1);
    }

    #[test]
    fn test_entry_never_contains_find_terms() {
        let config = RedactionConfig::default()
            .with_replacement("Project Nightingale", "[CODENAME]")
            .with_conditional_rule(
                ConditionalRule::new("codenames")
                    .with_trigger("Nightingale")
                    .with_replacement("Kestrel", "[CODENAME]"),
            );
        let original = "Project Nightingale and Kestrel";
        let outcome = Redactor::new(config).unwrap().redact(original);
        assert!(outcome.redacted);

        let entry = AuditLogger::default()
            .log("users/u1/a.txt", Some("u1"), original, &outcome)
            .unwrap();
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("Nightingale"));
        assert!(!json.contains("Kestrel"));
        assert_eq!(entry.hits.len(), 2);
    }

    #[test]
    fn test_disabled_logger() {
        let logger = AuditLogger::new(AuditConfig {
            enabled: false,
            ..Default::default()
        });
        assert!(logger.log("a.txt", None, "x", &outcome()).is_none());
    }

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(hash_content("same"), hash_content("same"));
        assert_ne!(hash_content("same"), hash_content("other"));
    }
}
