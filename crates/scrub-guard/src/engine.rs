//! The redaction rule engine

use crate::config::{ConditionalRule, RedactionConfig};
use crate::error::Result;
use crate::pii::PiiDetector;
use crate::types::{RedactionOutcome, RuleHit, RuleStep};
use crate::urls::strip_urls;
use regex::{Regex, RegexBuilder};

/// Compiled form of a [`RedactionConfig`].
///
/// Building a `Redactor` escapes and compiles every find and trigger term once,
/// so a single instance can be shared across all files of a user in a batch.
///
/// When two conditional rules overlap, an earlier rule's replacement text can be
/// matched by a later rule's `find`. Rules are applied strictly in config order
/// and no conflict detection is performed.
pub struct Redactor {
    config: RedactionConfig,
    conditional: Vec<CompiledConditional>,
    replacements: Vec<LiteralRule>,
    pii_detector: PiiDetector,
}

struct CompiledConditional {
    name: String,
    triggers: Vec<Regex>,
    replacements: Vec<LiteralRule>,
}

struct LiteralRule {
    label: String,
    matcher: Regex,
    replace: String,
}

impl LiteralRule {
    /// `label` names the rule in hits and must not contain the find text
    fn new(label: String, find: &str, replace: &str, case_sensitive: bool) -> Result<Self> {
        Ok(Self {
            label,
            matcher: literal_matcher(find, case_sensitive)?,
            replace: replace.to_string(),
        })
    }

    /// Replace every occurrence in `text`, returning the match count
    fn apply(&self, text: &mut String) -> usize {
        let count = self.matcher.find_iter(text.as_str()).count();
        if count > 0 {
            let replaced = self
                .matcher
                .replace_all(text.as_str(), regex::NoExpand(&self.replace))
                .into_owned();
            *text = replaced;
        }
        count
    }
}

/// Build a matcher for user-supplied text; metacharacters are matched literally
fn literal_matcher(find: &str, case_sensitive: bool) -> Result<Regex> {
    Ok(RegexBuilder::new(&regex::escape(find))
        .case_insensitive(!case_sensitive)
        .build()?)
}

impl CompiledConditional {
    fn compile(rule: &ConditionalRule) -> Result<Self> {
        let triggers = rule
            .trigger
            .contains
            .iter()
            .filter(|term| !term.is_empty())
            .map(|term| literal_matcher(term, rule.trigger.case_sensitive))
            .collect::<Result<Vec<_>>>()?;

        let replacements = rule
            .replacements
            .iter()
            .filter(|r| !r.find.is_empty())
            .enumerate()
            .map(|(i, r)| {
                let case_sensitive = r.case_sensitive.unwrap_or(rule.trigger.case_sensitive);
                let label = format!("{}#{}", rule.name, i + 1);
                LiteralRule::new(label, &r.find, &r.replace, case_sensitive)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: rule.name.clone(),
            triggers,
            replacements,
        })
    }

    fn is_triggered(&self, original: &str) -> bool {
        self.triggers.iter().any(|t| t.is_match(original))
    }
}

impl Redactor {
    /// Compile a config into a redactor
    pub fn new(config: RedactionConfig) -> Result<Self> {
        let conditional = config
            .conditional_rules
            .iter()
            .filter(|rule| rule.enabled)
            .map(CompiledConditional::compile)
            .collect::<Result<Vec<_>>>()?;

        let replacements = config
            .replacements
            .iter()
            .enumerate()
            .map(|(i, r)| {
                LiteralRule::new(replacement_label(i), &r.find, &r.replace, config.case_sensitive)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            pii_detector: PiiDetector::new(config.patterns),
            conditional,
            replacements,
            config,
        })
    }

    /// A redactor for the default (empty) config; only URL stripping applies
    pub fn passthrough() -> Self {
        let config = RedactionConfig::default();
        Self {
            pii_detector: PiiDetector::new(config.patterns),
            conditional: Vec::new(),
            replacements: Vec::new(),
            config,
        }
    }

    /// The config this redactor was built from
    pub fn config(&self) -> &RedactionConfig {
        &self.config
    }

    /// Run every step over `original`
    pub fn redact(&self, original: &str) -> RedactionOutcome {
        let mut hits = Vec::new();

        // Step 1: links
        let (mut text, url_count) = strip_urls(original);
        if url_count > 0 {
            hits.push(RuleHit {
                step: RuleStep::UrlStripping,
                rule: "urls".to_string(),
                count: url_count,
            });
        }

        // Step 2: conditional rules, gated on the original text
        for rule in &self.conditional {
            if !rule.is_triggered(original) {
                continue;
            }
            let count: usize = rule.replacements.iter().map(|r| r.apply(&mut text)).sum();
            if count > 0 {
                hits.push(RuleHit {
                    step: RuleStep::Conditional,
                    rule: rule.name.clone(),
                    count,
                });
            }
        }

        // Step 3: global replacements
        for rule in &self.replacements {
            let count = rule.apply(&mut text);
            if count > 0 {
                hits.push(RuleHit {
                    step: RuleStep::Replacement,
                    rule: rule.label.clone(),
                    count,
                });
            }
        }

        // Step 4: PII detectors
        let (text, pii_hits) = self.pii_detector.redact(&text);
        hits.extend(pii_hits);

        RedactionOutcome {
            redacted: !hits.is_empty(),
            text,
            hits,
        }
    }
}

/// Hit label of the global replacement at `index` in config order
fn replacement_label(index: usize) -> String {
    format!("replacement#{}", index + 1)
}

impl Default for Redactor {
    fn default() -> Self {
        Self::passthrough()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PatternToggles, RuleReplacement};

    fn acme_config() -> RedactionConfig {
        RedactionConfig::default().with_replacement("ACME Corporation", "[REDACTED]")
    }

    fn cronos_rule(case_sensitive: bool) -> ConditionalRule {
        ConditionalRule::new("cronos")
            .with_trigger("Cronos")
            .with_trigger_case_sensitive(case_sensitive)
            .with_replacement("Cronos", "CR")
    }

    #[test]
    fn test_global_replacement() {
        let redactor = Redactor::new(acme_config()).unwrap();
        let outcome = redactor.redact("This document is from ACME Corporation.");
        assert_eq!(outcome.text, "This document is from [REDACTED].");
        assert!(outcome.redacted);
        assert_eq!(outcome.matches_in(RuleStep::Replacement), 1);
    }

    #[test]
    fn test_replacement_hits_are_labelled_by_position() {
        let config = acme_config().with_replacement("Project Nightingale", "[CODENAME]");
        let outcome = Redactor::new(config)
            .unwrap()
            .redact("Project Nightingale is run by ACME Corporation");
        let labels: Vec<&str> = outcome.hits.iter().map(|h| h.rule.as_str()).collect();
        assert_eq!(labels, vec!["replacement#1", "replacement#2"]);
    }

    #[test]
    fn test_case_insensitive_replacement() {
        let redactor = Redactor::new(acme_config()).unwrap();
        for input in ["acme corporation", "ACME CORPORATION", "AcMe CoRpOrAtIoN"] {
            let outcome = redactor.redact(&format!("From {input}."));
            assert_eq!(outcome.text, "From [REDACTED].");
        }
    }

    #[test]
    fn test_case_sensitive_replacement() {
        let redactor = Redactor::new(acme_config().with_case_sensitive(true)).unwrap();
        let outcome = redactor.redact("acme corporation and ACME Corporation");
        assert_eq!(outcome.text, "acme corporation and [REDACTED]");
    }

    #[test]
    fn test_find_text_is_literal() {
        let config = RedactionConfig::default()
            .with_replacement("a.c", "X")
            .with_replacement("(Pty) Ltd", "Y");
        let redactor = Redactor::new(config).unwrap();
        let outcome = redactor.redact("abc a.c Foo (Pty) Ltd");
        assert_eq!(outcome.text, "abc X Foo Y");
    }

    #[test]
    fn test_replacement_text_is_literal() {
        let config = RedactionConfig::default().with_replacement("price", "$1 each");
        let redactor = Redactor::new(config).unwrap();
        assert_eq!(redactor.redact("the price").text, "the $1 each");
    }

    #[test]
    fn test_conditional_rule_triggers_case_insensitive() {
        let config = RedactionConfig::default().with_conditional_rule(cronos_rule(false));
        let redactor = Redactor::new(config).unwrap();
        let outcome = redactor.redact("the cronos project");
        assert_eq!(outcome.text, "the CR project");
        assert_eq!(outcome.matches_in(RuleStep::Conditional), 1);
    }

    #[test]
    fn test_conditional_rule_case_sensitive_trigger_misses() {
        let config = RedactionConfig::default().with_conditional_rule(cronos_rule(true));
        let redactor = Redactor::new(config).unwrap();
        let outcome = redactor.redact("the CRONOS project");
        assert_eq!(outcome.text, "the CRONOS project");
        assert!(!outcome.redacted);
    }

    #[test]
    fn test_conditional_rule_requires_trigger() {
        let rule = ConditionalRule::new("merger")
            .with_trigger("Project Falcon")
            .with_replacement("Globex", "[CLIENT]");
        let config = RedactionConfig::default().with_conditional_rule(rule);
        let redactor = Redactor::new(config).unwrap();

        let untouched = redactor.redact("Globex quarterly numbers");
        assert_eq!(untouched.text, "Globex quarterly numbers");
        assert!(!untouched.redacted);

        let touched = redactor.redact("Project Falcon: Globex quarterly numbers");
        assert_eq!(touched.text, "Project Falcon: [CLIENT] quarterly numbers");
    }

    #[test]
    fn test_trigger_reads_original_text() {
        // The URL holding the trigger term is stripped before rules run,
        // but the trigger still fires because it checks the original text.
        let rule = ConditionalRule::new("portal")
            .with_trigger("portal.initech.com")
            .with_replacement("Initech", "[CLIENT]");
        let config = RedactionConfig::default().with_conditional_rule(rule);
        let redactor = Redactor::new(config).unwrap();
        let outcome = redactor.redact("Initech login at https://portal.initech.com/home");
        assert_eq!(outcome.text, "[CLIENT] login at ");
    }

    #[test]
    fn test_rule_replacement_case_override() {
        let mut rule = cronos_rule(false);
        rule.replacements = vec![RuleReplacement {
            find: "Cronos".to_string(),
            replace: "CR".to_string(),
            case_sensitive: Some(true),
        }];
        let config = RedactionConfig::default().with_conditional_rule(rule);
        let redactor = Redactor::new(config).unwrap();
        let outcome = redactor.redact("cronos and Cronos");
        assert_eq!(outcome.text, "cronos and CR");
    }

    #[test]
    fn test_disabled_rule_skipped() {
        let config =
            RedactionConfig::default().with_conditional_rule(cronos_rule(false).with_enabled(false));
        let redactor = Redactor::new(config).unwrap();
        assert_eq!(redactor.redact("Cronos").text, "Cronos");
    }

    #[test]
    fn test_conditional_rules_apply_in_order() {
        let first = ConditionalRule::new("first")
            .with_trigger("alpha")
            .with_replacement("alpha", "beta");
        let second = ConditionalRule::new("second")
            .with_trigger("alpha")
            .with_replacement("beta", "gamma");
        let config = RedactionConfig::default()
            .with_conditional_rule(first)
            .with_conditional_rule(second);
        let redactor = Redactor::new(config).unwrap();
        assert_eq!(redactor.redact("alpha").text, "gamma");
    }

    #[test]
    fn test_pii_after_replacements() {
        let config = acme_config().with_patterns(PatternToggles {
            ssn: true,
            ..Default::default()
        });
        let redactor = Redactor::new(config).unwrap();
        let outcome = redactor.redact("ACME Corporation SSN 123-45-6789");
        assert_eq!(outcome.text, "[REDACTED] SSN [SSN]");
        assert_eq!(outcome.total_matches(), 2);
    }

    #[test]
    fn test_passthrough_only_strips_urls() {
        let redactor = Redactor::passthrough();
        let outcome = redactor.redact("plain 123-45-6789");
        assert!(!outcome.redacted);
        assert_eq!(outcome.text, "plain 123-45-6789");
    }

    #[test]
    fn test_idempotent_on_own_output() {
        let config = acme_config().with_patterns(PatternToggles::all());
        let redactor = Redactor::new(config).unwrap();
        let first = redactor.redact("ACME Corporation, a@b.io, 123-45-6789, www.acme.com");
        let second = redactor.redact(&first.text);
        assert_eq!(first.text, second.text);
        assert!(!second.redacted);
    }
}
