//! Behavioural properties of the redaction engine and normalizer

use proptest::prelude::*;
use scrub_guard::{
    is_normalized, normalize, ConditionalRule, LineEnding, PatternToggles, RedactionConfig,
    Redactor, RuleStep,
};

fn recase(text: &str, mask: &[bool]) -> String {
    text.chars()
        .zip(mask.iter().cycle())
        .map(|(c, upper)| {
            if *upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            }
        })
        .collect()
}

proptest! {
    #[test]
    fn case_insensitive_match_ignores_input_casing(mask in prop::collection::vec(any::<bool>(), 1..16)) {
        let config = RedactionConfig::default().with_replacement("ACME Corporation", "[REDACTED]");
        let redactor = Redactor::new(config).unwrap();

        let input = format!("This document is from {}.", recase("ACME Corporation", &mask));
        let outcome = redactor.redact(&input);

        prop_assert_eq!(outcome.text, "This document is from [REDACTED].");
        prop_assert!(outcome.redacted);
    }

    #[test]
    fn redacted_unicode_normalizes_to_ascii(input in any::<String>()) {
        let config = RedactionConfig::default().with_patterns(PatternToggles::all());
        let redactor = Redactor::new(config).unwrap();

        let outcome = redactor.redact(&input);
        let out = normalize(&outcome.text, LineEnding::Crlf);
        prop_assert!(out.is_ascii());
        prop_assert!(is_normalized(&out, LineEnding::Crlf));
    }

    #[test]
    fn rule_never_fires_without_trigger(body in "[a-z ]{0,40}") {
        let rule = ConditionalRule::new("client")
            .with_trigger("Zyxwv")
            .with_trigger_case_sensitive(true)
            .with_replacement("client", "[C]");
        let config = RedactionConfig::default().with_conditional_rule(rule);
        let redactor = Redactor::new(config).unwrap();

        let input = format!("client {body}");
        let outcome = redactor.redact(&input);
        prop_assert_eq!(outcome.matches_in(RuleStep::Conditional), 0);
        prop_assert_eq!(outcome.text, input);
    }
}

#[test]
fn scenario_acme_replacement() {
    let config = RedactionConfig::from_json(
        r#"{"replacements":[{"find":"ACME Corporation","replace":"[REDACTED]"}],"case_sensitive":false}"#,
    )
    .unwrap();
    let redactor = Redactor::new(config).unwrap();
    let outcome = redactor.redact("This document is from ACME Corporation.");
    assert_eq!(
        normalize(&outcome.text, LineEnding::Lf),
        "This document is from [REDACTED]."
    );
    assert!(outcome.redacted);
}

#[test]
fn scenario_ssn_pattern() {
    let config = RedactionConfig::from_json(r#"{"patterns":{"ssn":true}}"#).unwrap();
    let redactor = Redactor::new(config).unwrap();
    let outcome = redactor.redact("Employee SSN: 123-45-6789\nStart date: 2021");
    assert!(outcome.text.contains("[SSN]"));
    assert!(!outcome.text.contains("123-45-6789"));
}

#[test]
fn scenario_cronos_trigger_casing() {
    let lenient = RedactionConfig::from_json(
        r#"{"conditional_rules":[{"name":"cronos","enabled":true,
            "trigger":{"contains":["Cronos"],"case_sensitive":false},
            "replacements":[{"find":"Cronos","replace":"CR"}]}]}"#,
    )
    .unwrap();
    let outcome = Redactor::new(lenient).unwrap().redact("notes on cronos");
    assert_eq!(outcome.text, "notes on CR");

    let strict = RedactionConfig::from_json(
        r#"{"conditional_rules":[{"name":"cronos","enabled":true,
            "trigger":{"contains":["Cronos"],"case_sensitive":true},
            "replacements":[{"find":"Cronos","replace":"CR"}]}]}"#,
    )
    .unwrap();
    let outcome = Redactor::new(strict).unwrap().redact("notes on CRONOS");
    assert_eq!(outcome.text, "notes on CRONOS");
    assert!(!outcome.redacted);
}
