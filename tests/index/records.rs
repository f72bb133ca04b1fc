//! Integration tests for raw rule records

use rulegate_foundation::{Effect, ErrorKind, IndexKey};
use rulegate_index::{Rule, RuleRecord};

#[test]
fn record_converts_to_rule() {
    let record = RuleRecord::new("exc", "ALLOW", "EVENT", "531321").under("SPORT", "1");
    let rule = Rule::try_from(&record).unwrap();

    assert_eq!(rule, Rule::allow("exc", IndexKey::event("531321")).under(IndexKey::sport("1")));
    assert_eq!(rule.effect(), Effect::Allow);
}

#[test]
fn unknown_effect_is_malformed() {
    let err = RuleRecord::new("r", "DENY", "SPORT", "1").to_rule().unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::MalformedRule { rule: Some(ref id), .. } if id.as_str() == "r"
    ));
}

#[test]
fn unknown_levels_are_malformed() {
    let err = RuleRecord::new("r", "BLOCK", "LEAGUE", "1").to_rule().unwrap_err();
    assert!(err.to_string().contains("target"));

    let err = RuleRecord::new("r", "BLOCK", "EVENT", "1")
        .under("REGION", "eu")
        .to_rule()
        .unwrap_err();
    assert!(err.to_string().contains("qualifier"));
}

#[test]
fn record_without_id_reports_no_rule() {
    let err = RuleRecord::new("", "BLOCK", "SPORT", "1").to_rule().unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MalformedRule { rule: None, .. }));
}
