//! Integration tests for single-node resolution
//!
//! Each test pins one rule of the precedence order: finer level beats
//! coarser, qualified beats unqualified at the same level, and later
//! insertion beats earlier among equals.

use proptest::prelude::*;
use rulegate_engine::{DecisionSource, Resolver};
use rulegate_foundation::{CatalogRecord, HierarchyNode, IndexKey, Verdict};
use rulegate_index::{IndexConfig, Rule, RuleIndex};

fn market(sport: &str, competition: &str, event: &str, id: &str) -> HierarchyNode {
    HierarchyNode::from_record(&CatalogRecord::new(sport, competition, event, id)).unwrap()
}

fn verdict(rules: Vec<Rule>, node: &HierarchyNode) -> Verdict {
    let index = RuleIndex::build(rules, IndexConfig::allow_by_default()).unwrap();
    Resolver::resolve(node, &index).unwrap().verdict
}

// =============================================================================
// Defaults
// =============================================================================

#[test]
fn no_rules_uses_configured_default() {
    let node = market("1", "2", "3", "4");
    for default in [Verdict::Allowed, Verdict::Blocked] {
        let index = RuleIndex::new(IndexConfig::new(default));
        let decision = Resolver::resolve(&node, &index).unwrap();
        assert_eq!(decision.verdict, default);
        assert_eq!(decision.source, DecisionSource::Default);
    }
}

#[test]
fn rules_on_other_branches_are_ignored() {
    let rules = vec![
        Rule::block("s2", IndexKey::sport("2")),
        Rule::block("m5", IndexKey::market("5")),
    ];
    assert_eq!(verdict(rules, &market("1", "2", "3", "4")), Verdict::Allowed);
}

// =============================================================================
// Specificity
// =============================================================================

#[test]
fn finer_level_wins_regardless_of_order() {
    let node = market("1", "2", "3", "4");
    let coarse = Rule::block("sport", IndexKey::sport("1"));
    let fine = Rule::allow("market", IndexKey::market("4"));

    assert_eq!(verdict(vec![coarse.clone(), fine.clone()], &node), Verdict::Allowed);
    assert_eq!(verdict(vec![fine, coarse], &node), Verdict::Allowed);
}

#[test]
fn every_level_overrides_the_one_above() {
    let node = market("1", "2", "3", "4");
    let rules = vec![
        Rule::block("s", IndexKey::sport("1")),
        Rule::allow("c", IndexKey::competition("2")),
        Rule::block("e", IndexKey::event("3")),
    ];
    let index = RuleIndex::build(rules, IndexConfig::allow_by_default()).unwrap();
    let decision = Resolver::resolve(&node, &index).unwrap();
    assert_eq!(decision.verdict, Verdict::Blocked);
    assert_eq!(decision.winning_rule().map(|id| id.as_str()), Some("e"));
}

// =============================================================================
// Qualifiers
// =============================================================================

#[test]
fn qualified_beats_unqualified_in_either_order() {
    let node = market("1", "2", "3", "4");
    let plain = Rule::block("plain", IndexKey::event("3"));
    let qualified = Rule::allow("qualified", IndexKey::event("3")).under(IndexKey::sport("1"));

    assert_eq!(verdict(vec![plain.clone(), qualified.clone()], &node), Verdict::Allowed);
    assert_eq!(verdict(vec![qualified, plain], &node), Verdict::Allowed);
}

#[test]
fn unsatisfied_qualifier_does_not_apply() {
    let node = market("7", "2", "3", "4");
    let rules = vec![
        Rule::block("sport-7", IndexKey::sport("7")),
        Rule::allow("only-under-1", IndexKey::event("3")).under(IndexKey::sport("1")),
    ];
    assert_eq!(verdict(rules, &node), Verdict::Blocked);
}

// =============================================================================
// Tie-Breaking
// =============================================================================

#[test]
fn later_insertion_wins_among_equals() {
    let node = market("1", "2", "3", "4");
    let block = Rule::block("b", IndexKey::competition("2"));
    let allow = Rule::allow("a", IndexKey::competition("2"));

    assert_eq!(verdict(vec![block.clone(), allow.clone()], &node), Verdict::Allowed);
    assert_eq!(verdict(vec![allow, block], &node), Verdict::Blocked);
}

#[test]
fn later_insertion_wins_among_qualified_equals() {
    let node = market("1", "2", "3", "4");
    let first = Rule::block("first", IndexKey::market("4")).under(IndexKey::sport("1"));
    let second = Rule::allow("second", IndexKey::market("4")).under(IndexKey::event("3"));

    assert_eq!(verdict(vec![first, second], &node), Verdict::Allowed);
}

// =============================================================================
// Candidates and Records
// =============================================================================

#[test]
fn candidates_list_applicable_rules_by_precedence() {
    let node = market("1", "2", "3", "4");
    let index = RuleIndex::build(
        vec![
            Rule::block("s", IndexKey::sport("1")),
            Rule::allow("e-other", IndexKey::event("3")).under(IndexKey::sport("9")),
            Rule::allow("e", IndexKey::event("3")),
        ],
        IndexConfig::allow_by_default(),
    )
    .unwrap();

    let candidates = Resolver::candidates(&node, &index).unwrap();
    let order: Vec<(&str, bool)> = candidates
        .iter()
        .map(|c| (c.entry.rule().id().as_str(), c.applies))
        .collect();
    assert_eq!(order, vec![("e", true), ("s", true), ("e-other", false)]);
}

#[test]
fn resolve_record_rejects_incomplete_records() {
    let index = RuleIndex::new(IndexConfig::allow_by_default());
    let err = Resolver::resolve_record(&CatalogRecord::new("1", "", "3", "4"), &index).unwrap_err();
    assert!(!err.is_fatal());
}

#[test]
fn misplaced_rule_is_reported_as_corruption() {
    let node = market("1", "2", "3", "4");
    let mut index = RuleIndex::new(IndexConfig::allow_by_default());
    index.force_into_bucket(IndexKey::event("3"), Rule::allow("stray", IndexKey::market("9")));

    let err = Resolver::resolve(&node, &index).unwrap_err();
    assert!(err.is_fatal());
}

// =============================================================================
// Property Tests
// =============================================================================

fn arb_rule() -> impl Strategy<Value = Rule> {
    (0..4_usize, 0..3_u8, any::<bool>(), prop::option::of(0..3_u8), 0..1000_u32).prop_map(
        |(depth, id, allow, qualifier, n)| {
            let level = rulegate_foundation::HierarchyLevel::from_depth(depth).unwrap();
            let target = IndexKey::new(level, id.to_string());
            let mut rule = if allow {
                Rule::allow(format!("r{n}"), target)
            } else {
                Rule::block(format!("r{n}"), target)
            };
            if let (Some(q), Some(parent)) = (qualifier, level.parent()) {
                rule = rule.under(IndexKey::new(parent, q.to_string()));
            }
            rule
        },
    )
}

fn arb_market() -> impl Strategy<Value = HierarchyNode> {
    (0..3_u64, 0..3_u64, 0..3_u64, 0..3_u64).prop_map(|(sport, competition, event, id)| {
        HierarchyNode::from_record(&CatalogRecord::new(sport, competition, event, id)).unwrap()
    })
}

proptest! {
    #[test]
    fn resolution_is_deterministic(
        rules in prop::collection::vec(arb_rule(), 0..40),
        node in arb_market(),
    ) {
        let a = RuleIndex::build(rules.clone(), IndexConfig::allow_by_default()).unwrap();
        let b = RuleIndex::build(rules, IndexConfig::allow_by_default()).unwrap();
        prop_assert_eq!(
            Resolver::resolve(&node, &a).unwrap(),
            Resolver::resolve(&node, &b).unwrap()
        );
    }

    #[test]
    fn winner_outranks_every_applicable_rule(
        rules in prop::collection::vec(arb_rule(), 1..40),
        node in arb_market(),
    ) {
        let index = RuleIndex::build(rules, IndexConfig::allow_by_default()).unwrap();
        let decision = Resolver::resolve(&node, &index).unwrap();

        let applicable: Vec<_> = index
            .rules()
            .into_iter()
            .filter(|e| e.rule().applies_to(&node))
            .collect();
        match decision.source {
            DecisionSource::Default => prop_assert!(applicable.is_empty()),
            DecisionSource::Rule { seq, .. } => {
                let winner = applicable.iter().find(|e| e.seq() == seq).unwrap();
                for other in &applicable {
                    let beats = (winner.rule().level(), winner.rule().is_qualified(), winner.seq())
                        >= (other.rule().level(), other.rule().is_qualified(), other.seq());
                    prop_assert!(beats);
                }
            }
        }
    }
}
