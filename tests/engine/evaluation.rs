//! Integration tests for batch evaluation
//!
//! Tests streaming passes, partial failure, checkpoints, and parallel runs.

use std::sync::Arc;

use rulegate_engine::{BatchEvaluator, Outcome, ParallelConfig};
use rulegate_foundation::{CatalogRecord, HierarchyNode, IndexKey, RuleId};
use rulegate_index::{IndexConfig, Rule, RuleIndex};

fn evaluator() -> BatchEvaluator {
    let index = RuleIndex::build(
        vec![
            Rule::block("no-1", IndexKey::sport("1")),
            Rule::allow("exc", IndexKey::event("10")).under(IndexKey::sport("1")),
        ],
        IndexConfig::allow_by_default(),
    )
    .unwrap();
    BatchEvaluator::new(Arc::new(index))
}

fn catalog() -> Vec<CatalogRecord> {
    vec![
        CatalogRecord::new("1", "5", "10", "100"),
        CatalogRecord::new("1", "5", "11", "101"),
        CatalogRecord::new("1", "", "12", "102"),
        CatalogRecord::new("2", "6", "13", "103"),
    ]
}

fn market_ids(nodes: &[HierarchyNode]) -> Vec<&str> {
    nodes.iter().map(|n| n.id().as_str()).collect()
}

// =============================================================================
// Streaming
// =============================================================================

#[test]
fn pass_yields_one_outcome_per_entry() {
    let outcomes: Vec<Outcome> = evaluator()
        .evaluate(catalog())
        .collect::<rulegate_foundation::Result<_>>()
        .unwrap();

    assert_eq!(outcomes.len(), 4);
    assert!(matches!(outcomes[2], Outcome::Rejected(ref r) if r.position == 2));
}

#[test]
fn valid_view_skips_blocked_and_malformed() {
    let evaluator = evaluator();
    let mut view = evaluator.valid(catalog());
    let nodes: Vec<HierarchyNode> = view.by_ref().map(Result::unwrap).collect();

    assert_eq!(market_ids(&nodes), vec!["100", "103"]);
    assert_eq!(view.rejected().len(), 1);
    assert_eq!(view.checkpoint(), 4);
}

#[test]
fn valid_catalog_collects_everything() {
    let valid = evaluator().valid_catalog(catalog()).unwrap();
    assert_eq!(market_ids(&valid.nodes), vec!["100", "103"]);
    assert_eq!(valid.rejected[0].position, 2);
}

#[test]
fn prebuilt_nodes_are_accepted() {
    let nodes: Vec<HierarchyNode> = catalog()
        .iter()
        .filter_map(|r| HierarchyNode::from_record(r).ok())
        .collect();
    let valid = evaluator().valid_catalog(&nodes).unwrap();
    assert_eq!(valid.nodes.len(), 2);
    assert!(valid.rejected.is_empty());
}

// =============================================================================
// Checkpoints
// =============================================================================

#[test]
fn resume_continues_where_a_pass_stopped() {
    let evaluator = evaluator();
    let mut pass = evaluator.evaluate(catalog());
    pass.next().unwrap().unwrap();
    pass.next().unwrap().unwrap();
    let checkpoint = pass.checkpoint();
    assert_eq!(checkpoint, 2);
    assert_eq!(pass.stats().evaluated, 2);

    let rest: Vec<Outcome> = evaluator
        .resume(catalog(), checkpoint)
        .map(Result::unwrap)
        .collect();
    assert_eq!(rest.len(), 2);
    assert!(matches!(rest[0], Outcome::Rejected(ref r) if r.position == 2));
    assert!(matches!(rest[1], Outcome::Decided { position: 3, .. }));
}

// =============================================================================
// Fatal Errors
// =============================================================================

#[test]
fn corruption_ends_the_pass() {
    let mut index = RuleIndex::new(IndexConfig::allow_by_default());
    index.force_into_bucket(IndexKey::sport("2"), Rule::block("stray", IndexKey::sport("9")));
    let evaluator = BatchEvaluator::new(Arc::new(index));

    let results: Vec<_> = evaluator.evaluate(catalog()).collect();
    // Entries 0 and 1 never touch sport:2, entry 2 is malformed, entry 3 hits the bad bucket.
    assert_eq!(results.len(), 4);
    assert!(results[..3].iter().all(Result::is_ok));
    assert!(results[3].as_ref().unwrap_err().is_fatal());
    assert!(evaluator.audit(catalog()).is_err());
}

// =============================================================================
// Audits
// =============================================================================

#[test]
fn audit_records_every_decision() {
    let report = evaluator().audit(catalog()).unwrap();

    assert_eq!(report.stats.evaluated, 4);
    assert_eq!(report.stats.allowed, 2);
    assert_eq!(report.stats.blocked, 1);
    assert_eq!(report.stats.rejected, 1);
    assert_eq!(report.allowed().count(), 2);
    assert_eq!(report.blocked().count(), 1);

    let no_1 = RuleId::from("no-1");
    let blocked: Vec<_> = report.decided_by(&no_1).map(|n| n.id().as_str()).collect();
    assert_eq!(blocked, vec!["101"]);

    let node = HierarchyNode::from_record(&catalog()[3]).unwrap();
    assert!(report.decision_for(&node).unwrap().is_default());
}

#[test]
fn parallel_audit_matches_sequential() {
    let records: Vec<CatalogRecord> = (0..5_000_u64)
        .map(|m| CatalogRecord::new(m % 3, m % 17, m % 40, m))
        .collect();
    let evaluator = evaluator();

    let sequential = evaluator.audit(records.iter()).unwrap();
    let parallel = evaluator
        .evaluate_parallel(records.iter().collect(), &ParallelConfig::new().with_min_chunk(64))
        .unwrap();

    assert_eq!(parallel.stats, sequential.stats);
    assert_eq!(parallel.decisions, sequential.decisions);
}
