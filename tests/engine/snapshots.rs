//! Integration tests for copy-on-write snapshots
//!
//! A pass keeps the snapshot it started with; updates only reach later passes.

use std::sync::Arc;
use std::thread;

use rulegate_engine::{IndexHandle, Resolver};
use rulegate_foundation::{CatalogRecord, IndexKey, Verdict};
use rulegate_index::{IndexConfig, Rule, RuleIndex};

fn catalog(size: u64) -> Vec<CatalogRecord> {
    (0..size).map(|m| CatalogRecord::new("1", "2", "3", m)).collect()
}

#[test]
fn running_pass_ignores_updates() {
    let handle = IndexHandle::new(RuleIndex::new(IndexConfig::allow_by_default()));
    let evaluator = handle.evaluator();
    let mut pass = evaluator.valid(catalog(10));

    assert!(pass.next().is_some());
    handle
        .update(|index| index.insert(Rule::block("stop", IndexKey::sport("1"))))
        .unwrap();

    assert_eq!(pass.count(), 9);
    assert_eq!(handle.evaluator().valid_catalog(catalog(10)).unwrap().nodes.len(), 0);
}

#[test]
fn versions_increase_with_each_publish() {
    let handle = IndexHandle::new(RuleIndex::new(IndexConfig::allow_by_default()));
    assert_eq!(handle.snapshot().version(), 0);

    handle.publish(RuleIndex::new(IndexConfig::block_by_default()));
    handle
        .update(|index| index.insert(Rule::allow("a", IndexKey::sport("1"))))
        .unwrap();

    let snapshot = handle.snapshot();
    assert_eq!(snapshot.version(), 2);
    assert_eq!(snapshot.default_verdict(), Verdict::Blocked);
    assert_eq!(snapshot.len(), 1);
}

#[test]
fn readers_and_writer_run_concurrently() {
    let handle = Arc::new(IndexHandle::new(RuleIndex::new(IndexConfig::allow_by_default())));
    let record = CatalogRecord::new("1", "2", "3", "4");
    let node = rulegate_foundation::HierarchyNode::from_record(&record).unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let handle = Arc::clone(&handle);
            let node = node.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    let snapshot = handle.snapshot();
                    // A snapshot's verdict never changes while it is held.
                    let first = Resolver::resolve(&node, &snapshot).unwrap();
                    let second = Resolver::resolve(&node, &snapshot).unwrap();
                    assert_eq!(first, second);
                }
            })
        })
        .collect();

    for i in 0..50 {
        let rule = if i % 2 == 0 {
            Rule::block(format!("r{i}"), IndexKey::sport("1"))
        } else {
            Rule::allow(format!("r{i}"), IndexKey::sport("1"))
        };
        handle.update(|index| index.insert(rule)).unwrap();
    }
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(handle.snapshot().len(), 50);
    assert_eq!(
        Resolver::resolve(&node, &handle.snapshot()).unwrap().verdict,
        Verdict::Allowed
    );
}
