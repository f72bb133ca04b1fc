//! Tracing and explanation across the engine

use std::sync::Arc;

use rulegate::debug::{CandidateOutcome, DecisionExplanation, TraceEvent, Tracer, TracerConfig};
use rulegate::engine::{
    BatchEvaluator, EvaluationObserver, IndexHandle, Jurisdictions, ParallelConfig,
};
use rulegate::foundation::{CatalogRecord, IndexKey};
use rulegate::index::{IndexConfig, Rule, RuleIndex, RuleRecord};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn tracer_observes_jurisdiction_passes() {
    init_logging();
    let tracer = Arc::new(Tracer::new(TracerConfig::new().enabled()));
    let registry =
        Jurisdictions::new().with_observer(Arc::clone(&tracer) as Arc<dyn EvaluationObserver>);
    registry.load(
        "NJ",
        vec![RuleRecord::new("no-sport-1", "BLOCK", "SPORT", "1")],
        IndexConfig::allow_by_default(),
    );

    registry
        .valid_markets(
            "NJ",
            vec![
                CatalogRecord::new("1", "2", "3", "4"),
                CatalogRecord::new("", "2", "3", "5"),
            ],
        )
        .unwrap();

    let stats = tracer.stats();
    assert_eq!(stats.event_counts.get("node-decided"), Some(&1));
    assert_eq!(stats.event_counts.get("entry-rejected"), Some(&1));
    let last = tracer.recent(1).pop().unwrap();
    assert!(matches!(last.event, TraceEvent::PassFinished { stats } if stats.evaluated == 2));
}

#[test]
fn parallel_pass_traces_like_sequential() {
    init_logging();
    let index = Arc::new(
        RuleIndex::build(
            vec![Rule::block("no-sport-1", IndexKey::sport("1"))],
            IndexConfig::allow_by_default(),
        )
        .unwrap(),
    );
    let catalog = || {
        vec![
            CatalogRecord::new("1", "2", "3", "4"),
            CatalogRecord::new("", "2", "3", "5"),
            CatalogRecord::new("6", "2", "3", "7"),
        ]
    };
    let traced = |run: &dyn Fn(&BatchEvaluator)| {
        let tracer = Arc::new(Tracer::new(TracerConfig::new().enabled()));
        run(&BatchEvaluator::new(Arc::clone(&index)).with_observer(tracer.clone()));
        tracer
            .records()
            .into_iter()
            .map(|r| (r.pass, r.event))
            .collect::<Vec<_>>()
    };

    let sequential = traced(&|evaluator| {
        evaluator.audit(catalog()).unwrap();
    });
    let parallel = traced(&|evaluator| {
        evaluator
            .evaluate_parallel(catalog(), &ParallelConfig::new().with_workers(2))
            .unwrap();
    });

    assert_eq!(sequential.len(), 5);
    assert_eq!(parallel, sequential);
}

#[test]
fn explanation_follows_snapshot_updates() {
    init_logging();
    let handle = IndexHandle::new(
        RuleIndex::build(
            vec![Rule::block("no-sport-1", IndexKey::sport("1"))],
            IndexConfig::allow_by_default(),
        )
        .unwrap(),
    );
    let record = CatalogRecord::new("1", "2", "531321", "4001");
    let before = handle.snapshot();

    handle
        .update(|index| {
            index.insert(Rule::allow("exc", IndexKey::event("531321")).under(IndexKey::sport("1")))
        })
        .unwrap();

    let old = DecisionExplanation::explain_record(&record, &before).unwrap();
    let new = DecisionExplanation::explain_record(&record, &handle.snapshot()).unwrap();

    assert!(!old.decision.is_allowed());
    assert!(new.decision.is_allowed());
    assert_eq!(new.candidates[1].outcome, CandidateOutcome::CoarserLevel);
    assert!(new.to_string().contains("lost: a finer-level rule applies"));
}
