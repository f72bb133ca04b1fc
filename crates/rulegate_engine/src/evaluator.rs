//! Batch evaluation of a catalog against one index snapshot.
//!
//! Evaluation is lazy: entries are pulled from the catalog only as results are
//! consumed, and dropping the iterator stops the pass without side effects.
//! Each node's decision is independent of every other node's, so a pass may
//! also be split across workers (see [`crate::parallel`]).

use std::fmt;
use std::sync::Arc;

use rulegate_foundation::{CatalogRecord, Error, HierarchyNode, Result, RuleId};
use rulegate_index::RuleIndex;
use tracing::{debug, warn};

use crate::decision::Decision;
use crate::resolver::Resolver;

// =============================================================================
// Catalog Entry
// =============================================================================

/// Anything a catalog feed can deliver.
pub trait CatalogEntry {
    /// Converts the entry into a validated node.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHierarchy` if the entry's ancestry is malformed.
    fn into_node(self) -> Result<HierarchyNode>;
}

impl CatalogEntry for HierarchyNode {
    fn into_node(self) -> Result<HierarchyNode> {
        Ok(self)
    }
}

impl CatalogEntry for &HierarchyNode {
    fn into_node(self) -> Result<HierarchyNode> {
        Ok(self.clone())
    }
}

impl CatalogEntry for CatalogRecord {
    fn into_node(self) -> Result<HierarchyNode> {
        HierarchyNode::from_record(&self)
    }
}

impl CatalogEntry for &CatalogRecord {
    fn into_node(self) -> Result<HierarchyNode> {
        HierarchyNode::from_record(self)
    }
}

impl CatalogEntry for Result<HierarchyNode> {
    fn into_node(self) -> Result<HierarchyNode> {
        self
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// A catalog entry that could not be evaluated.
#[derive(Debug)]
pub struct Rejected {
    /// Zero-based position of the entry in the catalog.
    pub position: usize,
    /// Why it was skipped.
    pub error: Error,
}

/// Result of evaluating one catalog entry.
#[derive(Debug)]
pub enum Outcome {
    /// The entry was decided.
    Decided {
        /// Zero-based position of the entry in the catalog.
        position: usize,
        /// The node.
        node: HierarchyNode,
        /// Its decision.
        decision: Decision,
    },
    /// The entry was malformed and skipped.
    Rejected(Rejected),
}

/// Counters for one evaluation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Entries pulled from the catalog.
    pub evaluated: usize,
    /// Nodes allowed.
    pub allowed: usize,
    /// Nodes blocked.
    pub blocked: usize,
    /// Entries rejected as malformed.
    pub rejected: usize,
}

impl PassStats {
    fn record(&mut self, outcome: &Outcome) {
        self.evaluated += 1;
        match outcome {
            Outcome::Decided { decision, .. } if decision.is_allowed() => self.allowed += 1,
            Outcome::Decided { .. } => self.blocked += 1,
            Outcome::Rejected(_) => self.rejected += 1,
        }
    }
}

impl fmt::Display for PassStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} evaluated, {} allowed, {} blocked, {} rejected",
            self.evaluated, self.allowed, self.blocked, self.rejected
        )
    }
}

// =============================================================================
// Observer
// =============================================================================

/// Hook for watching an evaluation pass. Every method defaults to a no-op.
pub trait EvaluationObserver: Send + Sync {
    /// A pass is starting against an index with `rules` rules.
    fn pass_started(&self, rules: usize) {
        let _ = rules;
    }

    /// A node was decided.
    fn decided(&self, node: &HierarchyNode, decision: &Decision) {
        let _ = (node, decision);
    }

    /// A catalog entry was rejected.
    fn rejected(&self, rejected: &Rejected) {
        let _ = rejected;
    }

    /// The pass ended, either because the catalog was exhausted or because a
    /// fatal error aborted it. `stats` covers the entries evaluated up to then.
    fn pass_finished(&self, stats: &PassStats) {
        let _ = stats;
    }
}

// =============================================================================
// Batch Evaluator
// =============================================================================

/// Evaluates catalogs against a captured index snapshot.
///
/// The snapshot is fixed for the evaluator's lifetime; later index updates are
/// not visible to it.
#[derive(Clone)]
pub struct BatchEvaluator {
    index: Arc<RuleIndex>,
    observer: Option<Arc<dyn EvaluationObserver>>,
}

impl BatchEvaluator {
    /// Creates an evaluator over an index snapshot.
    #[must_use]
    pub fn new(index: Arc<RuleIndex>) -> Self {
        Self {
            index,
            observer: None,
        }
    }

    /// Builder method to attach an observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn EvaluationObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The snapshot being evaluated against.
    #[must_use]
    pub fn index(&self) -> &Arc<RuleIndex> {
        &self.index
    }

    /// Evaluates one entry.
    ///
    /// # Errors
    ///
    /// Returns an error only for fatal conditions (index corruption).
    /// Malformed entries come back as [`Outcome::Rejected`].
    pub fn evaluate_one(&self, position: usize, entry: impl CatalogEntry) -> Result<Outcome> {
        evaluate_entry(&self.index, position, entry)
    }

    /// Starts a lazy pass over `catalog`.
    pub fn evaluate<I>(&self, catalog: I) -> Evaluation<I::IntoIter>
    where
        I: IntoIterator,
        I::Item: CatalogEntry,
    {
        Evaluation::new(self.clone(), catalog.into_iter(), 0)
    }

    /// Resumes a pass that was stopped after `checkpoint` entries.
    ///
    /// `catalog` must deliver the same entries in the same order as the
    /// interrupted pass; the first `checkpoint` are skipped and positions
    /// continue from there.
    pub fn resume<I>(
        &self,
        catalog: I,
        checkpoint: usize,
    ) -> Evaluation<std::iter::Skip<I::IntoIter>>
    where
        I: IntoIterator,
        I::Item: CatalogEntry,
    {
        Evaluation::new(self.clone(), catalog.into_iter().skip(checkpoint), checkpoint)
    }

    /// Lazy view of only the allowed nodes.
    pub fn valid<I>(&self, catalog: I) -> ValidNodes<I::IntoIter>
    where
        I: IntoIterator,
        I::Item: CatalogEntry,
    {
        ValidNodes {
            inner: self.evaluate(catalog),
            rejected: Vec::new(),
        }
    }

    /// Runs a full pass and collects the allowed nodes.
    ///
    /// # Errors
    ///
    /// Returns the fatal error that aborted the pass, if any.
    pub fn valid_catalog<I>(&self, catalog: I) -> Result<ValidCatalog>
    where
        I: IntoIterator,
        I::Item: CatalogEntry,
    {
        let mut view = self.valid(catalog);
        let nodes = view.by_ref().collect::<Result<Vec<_>>>()?;
        Ok(ValidCatalog {
            nodes,
            rejected: view.rejected,
        })
    }

    /// Runs a full pass and records every decision.
    ///
    /// # Errors
    ///
    /// Returns the fatal error that aborted the pass, if any.
    pub fn audit<I>(&self, catalog: I) -> Result<AuditReport>
    where
        I: IntoIterator,
        I::Item: CatalogEntry,
    {
        let mut report = AuditReport::default();
        for outcome in self.evaluate(catalog) {
            report.push(outcome?);
        }
        Ok(report)
    }

    pub(crate) fn notify(&self, f: impl FnOnce(&dyn EvaluationObserver)) {
        if let Some(observer) = &self.observer {
            f(observer.as_ref());
        }
    }
}

pub(crate) fn evaluate_entry(
    index: &RuleIndex,
    position: usize,
    entry: impl CatalogEntry,
) -> Result<Outcome> {
    let node = match entry.into_node() {
        Ok(node) => node,
        Err(error) => {
            return Ok(Outcome::Rejected(Rejected {
                position,
                error: error.at_position(position),
            }));
        }
    };

    match Resolver::resolve(&node, index) {
        Ok(decision) => Ok(Outcome::Decided {
            position,
            node,
            decision,
        }),
        Err(error) if error.is_fatal() => Err(error.at_position(position)),
        Err(error) => Ok(Outcome::Rejected(Rejected {
            position,
            error: error.at_position(position),
        })),
    }
}

// =============================================================================
// Evaluation
// =============================================================================

/// A lazy evaluation pass, yielding one result per catalog entry.
///
/// `Err` items are fatal: after one is yielded the pass ends.
pub struct Evaluation<I> {
    evaluator: BatchEvaluator,
    catalog: I,
    position: usize,
    stats: PassStats,
    started: bool,
    done: bool,
}

impl<I> Evaluation<I> {
    fn new(evaluator: BatchEvaluator, catalog: I, position: usize) -> Self {
        Self {
            evaluator,
            catalog,
            position,
            stats: PassStats::default(),
            started: false,
            done: false,
        }
    }

    /// Number of catalog entries consumed so far, counting any skipped on
    /// resume. Pass it to [`BatchEvaluator::resume`] to continue later.
    #[must_use]
    pub fn checkpoint(&self) -> usize {
        self.position
    }

    /// Counters for the entries evaluated by this pass so far.
    #[must_use]
    pub fn stats(&self) -> PassStats {
        self.stats
    }
}

impl<I> Iterator for Evaluation<I>
where
    I: Iterator,
    I::Item: CatalogEntry,
{
    type Item = Result<Outcome>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            let rules = self.evaluator.index.len();
            debug!(rules, from = self.position, "evaluation pass started");
            self.evaluator.notify(|o| o.pass_started(rules));
        }

        let Some(entry) = self.catalog.next() else {
            self.done = true;
            debug!(stats = %self.stats, "evaluation pass finished");
            let stats = self.stats;
            self.evaluator.notify(|o| o.pass_finished(&stats));
            return None;
        };

        let position = self.position;
        self.position += 1;

        match evaluate_entry(&self.evaluator.index, position, entry) {
            Ok(outcome) => {
                self.stats.record(&outcome);
                match &outcome {
                    Outcome::Decided { node, decision, .. } => {
                        self.evaluator.notify(|o| o.decided(node, decision));
                    }
                    Outcome::Rejected(rejected) => {
                        warn!(position, error = %rejected.error, "catalog entry rejected");
                        self.evaluator.notify(|o| o.rejected(rejected));
                    }
                }
                Some(Ok(outcome))
            }
            Err(error) => {
                self.done = true;
                let stats = self.stats;
                self.evaluator.notify(|o| o.pass_finished(&stats));
                Some(Err(error))
            }
        }
    }
}

// =============================================================================
// Valid View
// =============================================================================

/// Lazy view yielding only allowed nodes.
///
/// Rejected entries are kept aside and available from
/// [`ValidNodes::rejected`]. `Err` items are fatal.
pub struct ValidNodes<I> {
    inner: Evaluation<I>,
    rejected: Vec<Rejected>,
}

impl<I> ValidNodes<I> {
    /// Entries skipped so far because they were malformed.
    #[must_use]
    pub fn rejected(&self) -> &[Rejected] {
        &self.rejected
    }

    /// Number of catalog entries consumed so far.
    #[must_use]
    pub fn checkpoint(&self) -> usize {
        self.inner.checkpoint()
    }
}

impl<I> Iterator for ValidNodes<I>
where
    I: Iterator,
    I::Item: CatalogEntry,
{
    type Item = Result<HierarchyNode>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(Outcome::Decided { node, decision, .. }) if decision.is_allowed() => {
                    return Some(Ok(node));
                }
                Ok(Outcome::Decided { .. }) => {}
                Ok(Outcome::Rejected(rejected)) => self.rejected.push(rejected),
                Err(error) => return Some(Err(error)),
            }
        }
    }
}

/// Allowed nodes from a completed pass.
#[derive(Debug, Default)]
pub struct ValidCatalog {
    /// Allowed nodes, in catalog order.
    pub nodes: Vec<HierarchyNode>,
    /// Entries skipped because they were malformed.
    pub rejected: Vec<Rejected>,
}

// =============================================================================
// Audit Report
// =============================================================================

/// Every decision from a completed pass.
#[derive(Debug, Default)]
pub struct AuditReport {
    /// Decided nodes, in catalog order.
    pub decisions: Vec<(HierarchyNode, Decision)>,
    /// Entries skipped because they were malformed.
    pub rejected: Vec<Rejected>,
    /// Pass counters.
    pub stats: PassStats,
}

impl AuditReport {
    pub(crate) fn push(&mut self, outcome: Outcome) {
        self.stats.record(&outcome);
        match outcome {
            Outcome::Decided { node, decision, .. } => self.decisions.push((node, decision)),
            Outcome::Rejected(rejected) => self.rejected.push(rejected),
        }
    }

    /// Allowed nodes, in catalog order.
    pub fn allowed(&self) -> impl Iterator<Item = &HierarchyNode> {
        self.decisions
            .iter()
            .filter(|(_, d)| d.is_allowed())
            .map(|(n, _)| n)
    }

    /// Blocked nodes with their decisions, in catalog order.
    pub fn blocked(&self) -> impl Iterator<Item = &(HierarchyNode, Decision)> {
        self.decisions.iter().filter(|(_, d)| !d.is_allowed())
    }

    /// Nodes whose decision was made by `rule`.
    pub fn decided_by<'a>(&'a self, rule: &'a RuleId) -> impl Iterator<Item = &'a HierarchyNode> {
        self.decisions
            .iter()
            .filter(move |(_, d)| d.winning_rule() == Some(rule))
            .map(|(n, _)| n)
    }

    /// Decision recorded for `node`, if it was in the pass.
    #[must_use]
    pub fn decision_for(&self, node: &HierarchyNode) -> Option<&Decision> {
        self.decisions
            .iter()
            .find(|(n, _)| n == node)
            .map(|(_, d)| d)
    }
}
