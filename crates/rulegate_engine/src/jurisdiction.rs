//! Per-jurisdiction rulesets.
//!
//! Each jurisdiction (a state) owns an [`IndexHandle`] with its own rules and
//! default verdict. The same catalog can be evaluated against any of them.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rulegate_foundation::{Error, HierarchyNode, Result};
use rulegate_index::{IndexConfig, LoadReport, RuleIndex, RuleRecord};
use tracing::info;

use crate::decision::Decision;
use crate::evaluator::{AuditReport, BatchEvaluator, CatalogEntry, EvaluationObserver, ValidCatalog};
use crate::resolver::Resolver;
use crate::snapshot::IndexHandle;

/// Registry of jurisdictions and their rule indexes.
#[derive(Default)]
pub struct Jurisdictions {
    handles: RwLock<BTreeMap<String, Arc<IndexHandle>>>,
    observer: Option<Arc<dyn EvaluationObserver>>,
}

impl Jurisdictions {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to attach an observer to every evaluator handed out.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn EvaluationObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Registers `index` under `state`.
    ///
    /// An existing jurisdiction keeps its handle and gets `index` published as
    /// a new snapshot, so passes already running are unaffected.
    pub fn register(&self, state: impl Into<String>, index: RuleIndex) -> Arc<IndexHandle> {
        let state = state.into();
        let mut handles = self.handles.write();
        if let Some(handle) = handles.get(&state) {
            handle.publish(index);
            return Arc::clone(handle);
        }
        info!(%state, rules = index.len(), "jurisdiction registered");
        let handle = Arc::new(IndexHandle::new(index));
        handles.insert(state, Arc::clone(&handle));
        handle
    }

    /// Loads rule records for `state`, registering whatever was admitted.
    ///
    /// The report's index is the one that was registered.
    pub fn load(
        &self,
        state: impl Into<String>,
        records: impl IntoIterator<Item = RuleRecord>,
        config: IndexConfig,
    ) -> LoadReport {
        let report = RuleIndex::load(records, config);
        self.register(state, report.index.clone());
        report
    }

    /// Removes `state` from the registry.
    ///
    /// # Errors
    ///
    /// Returns `UnknownJurisdiction` if `state` is not registered.
    pub fn remove(&self, state: &str) -> Result<Arc<IndexHandle>> {
        self.handles
            .write()
            .remove(state)
            .ok_or_else(|| Error::unknown_jurisdiction(state))
    }

    /// Handle for `state`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownJurisdiction` if `state` is not registered.
    pub fn handle(&self, state: &str) -> Result<Arc<IndexHandle>> {
        self.handles
            .read()
            .get(state)
            .cloned()
            .ok_or_else(|| Error::unknown_jurisdiction(state))
    }

    /// Registered jurisdiction names, sorted.
    #[must_use]
    pub fn states(&self) -> Vec<String> {
        self.handles.read().keys().cloned().collect()
    }

    /// Returns true if `state` is registered.
    #[must_use]
    pub fn contains(&self, state: &str) -> bool {
        self.handles.read().contains_key(state)
    }

    /// An evaluator bound to the current snapshot of `state`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownJurisdiction` if `state` is not registered.
    pub fn evaluator(&self, state: &str) -> Result<BatchEvaluator> {
        let evaluator = self.handle(state)?.evaluator();
        Ok(match &self.observer {
            Some(observer) => evaluator.with_observer(Arc::clone(observer)),
            None => evaluator,
        })
    }

    /// Decision for one node under `state`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownJurisdiction`, or `IndexCorruption` from the resolver.
    pub fn resolve(&self, state: &str, node: &HierarchyNode) -> Result<Decision> {
        let snapshot = self.handle(state)?.snapshot();
        Resolver::resolve(node, &snapshot)
    }

    /// Allowed markets of `catalog` under `state`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownJurisdiction`, or the fatal error that aborted the pass.
    pub fn valid_markets<I>(&self, state: &str, catalog: I) -> Result<ValidCatalog>
    where
        I: IntoIterator,
        I::Item: CatalogEntry,
    {
        self.evaluator(state)?.valid_catalog(catalog)
    }

    /// Every decision for `catalog` under `state`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownJurisdiction`, or the fatal error that aborted the pass.
    pub fn audit<I>(&self, state: &str, catalog: I) -> Result<AuditReport>
    where
        I: IntoIterator,
        I::Item: CatalogEntry,
    {
        self.evaluator(state)?.audit(catalog)
    }
}

impl std::fmt::Debug for Jurisdictions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Jurisdictions")
            .field("states", &self.states())
            .field("observed", &self.observer.is_some())
            .finish()
    }
}
