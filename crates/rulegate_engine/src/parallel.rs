//! Parallel evaluation and shard assignment.
//!
//! Decisions share nothing but the read-only index snapshot, so a catalog can
//! be partitioned any way the caller likes. [`shard_of`] keeps all markets of
//! a sport on the same shard, which keeps each shard's working set of sport
//! and competition buckets small.

use std::hash::Hasher;

use fxhash::FxHasher64;
use rayon::prelude::*;
use rulegate_foundation::{Error, ErrorKind, HierarchyNode, Result};
use tracing::{debug, warn};

use crate::evaluator::{AuditReport, BatchEvaluator, CatalogEntry, Outcome, evaluate_entry};

/// Configuration for [`BatchEvaluator::evaluate_parallel`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParallelConfig {
    /// Worker threads. `None` uses rayon's global pool.
    pub workers: Option<usize>,
    /// Minimum entries handed to a worker at a time.
    pub min_chunk: usize,
}

impl ParallelConfig {
    /// Creates a configuration using the global pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to use a dedicated pool of `workers` threads.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers.max(1));
        self
    }

    /// Builder method to set the minimum chunk size.
    #[must_use]
    pub fn with_min_chunk(mut self, min_chunk: usize) -> Self {
        self.min_chunk = min_chunk;
        self
    }
}

/// Shard in `0..shards` that `node` belongs to, by sport.
///
/// Stable across builds for a given sport id and shard count: the id bytes
/// go through a fixed 64-bit FxHash. `shards == 0` is treated as 1.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn shard_of(node: &HierarchyNode, shards: usize) -> usize {
    let shards = shards.max(1);
    let mut hasher = FxHasher64::default();
    hasher.write(node.sport().as_str().as_bytes());
    (hasher.finish() % shards as u64) as usize
}

/// Splits nodes into `shards` groups by [`shard_of`], keeping input order
/// within each group.
#[must_use]
pub fn partition(
    nodes: impl IntoIterator<Item = HierarchyNode>,
    shards: usize,
) -> Vec<Vec<HierarchyNode>> {
    let mut groups = vec![Vec::new(); shards.max(1)];
    for node in nodes {
        let shard = shard_of(&node, shards);
        groups[shard].push(node);
    }
    groups
}

impl BatchEvaluator {
    /// Evaluates a materialized catalog across worker threads.
    ///
    /// The report lists decisions in catalog order regardless of which worker
    /// produced them. Observers are notified from the calling thread once all
    /// workers are done, in catalog order, so they see the same events as for
    /// a sequential pass.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error (index corruption), or `Internal` if a
    /// dedicated pool cannot be started.
    pub fn evaluate_parallel<T>(
        &self,
        catalog: Vec<T>,
        config: &ParallelConfig,
    ) -> Result<AuditReport>
    where
        T: CatalogEntry + Send,
    {
        let index = self.index();
        let min_chunk = config.min_chunk.max(1);
        let run = || {
            catalog
                .into_par_iter()
                .with_min_len(min_chunk)
                .enumerate()
                .map(|(position, entry)| evaluate_entry(index, position, entry))
                .collect::<Vec<_>>()
        };

        let outcomes = match config.workers {
            Some(workers) => rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|e| Error::new(ErrorKind::Internal(format!("worker pool: {e}"))))?
                .install(run),
            None => run(),
        };

        let rules = index.len();
        debug!(rules, "parallel evaluation pass started");
        self.notify(|o| o.pass_started(rules));

        let mut report = AuditReport::default();
        for outcome in outcomes {
            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(error) => {
                    let stats = report.stats;
                    self.notify(|o| o.pass_finished(&stats));
                    return Err(error);
                }
            };
            match &outcome {
                Outcome::Decided { node, decision, .. } => {
                    self.notify(|o| o.decided(node, decision));
                }
                Outcome::Rejected(rejected) => {
                    warn!(
                        position = rejected.position,
                        error = %rejected.error,
                        "catalog entry rejected"
                    );
                    self.notify(|o| o.rejected(rejected));
                }
            }
            report.push(outcome);
        }

        let stats = report.stats;
        debug!(%stats, "parallel evaluation pass finished");
        self.notify(|o| o.pass_finished(&stats));
        Ok(report)
    }
}
