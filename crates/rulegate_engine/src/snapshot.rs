//! Copy-on-write index snapshots.
//!
//! Readers take the current snapshot (an `Arc` clone) and keep it for as long
//! as they like. Writers clone the index, which is O(1) thanks to structural
//! sharing, apply their changes, and publish the result. The lock only guards
//! the pointer swap; no lock is held while resolving nodes.

use std::ops::Deref;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rulegate_foundation::Result;
use rulegate_index::RuleIndex;
use tracing::info;

use crate::evaluator::BatchEvaluator;

/// A published version of the index.
#[derive(Clone, Debug)]
pub struct Snapshot {
    version: u64,
    index: Arc<RuleIndex>,
}

impl Snapshot {
    /// Version number, starting at 0 and increasing with every publish.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Shared handle to the index.
    #[must_use]
    pub fn index(&self) -> &Arc<RuleIndex> {
        &self.index
    }

    /// An evaluator bound to this snapshot.
    #[must_use]
    pub fn evaluator(&self) -> BatchEvaluator {
        BatchEvaluator::new(Arc::clone(&self.index))
    }
}

impl Deref for Snapshot {
    type Target = RuleIndex;

    fn deref(&self) -> &RuleIndex {
        &self.index
    }
}

/// Holder of the current index snapshot.
#[derive(Debug)]
pub struct IndexHandle {
    current: RwLock<Snapshot>,
    /// Serializes writers so concurrent updates cannot lose each other's work.
    writer: Mutex<()>,
}

impl IndexHandle {
    /// Creates a handle publishing `index` as version 0.
    #[must_use]
    pub fn new(index: RuleIndex) -> Self {
        Self {
            current: RwLock::new(Snapshot {
                version: 0,
                index: Arc::new(index),
            }),
            writer: Mutex::new(()),
        }
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.current.read().clone()
    }

    /// An evaluator bound to the current snapshot.
    #[must_use]
    pub fn evaluator(&self) -> BatchEvaluator {
        self.snapshot().evaluator()
    }

    /// Replaces the index wholesale, returning the new version.
    pub fn publish(&self, index: RuleIndex) -> u64 {
        let _writer = self.writer.lock();
        self.swap(index)
    }

    /// Applies `change` to a copy of the current index and publishes it.
    ///
    /// If `change` fails, nothing is published and the current snapshot stays.
    ///
    /// # Errors
    ///
    /// Returns whatever `change` returns.
    pub fn update<R>(&self, change: impl FnOnce(&mut RuleIndex) -> Result<R>) -> Result<R> {
        let _writer = self.writer.lock();
        let mut next = RuleIndex::clone(&self.snapshot().index);
        let result = change(&mut next)?;
        self.swap(next);
        Ok(result)
    }

    fn swap(&self, index: RuleIndex) -> u64 {
        let rules = index.len();
        let mut current = self.current.write();
        let version = current.version + 1;
        *current = Snapshot {
            version,
            index: Arc::new(index),
        };
        info!(version, rules, "rule index snapshot published");
        version
    }
}
