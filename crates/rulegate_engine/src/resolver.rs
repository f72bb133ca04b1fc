//! Per-node rule resolution.
//!
//! Resolution gathers the rules anchored at each key of a node's ancestor
//! chain (one index lookup per level), drops rules whose qualifier the node
//! does not satisfy, and picks a single winner by precedence:
//!
//! 1. Finer anchor level wins (market > event > competition > sport).
//! 2. At equal level, a qualified rule beats an unqualified one.
//! 3. Otherwise the most recently inserted rule wins.
//!
//! With no applicable rule the index's default verdict is returned.

use std::cmp::Ordering;

use rulegate_foundation::{
    CatalogRecord, Error, HierarchyLevel, HierarchyNode, IndexKey, Result,
};
use rulegate_index::{IndexedRule, RuleIndex};
use tracing::error;

use crate::decision::Decision;

// =============================================================================
// Precedence
// =============================================================================

/// Sort key for candidate rules. Greater wins.
///
/// Field order is the precedence order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Precedence {
    /// Anchor level of the rule.
    pub level: HierarchyLevel,
    /// Whether the rule carries a (satisfied) qualifier.
    pub qualified: bool,
    /// Insertion sequence of the rule.
    pub seq: u64,
}

impl Precedence {
    /// Precedence of an indexed rule.
    #[must_use]
    pub fn of(entry: &IndexedRule) -> Self {
        let rule = entry.rule();
        Self {
            level: rule.level(),
            qualified: rule.is_qualified(),
            seq: entry.seq(),
        }
    }
}

// =============================================================================
// Candidate
// =============================================================================

/// A rule found while resolving a node.
#[derive(Clone, Debug)]
pub struct Candidate<'a> {
    /// The indexed rule.
    pub entry: &'a IndexedRule,
    /// Its precedence.
    pub precedence: Precedence,
    /// False if the rule's qualifier excludes the node.
    pub applies: bool,
}

// =============================================================================
// Resolver
// =============================================================================

/// Stateless resolver over an index snapshot.
///
/// Performs only reads, so any number of threads may resolve against the same
/// index concurrently.
pub struct Resolver;

impl Resolver {
    /// Decides a single node.
    ///
    /// Never fails for a node without applicable rules.
    ///
    /// # Errors
    ///
    /// Returns `IndexCorruption` if a bucket holds a rule anchored elsewhere.
    pub fn resolve(node: &HierarchyNode, index: &RuleIndex) -> Result<Decision> {
        let mut best: Option<(Precedence, &IndexedRule)> = None;

        for key in node.chain() {
            for entry in index.lookup(key) {
                Self::check_placement(key, entry)?;
                if !entry.rule().qualifier().matches(node) {
                    continue;
                }
                let precedence = Precedence::of(entry);
                if best.as_ref().is_none_or(|(b, _)| precedence > *b) {
                    best = Some((precedence, entry));
                }
            }
        }

        Ok(match best {
            Some((_, winner)) => Decision::from_rule(winner),
            None => Decision::fallback(index.default_verdict()),
        })
    }

    /// Decides the market named by a flat catalog record.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHierarchy` if the record is incomplete, or
    /// `IndexCorruption` as for [`Resolver::resolve`].
    pub fn resolve_record(record: &CatalogRecord, index: &RuleIndex) -> Result<Decision> {
        let node = HierarchyNode::from_record(record)?;
        Self::resolve(&node, index)
    }

    /// Every rule anchored on the node's chain, winner first.
    ///
    /// Rules excluded by their qualifier are included with `applies == false`
    /// and sort after every applicable rule.
    ///
    /// # Errors
    ///
    /// Returns `IndexCorruption` if a bucket holds a rule anchored elsewhere.
    pub fn candidates<'a>(
        node: &HierarchyNode,
        index: &'a RuleIndex,
    ) -> Result<Vec<Candidate<'a>>> {
        let mut candidates = Vec::new();
        for key in node.chain() {
            for entry in index.lookup(key) {
                Self::check_placement(key, entry)?;
                candidates.push(Candidate {
                    entry,
                    precedence: Precedence::of(entry),
                    applies: entry.rule().qualifier().matches(node),
                });
            }
        }

        candidates.sort_by(|a, b| match (a.applies, b.applies) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => b.precedence.cmp(&a.precedence),
        });
        Ok(candidates)
    }

    fn check_placement(key: &IndexKey, entry: &IndexedRule) -> Result<()> {
        if entry.rule().target() == key {
            return Ok(());
        }
        let err = Error::index_corruption(format!(
            "rule {} anchored at {} found in bucket {key}",
            entry.rule().id(),
            entry.rule().target()
        ));
        error!(%err, "rule index invariant violated");
        Err(err)
    }
}
