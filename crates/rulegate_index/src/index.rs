//! Rule index keyed by anchor node.
//!
//! Rules are bucketed by their `(level, id)` target, so the rules that can
//! affect a node are found with one hash lookup per ancestor instead of a scan
//! of the whole ruleset.
//!
//! The index is built on `im` persistent collections. Cloning it is O(1) and
//! yields an independent snapshot, which is what lets a batch pass keep
//! reading one version while maintenance produces the next.

use std::collections::HashSet;
use std::sync::Arc;

use rulegate_foundation::{Error, IndexKey, Result, RuleId, Verdict};
use tracing::{debug, warn};

use crate::record::RuleRecord;
use crate::rule::Rule;

// =============================================================================
// Configuration
// =============================================================================

/// Per-ruleset configuration supplied when an index is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexConfig {
    /// Verdict for nodes no rule applies to.
    pub default_verdict: Verdict,
    /// Reject rules equal to one already indexed.
    pub detect_duplicates: bool,
}

impl IndexConfig {
    /// Creates a configuration with the given default verdict.
    #[must_use]
    pub fn new(default_verdict: Verdict) -> Self {
        Self {
            default_verdict,
            detect_duplicates: false,
        }
    }

    /// Nodes without applicable rules are allowed.
    #[must_use]
    pub fn allow_by_default() -> Self {
        Self::new(Verdict::Allowed)
    }

    /// Nodes without applicable rules are blocked.
    #[must_use]
    pub fn block_by_default() -> Self {
        Self::new(Verdict::Blocked)
    }

    /// Builder method to enable or disable duplicate detection.
    #[must_use]
    pub fn with_duplicate_detection(mut self, detect: bool) -> Self {
        self.detect_duplicates = detect;
        self
    }
}

// =============================================================================
// Indexed Rule
// =============================================================================

/// A rule as stored in the index, stamped with its insertion sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexedRule {
    rule: Arc<Rule>,
    seq: u64,
}

impl IndexedRule {
    /// The rule.
    #[must_use]
    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    /// Shared handle to the rule.
    #[must_use]
    pub fn shared(&self) -> Arc<Rule> {
        Arc::clone(&self.rule)
    }

    /// Insertion sequence number. Later insertions have larger numbers.
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// The rules anchored at one key, in insertion order.
pub type Bucket = im::Vector<IndexedRule>;

/// Iterator over one bucket, returned by [`RuleIndex::lookup`].
///
/// Empty when no rule targets the key; looking up such a key allocates nothing.
pub struct Lookup<'a> {
    inner: Option<im::vector::Iter<'a, IndexedRule>>,
}

impl<'a> Iterator for Lookup<'a> {
    type Item = &'a IndexedRule;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.as_mut()?.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner
            .as_ref()
            .map_or((0, Some(0)), Iterator::size_hint)
    }
}

// =============================================================================
// Load Report
// =============================================================================

/// A rule record that was not admitted to the index.
#[derive(Debug)]
pub struct Rejection {
    /// Zero-based position of the record in the input.
    pub position: usize,
    /// Why it was rejected.
    pub error: Error,
}

/// Outcome of [`RuleIndex::load`]: the index built from every acceptable
/// record, plus the records that were turned away.
#[derive(Debug)]
pub struct LoadReport {
    /// Index containing the admitted rules.
    pub index: RuleIndex,
    /// Number of rules admitted.
    pub admitted: usize,
    /// Rejected records, in input order.
    pub rejected: Vec<Rejection>,
}

impl LoadReport {
    /// Returns true if every record was admitted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }
}

// =============================================================================
// Rule Index
// =============================================================================

/// Mapping from anchor key to the rules anchored there.
///
/// Invariant: every rule sits in exactly one bucket, the one keyed by its own
/// target. Buckets are never empty.
#[derive(Clone, Debug)]
pub struct RuleIndex {
    buckets: im::HashMap<IndexKey, Bucket>,
    config: IndexConfig,
    next_seq: u64,
    len: usize,
}

impl RuleIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new(config: IndexConfig) -> Self {
        Self {
            buckets: im::HashMap::new(),
            config,
            next_seq: 0,
            len: 0,
        }
    }

    /// Builds an index from a finite sequence of rules, consuming it once.
    ///
    /// # Errors
    ///
    /// Returns `MalformedRule` for the first incoherent rule, or
    /// `DuplicateRule` if duplicate detection is on and a rule repeats.
    /// Use [`RuleIndex::load`] for partial-success ingestion.
    pub fn build(rules: impl IntoIterator<Item = Rule>, config: IndexConfig) -> Result<Self> {
        let mut index = Self::new(config);
        for (position, rule) in rules.into_iter().enumerate() {
            index.insert(rule).map_err(|e| e.at_position(position))?;
        }
        debug!(
            rules = index.len,
            buckets = index.buckets.len(),
            "rule index built"
        );
        Ok(index)
    }

    /// Ingests raw records, admitting every valid one.
    ///
    /// Bad records are reported in the returned [`LoadReport`]; they never
    /// abort the load.
    pub fn load(records: impl IntoIterator<Item = RuleRecord>, config: IndexConfig) -> LoadReport {
        let mut index = Self::new(config);
        let mut rejected = Vec::new();

        for (position, record) in records.into_iter().enumerate() {
            let outcome = record.to_rule().and_then(|rule| index.insert(rule));
            if let Err(error) = outcome {
                warn!(position, rule = %record.id, %error, "rule rejected");
                rejected.push(Rejection {
                    position,
                    error: error.at_position(position),
                });
            }
        }

        debug!(
            admitted = index.len,
            rejected = rejected.len(),
            "rule records loaded"
        );
        LoadReport {
            admitted: index.len,
            index,
            rejected,
        }
    }

    /// The configuration the index was built with.
    #[must_use]
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Verdict for nodes no rule applies to.
    #[must_use]
    pub fn default_verdict(&self) -> Verdict {
        self.config.default_verdict
    }

    /// Number of indexed rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no rules are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of distinct anchor keys.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Every anchor key that has at least one rule.
    pub fn keys(&self) -> impl Iterator<Item = &IndexKey> {
        self.buckets.keys()
    }

    /// Rules anchored at `key`, oldest first.
    #[must_use]
    pub fn lookup(&self, key: &IndexKey) -> Lookup<'_> {
        Lookup {
            inner: self.buckets.get(key).map(im::Vector::iter),
        }
    }

    /// The bucket for `key`, if any rule targets it.
    #[must_use]
    pub fn bucket(&self, key: &IndexKey) -> Option<&Bucket> {
        self.buckets.get(key)
    }

    /// Every indexed rule, in insertion order.
    #[must_use]
    pub fn rules(&self) -> Vec<&IndexedRule> {
        let mut rules: Vec<&IndexedRule> =
            self.buckets.values().flat_map(im::Vector::iter).collect();
        rules.sort_by_key(|r| r.seq);
        rules
    }

    /// Adds a rule, returning its insertion sequence number.
    ///
    /// # Errors
    ///
    /// Returns `MalformedRule` if the rule fails validation, or
    /// `DuplicateRule` if duplicate detection is on and an equal rule is
    /// already indexed.
    pub fn insert(&mut self, rule: Rule) -> Result<u64> {
        rule.validate()?;

        let key = rule.target().clone();
        if self.config.detect_duplicates
            && self
                .lookup(&key)
                .any(|existing| *existing.rule == rule)
        {
            return Err(Error::duplicate_rule(rule.id().clone()));
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.len += 1;
        self.buckets
            .entry(key)
            .or_insert_with(im::Vector::new)
            .push_back(IndexedRule {
                rule: Arc::new(rule),
                seq,
            });
        Ok(seq)
    }

    /// Removes the most recently inserted rule equal to `rule`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownRule` if no equal rule is indexed.
    pub fn retract(&mut self, rule: &Rule) -> Result<IndexedRule> {
        let key = rule.target();
        let bucket = self
            .buckets
            .get_mut(key)
            .ok_or_else(|| Error::unknown_rule(rule.id().clone()))?;

        let position = bucket
            .iter()
            .enumerate()
            .filter(|(_, existing)| *existing.rule == *rule)
            .map(|(i, _)| i)
            .last()
            .ok_or_else(|| Error::unknown_rule(rule.id().clone()))?;

        let removed = bucket.remove(position);
        if bucket.is_empty() {
            self.buckets.remove(key);
        }
        self.len -= 1;
        Ok(removed)
    }

    /// Removes every rule with the given id, wherever it is anchored.
    ///
    /// Scans the whole index. Returns the removed rules in insertion order.
    pub fn retract_id(&mut self, id: &RuleId) -> Vec<IndexedRule> {
        let matching: Vec<Arc<Rule>> = self
            .rules()
            .into_iter()
            .filter(|r| r.rule.id() == id)
            .map(IndexedRule::shared)
            .collect();

        let mut removed: Vec<IndexedRule> = matching
            .iter()
            .filter_map(|rule| self.retract(rule).ok())
            .collect();
        removed.sort_by_key(|r| r.seq);
        removed
    }

    /// Checks the index's internal invariants.
    ///
    /// # Errors
    ///
    /// Returns `IndexCorruption` describing the first violation found.
    pub fn verify(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.len);
        let mut count = 0;

        for (key, bucket) in self.buckets.iter() {
            if bucket.is_empty() {
                return Err(Error::index_corruption(format!("empty bucket at {key}")));
            }
            for entry in bucket.iter() {
                if entry.rule.target() != key {
                    return Err(Error::index_corruption(format!(
                        "rule {} anchored at {} found in bucket {key}",
                        entry.rule.id(),
                        entry.rule.target()
                    )));
                }
                if entry.seq >= self.next_seq || !seen.insert(entry.seq) {
                    return Err(Error::index_corruption(format!(
                        "rule {} has invalid sequence number {}",
                        entry.rule.id(),
                        entry.seq
                    )));
                }
                count += 1;
            }
            if bucket
                .iter()
                .zip(bucket.iter().skip(1))
                .any(|(a, b)| a.seq >= b.seq)
            {
                return Err(Error::index_corruption(format!(
                    "bucket {key} is out of insertion order"
                )));
            }
        }

        if count != self.len {
            return Err(Error::index_corruption(format!(
                "index reports {} rules but holds {count}",
                self.len
            )));
        }
        Ok(())
    }

    /// Appends a rule to an arbitrary bucket, bypassing placement.
    ///
    /// Produces a corrupted index on purpose so callers can exercise their
    /// corruption handling.
    #[doc(hidden)]
    pub fn force_into_bucket(&mut self, key: IndexKey, rule: Rule) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.len += 1;
        self.buckets
            .entry(key)
            .or_insert_with(im::Vector::new)
            .push_back(IndexedRule {
                rule: Arc::new(rule),
                seq,
            });
    }
}
