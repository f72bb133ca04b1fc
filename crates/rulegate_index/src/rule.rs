//! Filtering rules.
//!
//! A rule is anchored at one catalog node and covers that node and everything
//! below it. An optional qualifier narrows it further to nodes whose ancestor
//! chain passes through every qualifying key.

use std::fmt;

use rulegate_foundation::{Effect, Error, HierarchyLevel, HierarchyNode, IndexKey, Result, RuleId};

// =============================================================================
// Qualifier
// =============================================================================

/// Coarser ancestors a node must have for a qualified rule to apply.
///
/// Keys are kept sorted by level, coarsest first, without repeats.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Qualifier {
    keys: Vec<IndexKey>,
}

impl Qualifier {
    /// The empty qualifier, which every node satisfies.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Builds a qualifier from any set of keys.
    #[must_use]
    pub fn from_keys(keys: impl IntoIterator<Item = IndexKey>) -> Self {
        let mut keys: Vec<IndexKey> = keys.into_iter().collect();
        keys.sort();
        keys.dedup();
        Self { keys }
    }

    /// Returns a qualifier with `key` added.
    #[must_use]
    pub fn with(mut self, key: IndexKey) -> Self {
        if let Err(pos) = self.keys.binary_search(&key) {
            self.keys.insert(pos, key);
        }
        self
    }

    /// Returns true if there are no qualifying keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The qualifying keys, coarsest first.
    #[must_use]
    pub fn keys(&self) -> &[IndexKey] {
        &self.keys
    }

    /// Returns true if every qualifying key is an ancestor of `node`.
    #[must_use]
    pub fn matches(&self, node: &HierarchyNode) -> bool {
        self.keys.iter().all(|k| node.descends_from(k))
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

// =============================================================================
// Rule
// =============================================================================

/// A single allow/block directive.
///
/// Rules are immutable once built. Changing a rule means retracting the old
/// one from the index and inserting the replacement.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Rule {
    id: RuleId,
    effect: Effect,
    target: IndexKey,
    qualifier: Qualifier,
}

impl Rule {
    /// Creates an unqualified rule.
    #[must_use]
    pub fn new(id: impl Into<RuleId>, effect: Effect, target: IndexKey) -> Self {
        Self {
            id: id.into(),
            effect,
            target,
            qualifier: Qualifier::none(),
        }
    }

    /// Creates an unqualified ALLOW rule.
    #[must_use]
    pub fn allow(id: impl Into<RuleId>, target: IndexKey) -> Self {
        Self::new(id, Effect::Allow, target)
    }

    /// Creates an unqualified BLOCK rule.
    #[must_use]
    pub fn block(id: impl Into<RuleId>, target: IndexKey) -> Self {
        Self::new(id, Effect::Block, target)
    }

    /// Restricts the rule to nodes under `ancestor`.
    #[must_use]
    pub fn under(mut self, ancestor: IndexKey) -> Self {
        self.qualifier = self.qualifier.with(ancestor);
        self
    }

    /// Replaces the qualifier.
    #[must_use]
    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifier = qualifier;
        self
    }

    /// The rule id.
    #[must_use]
    pub fn id(&self) -> &RuleId {
        &self.id
    }

    /// The rule effect.
    #[must_use]
    pub fn effect(&self) -> Effect {
        self.effect
    }

    /// The node the rule is anchored at.
    #[must_use]
    pub fn target(&self) -> &IndexKey {
        &self.target
    }

    /// The anchor level.
    #[must_use]
    pub fn level(&self) -> HierarchyLevel {
        self.target.level
    }

    /// The qualifier (possibly empty).
    #[must_use]
    pub fn qualifier(&self) -> &Qualifier {
        &self.qualifier
    }

    /// Returns true if the rule carries a qualifier.
    #[must_use]
    pub fn is_qualified(&self) -> bool {
        !self.qualifier.is_empty()
    }

    /// Returns true if the rule covers `node`: the node descends from the
    /// anchor and satisfies the qualifier.
    #[must_use]
    pub fn applies_to(&self, node: &HierarchyNode) -> bool {
        node.descends_from(&self.target) && self.qualifier.matches(node)
    }

    /// Checks that the rule is structurally coherent.
    ///
    /// # Errors
    ///
    /// Returns `MalformedRule` if the id or any referenced node id is blank,
    /// a qualifying key is not strictly coarser than the anchor, or two
    /// qualifying keys name different nodes at the same level.
    pub fn validate(&self) -> Result<()> {
        let malformed = |reason: String| Error::malformed_rule(Some(self.id.clone()), reason);

        if self.id.as_str().trim().is_empty() {
            return Err(Error::malformed_rule(None, "blank rule id"));
        }
        if self.target.id.is_blank() {
            return Err(malformed(format!("blank {} target", self.target.level)));
        }

        for key in self.qualifier.keys() {
            if key.id.is_blank() {
                return Err(malformed(format!("blank {} qualifier", key.level)));
            }
            if key.level >= self.target.level {
                return Err(malformed(format!(
                    "qualifier {key} is not coarser than target {}",
                    self.target
                )));
            }
        }

        for pair in self.qualifier.keys().windows(2) {
            if pair[0].level == pair[1].level {
                return Err(malformed(format!(
                    "qualifiers {} and {} can never both hold",
                    pair[0], pair[1]
                )));
            }
        }

        Ok(())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.id, self.effect, self.target)?;
        if self.is_qualified() {
            write!(f, " under [{}]", self.qualifier)?;
        }
        Ok(())
    }
}
