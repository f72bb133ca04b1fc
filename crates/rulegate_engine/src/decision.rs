//! Filtering decisions.
//!
//! A decision is always derived from the current index and never stored as
//! the source of truth.

use std::fmt;

use rulegate_foundation::{IndexKey, RuleId, Verdict};
use rulegate_index::IndexedRule;

/// Where a decision's verdict came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecisionSource {
    /// A rule won precedence among the node's candidates.
    Rule {
        /// Id of the winning rule.
        id: RuleId,
        /// Key the winning rule is anchored at.
        anchor: IndexKey,
        /// Insertion sequence of the winning rule.
        seq: u64,
    },
    /// No rule applied; the index's default verdict was used.
    Default,
}

/// The verdict for one node, plus which rule (if any) produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decision {
    /// Allowed or blocked.
    pub verdict: Verdict,
    /// What produced the verdict.
    pub source: DecisionSource,
}

impl Decision {
    /// A decision made by a winning rule.
    #[must_use]
    pub fn from_rule(winner: &IndexedRule) -> Self {
        let rule = winner.rule();
        Self {
            verdict: rule.effect().verdict(),
            source: DecisionSource::Rule {
                id: rule.id().clone(),
                anchor: rule.target().clone(),
                seq: winner.seq(),
            },
        }
    }

    /// A decision falling back to the default verdict.
    #[must_use]
    pub fn fallback(verdict: Verdict) -> Self {
        Self {
            verdict,
            source: DecisionSource::Default,
        }
    }

    /// Returns true if the node is allowed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.verdict.is_allowed()
    }

    /// Returns true if no rule applied.
    #[must_use]
    pub fn is_default(&self) -> bool {
        matches!(self.source, DecisionSource::Default)
    }

    /// Id of the winning rule, if a rule decided.
    #[must_use]
    pub fn winning_rule(&self) -> Option<&RuleId> {
        match &self.source {
            DecisionSource::Rule { id, .. } => Some(id),
            DecisionSource::Default => None,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            DecisionSource::Rule { id, anchor, .. } => {
                write!(f, "{} by {id} at {anchor}", self.verdict)
            }
            DecisionSource::Default => write!(f, "{} by default", self.verdict),
        }
    }
}
