//! "Why was this market blocked?"
//!
//! A [`DecisionExplanation`] lists every rule anchored on a node's ancestor
//! chain, the winner first, and says why each other rule lost.

use std::fmt;
use std::sync::Arc;

use rulegate_engine::{Candidate, Decision, Precedence, Resolver};
use rulegate_foundation::{CatalogRecord, HierarchyNode, Result};
use rulegate_index::{Rule, RuleIndex};

// =============================================================================
// Candidate Outcome
// =============================================================================

/// Why a candidate rule did or did not decide the node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CandidateOutcome {
    /// The rule decided the node.
    Won,
    /// The winner is anchored at a finer level.
    CoarserLevel,
    /// The winner sits at the same level and carries a qualifier.
    Unqualified,
    /// The winner ties on level and qualification but was inserted later.
    EarlierInsertion,
    /// The rule's qualifier names an ancestor the node does not have.
    QualifierExcludes,
}

impl CandidateOutcome {
    /// Returns true for the winning rule.
    #[must_use]
    pub fn is_winner(self) -> bool {
        self == Self::Won
    }

    fn against(candidate: &Candidate<'_>, winner: Precedence) -> Self {
        let mine = candidate.precedence;
        if !candidate.applies {
            Self::QualifierExcludes
        } else if mine == winner {
            Self::Won
        } else if mine.level < winner.level {
            Self::CoarserLevel
        } else if mine.qualified != winner.qualified {
            Self::Unqualified
        } else {
            Self::EarlierInsertion
        }
    }
}

impl fmt::Display for CandidateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Won => "won",
            Self::CoarserLevel => "a finer-level rule applies",
            Self::Unqualified => "a qualified rule at the same level applies",
            Self::EarlierInsertion => "a later rule at the same level applies",
            Self::QualifierExcludes => "qualifier does not match this node",
        })
    }
}

// =============================================================================
// Candidate Report
// =============================================================================

/// One rule considered for a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateReport {
    /// The rule.
    pub rule: Arc<Rule>,
    /// Insertion sequence of the rule.
    pub seq: u64,
    /// How it fared.
    pub outcome: CandidateOutcome,
}

// =============================================================================
// Decision Explanation
// =============================================================================

/// A decision together with the rules that competed for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecisionExplanation {
    /// The node explained.
    pub node: HierarchyNode,
    /// The decision reached.
    pub decision: Decision,
    /// Every rule anchored on the node's chain, winner first.
    pub candidates: Vec<CandidateReport>,
}

impl DecisionExplanation {
    /// Explains the decision for `node` under `index`.
    ///
    /// # Errors
    ///
    /// Returns `IndexCorruption` if a bucket holds a rule anchored elsewhere.
    pub fn explain(node: &HierarchyNode, index: &RuleIndex) -> Result<Self> {
        let candidates = Resolver::candidates(node, index)?;
        let winner = candidates.first().filter(|c| c.applies);

        let decision = winner.map_or_else(
            || Decision::fallback(index.default_verdict()),
            |c| Decision::from_rule(c.entry),
        );
        let reports = candidates
            .iter()
            .map(|candidate| CandidateReport {
                rule: candidate.entry.shared(),
                seq: candidate.entry.seq(),
                outcome: match winner {
                    Some(w) => CandidateOutcome::against(candidate, w.precedence),
                    None => CandidateOutcome::QualifierExcludes,
                },
            })
            .collect();

        Ok(Self {
            node: node.clone(),
            decision,
            candidates: reports,
        })
    }

    /// Explains the decision for a flat catalog record.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHierarchy` for a malformed record, or `IndexCorruption`.
    pub fn explain_record(record: &CatalogRecord, index: &RuleIndex) -> Result<Self> {
        Self::explain(&HierarchyNode::from_record(record)?, index)
    }

    /// The winning candidate, if a rule decided.
    #[must_use]
    pub fn winner(&self) -> Option<&CandidateReport> {
        self.candidates.first().filter(|c| c.outcome.is_winner())
    }

    /// Candidates that did not decide the node.
    pub fn losers(&self) -> impl Iterator<Item = &CandidateReport> {
        self.candidates.iter().filter(|c| !c.outcome.is_winner())
    }
}

impl fmt::Display for DecisionExplanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {}", self.node.key(), self.decision)?;
        if self.candidates.is_empty() {
            return write!(f, "  no rules on chain {:?}", self.node);
        }
        for (i, candidate) in self.candidates.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  #{} {}", candidate.seq, candidate.rule)?;
            if !candidate.outcome.is_winner() {
                write!(f, " (lost: {})", candidate.outcome)?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
