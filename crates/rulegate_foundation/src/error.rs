//! Error types for the Rulegate system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;

use thiserror::Error;

use crate::id::{IndexKey, RuleId};

/// The main error type for Rulegate operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Records the batch position of the offending input.
    ///
    /// Keeps any source already attached.
    #[must_use]
    pub fn at_position(self, position: usize) -> Self {
        let context = self.context.clone().unwrap_or_default();
        self.with_context(context.with_position(position))
    }

    /// Creates an invalid hierarchy error.
    #[must_use]
    pub fn invalid_hierarchy(key: Option<IndexKey>, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidHierarchy {
            key,
            reason: reason.into(),
        })
    }

    /// Creates a malformed rule error.
    #[must_use]
    pub fn malformed_rule(rule: Option<RuleId>, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedRule {
            rule,
            reason: reason.into(),
        })
    }

    /// Creates a duplicate rule error.
    #[must_use]
    pub fn duplicate_rule(id: RuleId) -> Self {
        Self::new(ErrorKind::DuplicateRule(id))
    }

    /// Creates an unknown rule error.
    #[must_use]
    pub fn unknown_rule(id: RuleId) -> Self {
        Self::new(ErrorKind::UnknownRule(id))
    }

    /// Creates an index corruption error.
    #[must_use]
    pub fn index_corruption(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IndexCorruption(message.into()))
    }

    /// Creates an unknown jurisdiction error.
    #[must_use]
    pub fn unknown_jurisdiction(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownJurisdiction(name.into()))
    }

    /// Returns true if this error must abort the operation that raised it.
    ///
    /// Only index corruption is fatal. Bad catalog entries and bad rules are
    /// reported per item and the surrounding batch carries on.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind, ErrorKind::IndexCorruption(_))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// A catalog node's ancestor chain is incomplete, inconsistent, or cyclic.
    #[error("invalid hierarchy{}: {reason}", fmt_key(.key.as_ref()))]
    InvalidHierarchy {
        /// The node (or the reference) that failed validation, if known.
        key: Option<IndexKey>,
        /// What was wrong with it.
        reason: String,
    },

    /// A rule is structurally incoherent.
    #[error("malformed rule{}: {reason}", fmt_rule(.rule.as_ref()))]
    MalformedRule {
        /// The rule id, if the record carried one.
        rule: Option<RuleId>,
        /// What was wrong with it.
        reason: String,
    },

    /// A rule equal to one already indexed was inserted while duplicate
    /// detection is on.
    #[error("duplicate rule: {0}")]
    DuplicateRule(RuleId),

    /// Retraction of a rule that is not in the index.
    #[error("unknown rule: {0}")]
    UnknownRule(RuleId),

    /// An internal index invariant is broken.
    #[error("index corruption: {0}")]
    IndexCorruption(String),

    /// No ruleset is registered for the jurisdiction.
    #[error("unknown jurisdiction: {0}")]
    UnknownJurisdiction(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

fn fmt_key(key: Option<&IndexKey>) -> String {
    key.map(|k| format!(" at {k}")).unwrap_or_default()
}

fn fmt_rule(rule: Option<&RuleId>) -> String {
    rule.map(|r| format!(" {r}")).unwrap_or_default()
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Name of the feed or ruleset the input came from.
    pub source: Option<String>,
    /// Zero-based position of the input within its batch.
    pub position: Option<usize>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source name.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the batch position.
    #[must_use]
    pub fn with_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.source, self.position) {
            (Some(source), Some(position)) => write!(f, "at {source}#{position}"),
            (Some(source), None) => write!(f, "at {source}"),
            (None, Some(position)) => write!(f, "at #{position}"),
            (None, None) => Ok(()),
        }
    }
}

/// Result type alias for Rulegate operations.
pub type Result<T> = std::result::Result<T, Error>;
