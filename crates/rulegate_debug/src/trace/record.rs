//! Trace event and record types.
//!
//! This module defines the events recorded while evaluating catalogs and
//! maintaining rule indexes.

use rulegate_engine::PassStats;
use rulegate_foundation::{IndexKey, RuleId, Verdict};

// =============================================================================
// Trace Event
// =============================================================================

/// Events that can be traced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TraceEvent {
    /// An evaluation pass has started.
    PassStarted {
        /// Rules in the snapshot the pass runs against.
        rules: usize,
    },

    /// A node was decided.
    NodeDecided {
        /// The node's own key.
        node: IndexKey,
        /// The verdict.
        verdict: Verdict,
        /// The winning rule, or `None` for the default verdict.
        rule: Option<RuleId>,
    },

    /// A catalog entry was rejected as malformed.
    EntryRejected {
        /// Position of the entry in the catalog.
        position: usize,
        /// Why it was rejected.
        reason: String,
    },

    /// An evaluation pass ran out of catalog.
    PassFinished {
        /// Counters for the pass.
        stats: PassStats,
    },

    /// A rule record was turned away during a load.
    RuleRejected {
        /// Position of the record in the load.
        position: usize,
        /// Why it was rejected.
        reason: String,
    },

    /// A new index snapshot was published.
    SnapshotPublished {
        /// Snapshot version.
        version: u64,
        /// Rules in the snapshot.
        rules: usize,
    },
}

impl TraceEvent {
    /// Returns a short name for the event type.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::PassStarted { .. } => "pass-started",
            Self::NodeDecided { .. } => "node-decided",
            Self::EntryRejected { .. } => "entry-rejected",
            Self::PassFinished { .. } => "pass-finished",
            Self::RuleRejected { .. } => "rule-rejected",
            Self::SnapshotPublished { .. } => "snapshot-published",
        }
    }

    /// Returns true if this is a pass boundary event.
    #[must_use]
    pub fn is_pass_boundary(&self) -> bool {
        matches!(self, Self::PassStarted { .. } | Self::PassFinished { .. })
    }

    /// Returns true if this event reports a rejected input.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::EntryRejected { .. } | Self::RuleRejected { .. })
    }
}

// =============================================================================
// Trace Record
// =============================================================================

/// A timestamped trace record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceRecord {
    /// Unique record ID within the tracer.
    pub id: u64,
    /// The evaluation pass this event belongs to (0 before the first pass).
    pub pass: u64,
    /// Timestamp in nanoseconds since the tracer was created.
    pub timestamp_ns: u64,
    /// The trace event.
    pub event: TraceEvent,
}

impl TraceRecord {
    /// Creates a new trace record.
    #[must_use]
    pub fn new(id: u64, pass: u64, timestamp_ns: u64, event: TraceEvent) -> Self {
        Self {
            id,
            pass,
            timestamp_ns,
            event,
        }
    }

    /// Returns the event type name.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        self.event.event_type()
    }
}

// =============================================================================
// Tests
// =============================================================================
