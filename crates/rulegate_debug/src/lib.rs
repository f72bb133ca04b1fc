//! Decision explanation and evaluation tracing for Rulegate.
//!
//! This crate provides:
//! - [`DecisionExplanation`] - Why a node was allowed or blocked
//! - [`Tracer`] - An evaluation observer that records passes into a ring buffer
//! - [`TraceBuffer`] - Bounded storage for trace records
//! - [`HumanFormatter`] / [`JsonFormatter`] - Trace output formats

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod explain;
pub mod trace;

pub use explain::{CandidateOutcome, CandidateReport, DecisionExplanation};
pub use trace::{
    HumanFormatter, JsonFormatter, TraceBuffer, TraceBufferStats, TraceEvent, TraceFormatter,
    TraceOutput, TraceRecord, Tracer, TracerConfig,
};
