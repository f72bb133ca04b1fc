//! Tracing of evaluation passes.
//!
//! A [`Tracer`] is an [`EvaluationObserver`]: attach it to a
//! [`BatchEvaluator`](rulegate_engine::BatchEvaluator) and every pass, decision
//! and rejection lands in a bounded [`TraceBuffer`]. Recording costs one atomic
//! load when tracing is disabled.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use rulegate_debug::{Tracer, TracerConfig};
//! use rulegate_engine::BatchEvaluator;
//! use rulegate_foundation::CatalogRecord;
//! use rulegate_index::{IndexConfig, RuleIndex};
//!
//! let tracer = Arc::new(Tracer::new(TracerConfig::new().enabled()));
//! let index = Arc::new(RuleIndex::new(IndexConfig::allow_by_default()));
//! let evaluator = BatchEvaluator::new(index).with_observer(tracer.clone());
//!
//! evaluator.audit([CatalogRecord::new("1", "2", "3", "4")]).unwrap();
//! assert_eq!(tracer.stats().record_count, 3);
//! ```

pub mod buffer;
pub mod format;
pub mod record;

pub use buffer::{TraceBuffer, TraceBufferStats};
pub use format::{HumanFormatter, JsonFormatter, TraceFormatter};
pub use record::{TraceEvent, TraceRecord};

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use rulegate_engine::{Decision, EvaluationObserver, PassStats, Rejected, Snapshot};
use rulegate_foundation::HierarchyNode;
use rulegate_index::LoadReport;

// =============================================================================
// Trace Output
// =============================================================================

/// Where trace output should be sent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TraceOutput {
    /// No output (records are still buffered).
    #[default]
    None,
    /// Write each record to stderr as it is recorded.
    Stderr,
}

// =============================================================================
// Tracer Configuration
// =============================================================================

/// Configuration for the tracer.
#[derive(Clone, Debug)]
pub struct TracerConfig {
    /// Whether tracing starts enabled.
    pub enabled: bool,
    /// Maximum records to keep in the buffer.
    pub buffer_size: usize,
    /// Where to output traces.
    pub output: TraceOutput,
    /// Whether to use JSON format.
    pub json_format: bool,
    /// Event types to record (empty = all).
    pub event_filter: Vec<String>,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            buffer_size: 10_000,
            output: TraceOutput::None,
            json_format: false,
            event_filter: Vec::new(),
        }
    }
}

impl TracerConfig {
    /// Creates a new tracer configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to enable tracing.
    #[must_use]
    pub fn enabled(mut self) -> Self {
        self.enabled = true;
        self
    }

    /// Builder method to set buffer size.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Builder method to output to stderr.
    #[must_use]
    pub fn to_stderr(mut self) -> Self {
        self.output = TraceOutput::Stderr;
        self
    }

    /// Builder method to use JSON format.
    #[must_use]
    pub fn json(mut self) -> Self {
        self.json_format = true;
        self
    }

    /// Builder method to record only the given event types.
    #[must_use]
    pub fn filter_events(mut self, types: Vec<String>) -> Self {
        self.event_filter = types;
        self
    }
}

// =============================================================================
// Tracer
// =============================================================================

#[derive(Debug)]
struct TracerState {
    buffer: TraceBuffer,
    current_pass: u64,
}

/// Records evaluation events into a ring buffer.
///
/// Shared between threads behind an `Arc`; all methods take `&self`.
#[derive(Debug)]
pub struct Tracer {
    enabled: AtomicBool,
    config: TracerConfig,
    state: Mutex<TracerState>,
    start_time: Instant,
    human_formatter: HumanFormatter,
    json_formatter: JsonFormatter,
}

impl Tracer {
    /// Creates a new tracer with the given configuration.
    #[must_use]
    pub fn new(config: TracerConfig) -> Self {
        Self {
            enabled: AtomicBool::new(config.enabled),
            state: Mutex::new(TracerState {
                buffer: TraceBuffer::new(config.buffer_size),
                current_pass: 0,
            }),
            config,
            start_time: Instant::now(),
            human_formatter: HumanFormatter::new().with_timestamps(),
            json_formatter: JsonFormatter::new(),
        }
    }

    /// Creates a tracer with default configuration (disabled).
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(TracerConfig::default())
    }

    /// Creates an enabled tracer that outputs to stderr.
    #[must_use]
    pub fn to_stderr() -> Self {
        Self::new(TracerConfig::new().enabled().to_stderr())
    }

    /// Returns whether tracing is enabled.
    #[must_use]
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Enables tracing.
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    /// Disables tracing.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    /// Number of the most recent evaluation pass (0 before the first).
    #[must_use]
    pub fn current_pass(&self) -> u64 {
        self.state.lock().current_pass
    }

    /// Records a trace event.
    #[inline]
    pub fn record(&self, event: TraceEvent) {
        if !self.is_enabled() {
            return;
        }
        self.record_internal(event);
    }

    fn record_internal(&self, event: TraceEvent) {
        #[allow(clippy::cast_possible_truncation)]
        let timestamp_ns = self.start_time.elapsed().as_nanos() as u64;

        let mut state = self.state.lock();
        // Passes are counted even when their start event is filtered out.
        if matches!(event, TraceEvent::PassStarted { .. }) {
            state.current_pass += 1;
        }
        let pass = state.current_pass;

        let filter = &self.config.event_filter;
        if !filter.is_empty() && !filter.iter().any(|t| t == event.event_type()) {
            return;
        }

        let echo = (self.config.output == TraceOutput::Stderr).then(|| event.clone());
        let id = state.buffer.push(pass, timestamp_ns, event);
        drop(state);

        if let Some(event) = echo {
            let line = self.format_record(&TraceRecord::new(id, pass, timestamp_ns, event));
            let _ = writeln!(io::stderr(), "{line}");
        }
    }

    /// Records the rejections of a rule load.
    pub fn record_load(&self, report: &LoadReport) {
        for rejection in &report.rejected {
            self.record(TraceEvent::RuleRejected {
                position: rejection.position,
                reason: rejection.error.to_string(),
            });
        }
    }

    /// Records that a snapshot was published.
    pub fn record_snapshot(&self, snapshot: &Snapshot) {
        self.record(TraceEvent::SnapshotPublished {
            version: snapshot.version(),
            rules: snapshot.len(),
        });
    }

    /// Formats a record using the current format settings.
    #[must_use]
    pub fn format_record(&self, record: &TraceRecord) -> String {
        if self.config.json_format {
            self.json_formatter.format(record)
        } else {
            self.human_formatter.format(record)
        }
    }

    /// Formats multiple records.
    #[must_use]
    pub fn format_records(&self, records: &[&TraceRecord]) -> String {
        if self.config.json_format {
            self.json_formatter.format_many(records)
        } else {
            self.human_formatter.format_many(records)
        }
    }

    /// Copies of every buffered record, oldest first.
    #[must_use]
    pub fn records(&self) -> Vec<TraceRecord> {
        self.state.lock().buffer.iter().cloned().collect()
    }

    /// Copies of the most recent `count` records.
    #[must_use]
    pub fn recent(&self, count: usize) -> Vec<TraceRecord> {
        self.state
            .lock()
            .buffer
            .recent(count)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Copies of the records of one pass.
    #[must_use]
    pub fn records_for_pass(&self, pass: u64) -> Vec<TraceRecord> {
        self.state
            .lock()
            .buffer
            .records_for_pass(pass)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Clears the trace buffer.
    pub fn clear(&self) {
        self.state.lock().buffer.clear();
    }

    /// Returns buffer statistics.
    #[must_use]
    pub fn stats(&self) -> TraceBufferStats {
        self.state.lock().buffer.stats()
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::disabled()
    }
}

impl EvaluationObserver for Tracer {
    fn pass_started(&self, rules: usize) {
        self.record(TraceEvent::PassStarted { rules });
    }

    fn decided(&self, node: &HierarchyNode, decision: &Decision) {
        self.record(TraceEvent::NodeDecided {
            node: node.key().clone(),
            verdict: decision.verdict,
            rule: decision.winning_rule().cloned(),
        });
    }

    fn rejected(&self, rejected: &Rejected) {
        self.record(TraceEvent::EntryRejected {
            position: rejected.position,
            reason: rejected.error.to_string(),
        });
    }

    fn pass_finished(&self, stats: &PassStats) {
        self.record(TraceEvent::PassFinished { stats: *stats });
    }
}

// =============================================================================
// Tests
// =============================================================================
