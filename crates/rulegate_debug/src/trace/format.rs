//! Trace output formatters.
//!
//! Provides human-readable and JSON formatters for trace records.

use std::fmt::Write;

use super::record::{TraceEvent, TraceRecord};

// =============================================================================
// Trace Formatter Trait
// =============================================================================

/// Trait for formatting trace records.
pub trait TraceFormatter {
    /// Formats a single trace record to a string.
    fn format(&self, record: &TraceRecord) -> String;

    /// Formats multiple records.
    fn format_many(&self, records: &[&TraceRecord]) -> String {
        records
            .iter()
            .map(|r| self.format(r))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// =============================================================================
// Human-Readable Formatter
// =============================================================================

/// Formats trace records in human-readable form.
#[derive(Clone, Debug, Default)]
pub struct HumanFormatter {
    /// Whether to include timestamps.
    pub show_timestamps: bool,
    /// Whether to include record IDs.
    pub show_ids: bool,
}

impl HumanFormatter {
    /// Creates a new human formatter with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to show timestamps.
    #[must_use]
    pub fn with_timestamps(mut self) -> Self {
        self.show_timestamps = true;
        self
    }

    /// Builder method to show record IDs.
    #[must_use]
    pub fn with_ids(mut self) -> Self {
        self.show_ids = true;
        self
    }

    #[allow(clippy::cast_precision_loss)]
    fn format_timestamp(ns: u64) -> String {
        let us = ns / 1000;
        if us >= 1_000_000 {
            format!("{:.3}s", us as f64 / 1_000_000.0)
        } else if us >= 1000 {
            format!("{:.3}ms", us as f64 / 1000.0)
        } else {
            format!("{us}us")
        }
    }
}

impl TraceFormatter for HumanFormatter {
    fn format(&self, record: &TraceRecord) -> String {
        let mut line = String::new();

        if self.show_ids {
            let _ = write!(line, "[{:06}] ", record.id);
        }
        let _ = write!(line, "P{:04} ", record.pass);
        if self.show_timestamps {
            let _ = write!(line, "{:>10} ", Self::format_timestamp(record.timestamp_ns));
        }

        let _ = match &record.event {
            TraceEvent::PassStarted { rules } => {
                write!(line, "=== PASS {} START ({rules} rules) ===", record.pass)
            }
            TraceEvent::NodeDecided {
                node,
                verdict,
                rule: Some(rule),
            } => write!(line, "  {verdict} {node} by {rule}"),
            TraceEvent::NodeDecided {
                node,
                verdict,
                rule: None,
            } => write!(line, "  {verdict} {node} by default"),
            TraceEvent::EntryRejected { position, reason } => {
                write!(line, "  REJECTED entry #{position}: {reason}")
            }
            TraceEvent::PassFinished { stats } => {
                write!(line, "=== PASS {} END ({stats}) ===", record.pass)
            }
            TraceEvent::RuleRejected { position, reason } => {
                write!(line, "  RULE REJECTED #{position}: {reason}")
            }
            TraceEvent::SnapshotPublished { version, rules } => {
                write!(line, "  SNAPSHOT v{version} ({rules} rules)")
            }
        };

        line
    }
}

// =============================================================================
// JSON Formatter
// =============================================================================

/// Formats trace records as JSON objects.
#[derive(Clone, Debug, Default)]
pub struct JsonFormatter {
    /// Whether to put each record of a list on its own line.
    pub pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method for pretty printing.
    #[must_use]
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Quotes and escapes a string for JSON.
    fn string(s: &str) -> String {
        let mut out = String::with_capacity(s.len() + 2);
        out.push('"');
        for c in s.chars() {
            match c {
                '\\' => out.push_str("\\\\"),
                '"' => out.push_str("\\\""),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if c.is_control() => {
                    let _ = write!(out, "\\u{:04x}", c as u32);
                }
                c => out.push(c),
            }
        }
        out.push('"');
        out
    }
}

impl TraceFormatter for JsonFormatter {
    fn format(&self, record: &TraceRecord) -> String {
        let data = match &record.event {
            TraceEvent::PassStarted { rules } => format!("\"rules\":{rules}"),
            TraceEvent::NodeDecided {
                node,
                verdict,
                rule,
            } => {
                let rule = rule
                    .as_ref()
                    .map_or_else(|| "null".to_string(), |r| Self::string(r.as_str()));
                format!(
                    "\"level\":{},\"node\":{},\"verdict\":\"{verdict}\",\"rule\":{rule}",
                    Self::string(node.level.name()),
                    Self::string(node.id.as_str()),
                )
            }
            TraceEvent::EntryRejected { position, reason }
            | TraceEvent::RuleRejected { position, reason } => {
                format!("\"position\":{position},\"reason\":{}", Self::string(reason))
            }
            TraceEvent::PassFinished { stats } => format!(
                "\"evaluated\":{},\"allowed\":{},\"blocked\":{},\"rejected\":{}",
                stats.evaluated, stats.allowed, stats.blocked, stats.rejected
            ),
            TraceEvent::SnapshotPublished { version, rules } => {
                format!("\"version\":{version},\"rules\":{rules}")
            }
        };

        format!(
            "{{\"id\":{},\"pass\":{},\"timestamp_ns\":{},\"type\":\"{}\",{data}}}",
            record.id,
            record.pass,
            record.timestamp_ns,
            record.event_type()
        )
    }

    fn format_many(&self, records: &[&TraceRecord]) -> String {
        let items: Vec<_> = records.iter().map(|r| self.format(r)).collect();
        if self.pretty {
            format!("[\n  {}\n]", items.join(",\n  "))
        } else {
            format!("[{}]", items.join(","))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
