//! Ring buffer for trace records.
//!
//! Keeps the most recent records, discarding the oldest once full.

use std::collections::{BTreeSet, HashMap, VecDeque};

use tracing::debug;

use super::record::{TraceEvent, TraceRecord};

// =============================================================================
// Trace Buffer
// =============================================================================

/// A bounded buffer of trace records, oldest first.
#[derive(Clone, Debug)]
pub struct TraceBuffer {
    records: VecDeque<TraceRecord>,
    max_size: usize,
    next_id: u64,
}

impl TraceBuffer {
    /// Creates a buffer holding at most `max_size` records.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(max_size.min(1024)),
            max_size,
            next_id: 0,
        }
    }

    /// Creates a buffer with the default size (10000 records).
    #[must_use]
    pub fn default_size() -> Self {
        Self::new(10_000)
    }

    /// Appends an event, evicting the oldest record if the buffer is full.
    ///
    /// Returns the assigned record ID.
    pub fn push(&mut self, pass: u64, timestamp_ns: u64, event: TraceEvent) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        if self.max_size == 0 {
            return id;
        }
        if self.records.len() >= self.max_size && id == self.max_size as u64 {
            debug!(max_size = self.max_size, "trace buffer full, evicting oldest records");
        }
        while self.records.len() >= self.max_size {
            self.records.pop_front();
        }
        self.records
            .push_back(TraceRecord::new(id, pass, timestamp_ns, event));
        id
    }

    /// Returns the number of records in the buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Clears all records. Record IDs keep increasing.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Returns an iterator over all records.
    pub fn iter(&self) -> impl Iterator<Item = &TraceRecord> {
        self.records.iter()
    }

    /// Looks up a record by ID.
    #[must_use]
    pub fn get(&self, id: u64) -> Option<&TraceRecord> {
        let first = self.records.front()?.id;
        let offset = usize::try_from(id.checked_sub(first)?).ok()?;
        self.records.get(offset)
    }

    /// Returns records for one pass.
    #[must_use]
    pub fn records_for_pass(&self, pass: u64) -> Vec<&TraceRecord> {
        self.filter(|r| r.pass == pass)
    }

    /// Returns the most recent `count` records.
    #[must_use]
    pub fn recent(&self, count: usize) -> Vec<&TraceRecord> {
        let start = self.records.len().saturating_sub(count);
        self.records.iter().skip(start).collect()
    }

    /// Returns records matching a predicate.
    pub fn filter<F>(&self, predicate: F) -> Vec<&TraceRecord>
    where
        F: Fn(&TraceRecord) -> bool,
    {
        self.records.iter().filter(|r| predicate(r)).collect()
    }

    /// Returns records of a specific event type.
    #[must_use]
    pub fn by_event_type(&self, event_type: &str) -> Vec<&TraceRecord> {
        self.filter(|r| r.event_type() == event_type)
    }

    /// Returns the distinct pass numbers in the buffer, ascending.
    #[must_use]
    pub fn passes(&self) -> Vec<u64> {
        self.records
            .iter()
            .map(|r| r.pass)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Returns statistics about the buffer.
    #[must_use]
    pub fn stats(&self) -> TraceBufferStats {
        let mut event_counts = HashMap::new();
        for record in &self.records {
            *event_counts.entry(record.event_type()).or_insert(0) += 1;
        }

        TraceBufferStats {
            record_count: self.records.len(),
            max_size: self.max_size,
            oldest_pass: self.records.front().map(|r| r.pass),
            newest_pass: self.records.back().map(|r| r.pass),
            total_recorded: self.next_id,
            event_counts,
        }
    }
}

impl Default for TraceBuffer {
    fn default() -> Self {
        Self::default_size()
    }
}

// =============================================================================
// Buffer Statistics
// =============================================================================

/// Statistics about a trace buffer.
#[derive(Clone, Debug)]
pub struct TraceBufferStats {
    /// Number of records currently in the buffer.
    pub record_count: usize,
    /// Maximum buffer size.
    pub max_size: usize,
    /// Oldest pass in the buffer.
    pub oldest_pass: Option<u64>,
    /// Newest pass in the buffer.
    pub newest_pass: Option<u64>,
    /// Records ever pushed, including evicted ones.
    pub total_recorded: u64,
    /// Count of each event type currently held.
    pub event_counts: HashMap<&'static str, usize>,
}

impl TraceBufferStats {
    /// Records pushed but no longer held.
    #[must_use]
    pub fn evicted(&self) -> u64 {
        self.total_recorded - self.record_count as u64
    }
}

// =============================================================================
// Tests
// =============================================================================
