//! Rulegate - Rule-indexed content filtering for sportsbook catalogs
//!
//! This crate re-exports all layers of the Rulegate system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: rulegate_debug       - Decision explanation, evaluation tracing
//! Layer 2: rulegate_engine      - Resolution, batch evaluation, snapshots, jurisdictions
//! Layer 1: rulegate_index       - Rule model, rule records, rule index
//! Layer 0: rulegate_foundation  - Hierarchy model, ids, verdicts, errors
//! ```

pub use rulegate_debug as debug;
pub use rulegate_engine as engine;
pub use rulegate_foundation as foundation;
pub use rulegate_index as index;
