//! Integration tests for Layer 2: Engine
//!
//! Tests for resolution, batch evaluation, snapshots, and jurisdictions.

mod evaluation;
mod resolution;
mod snapshots;
