//! Integration tests for Layer 1: Index
//!
//! Tests for the rule model, rule records, and the rule index.

mod records;
