//! Rule model, rule records, and the persistent rule index for Rulegate.
//!
//! This crate provides:
//! - [`Rule`] - An allow/block directive anchored at one catalog node
//! - [`Qualifier`] - Ancestors a node must have for a rule to apply
//! - [`RuleRecord`] - Raw rule records from the authoring pipeline
//! - [`RuleIndex`] - Rules bucketed by anchor key, with O(1) snapshots

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod index;
pub mod record;
pub mod rule;

pub use index::{Bucket, IndexConfig, IndexedRule, LoadReport, Lookup, Rejection, RuleIndex};
pub use record::{QualifierRecord, RuleRecord};
pub use rule::{Qualifier, Rule};
