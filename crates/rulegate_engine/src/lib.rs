//! Rule resolution, batch evaluation, and index snapshots for Rulegate.
//!
//! This crate provides:
//! - [`Resolver`] - Most-specific-wins resolution of one node
//! - [`BatchEvaluator`] - Streaming catalog passes with partial-failure reporting
//! - [`IndexHandle`] - Copy-on-write snapshots of a rule index
//! - [`Jurisdictions`] - One ruleset and default verdict per state
//! - [`ParallelConfig`] - Multi-threaded evaluation of a materialized catalog

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod decision;
pub mod evaluator;
pub mod jurisdiction;
pub mod parallel;
pub mod resolver;
pub mod snapshot;

pub use decision::{Decision, DecisionSource};
pub use evaluator::{
    AuditReport, BatchEvaluator, CatalogEntry, Evaluation, EvaluationObserver, Outcome,
    PassStats, Rejected, ValidCatalog, ValidNodes,
};
pub use jurisdiction::Jurisdictions;
pub use parallel::{ParallelConfig, partition, shard_of};
pub use resolver::{Candidate, Precedence, Resolver};
pub use snapshot::{IndexHandle, Snapshot};
