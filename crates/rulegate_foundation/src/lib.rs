//! Hierarchy model, identifiers, verdicts, and errors for Rulegate.
//!
//! This crate provides:
//! - [`HierarchyLevel`] - The four catalog levels, coarsest first
//! - [`NodeId`], [`RuleId`], [`IndexKey`] - Shared string identifiers
//! - [`HierarchyNode`] - A catalog node with its validated ancestor chain
//! - [`HierarchyTree`] - Parent-linked catalog assembly
//! - [`Effect`], [`Verdict`] - Rule effects and filtering outcomes
//! - [`Error`] - Rich error types with context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod hierarchy;
pub mod id;
pub mod level;
pub mod verdict;

pub use error::{Error, ErrorContext, ErrorKind, Result};
pub use hierarchy::{CatalogRecord, HierarchyNode, HierarchyTree};
pub use id::{IndexKey, NodeId, RuleId};
pub use level::{HierarchyLevel, ParseLevelError};
pub use verdict::{Effect, Verdict};
