//! Node, rule, and index-key identifiers.
//!
//! Ids are opaque strings shared through `Arc<str>`, so cloning a key while
//! building chains or index buckets never copies the text.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::level::HierarchyLevel;

/// Identifier of a catalog node, unique within its level.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct NodeId(Arc<str>);

impl NodeId {
    /// Creates a node id from any string-like value.
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Returns the id text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the id is empty or only whitespace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self::from(id.to_string())
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Identifier of a rule, supplied by whoever authored the ruleset.
///
/// Rule ids are not required to be unique: the index retains duplicates
/// unless duplicate detection is switched on.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RuleId(Arc<str>);

impl RuleId {
    /// Creates a rule id.
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Returns the id text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RuleId({})", self.0)
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RuleId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RuleId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

/// A `(level, id)` pair: the unit of rule indexing.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexKey {
    /// Hierarchy level of the node.
    pub level: HierarchyLevel,
    /// Node id within that level.
    pub id: NodeId,
}

impl IndexKey {
    /// Creates a key.
    #[must_use]
    pub fn new(level: HierarchyLevel, id: impl Into<NodeId>) -> Self {
        Self {
            level,
            id: id.into(),
        }
    }

    /// Shorthand for a `Sport` key.
    #[must_use]
    pub fn sport(id: impl Into<NodeId>) -> Self {
        Self::new(HierarchyLevel::Sport, id)
    }

    /// Shorthand for a `Competition` key.
    #[must_use]
    pub fn competition(id: impl Into<NodeId>) -> Self {
        Self::new(HierarchyLevel::Competition, id)
    }

    /// Shorthand for an `Event` key.
    #[must_use]
    pub fn event(id: impl Into<NodeId>) -> Self {
        Self::new(HierarchyLevel::Event, id)
    }

    /// Shorthand for a `Market` key.
    #[must_use]
    pub fn market(id: impl Into<NodeId>) -> Self {
        Self::new(HierarchyLevel::Market, id)
    }
}

impl fmt::Debug for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IndexKey({}:{})", self.level, self.id)
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.level, self.id)
    }
}
