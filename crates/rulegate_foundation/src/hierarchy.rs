//! Catalog hierarchy: flat feed records, nodes, and ancestor chains.
//!
//! Every node carries its ancestor chain, ordered from its own key up to the
//! sport at the root. The chain is validated once at construction and never
//! changes afterwards, so rule resolution can index into it without checks.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::id::{IndexKey, NodeId};
use crate::level::HierarchyLevel;

// =============================================================================
// Catalog Record
// =============================================================================

/// Flat catalog feed record naming one market and all of its ancestors.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CatalogRecord {
    /// Sport id.
    pub sport_id: NodeId,
    /// Competition id.
    pub competition_id: NodeId,
    /// Event id.
    pub event_id: NodeId,
    /// Market id.
    pub market_id: NodeId,
}

impl CatalogRecord {
    /// Creates a record from its four ids.
    #[must_use]
    pub fn new(
        sport: impl Into<NodeId>,
        competition: impl Into<NodeId>,
        event: impl Into<NodeId>,
        market: impl Into<NodeId>,
    ) -> Self {
        Self {
            sport_id: sport.into(),
            competition_id: competition.into(),
            event_id: event.into(),
            market_id: market.into(),
        }
    }
}

// =============================================================================
// Hierarchy Node
// =============================================================================

/// A catalog node together with its validated ancestor chain.
///
/// Cloning is O(1); the chain is shared.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct HierarchyNode {
    /// Own key first, sport last.
    chain: Arc<[IndexKey]>,
}

impl HierarchyNode {
    /// Builds a market node straight from a flat feed record.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHierarchy` if any of the four ids is blank.
    pub fn from_record(record: &CatalogRecord) -> Result<Self> {
        Self::from_chain(vec![
            IndexKey::market(record.market_id.clone()),
            IndexKey::event(record.event_id.clone()),
            IndexKey::competition(record.competition_id.clone()),
            IndexKey::sport(record.sport_id.clone()),
        ])
    }

    /// Builds a node from an explicit chain, own key first.
    ///
    /// The chain may start at any level but must step up exactly one level at
    /// a time and end at `Sport`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHierarchy` if the chain is empty, contains a blank id,
    /// skips or repeats a level, or stops short of the sport.
    pub fn from_chain(chain: Vec<IndexKey>) -> Result<Self> {
        let Some(first) = chain.first() else {
            return Err(Error::invalid_hierarchy(None, "empty ancestor chain"));
        };

        if let Some(blank) = chain.iter().find(|k| k.id.is_blank()) {
            return Err(Error::invalid_hierarchy(
                Some(first.clone()),
                format!("missing {} reference", blank.level),
            ));
        }

        for pair in chain.windows(2) {
            if pair[0].level.parent() != Some(pair[1].level) {
                return Err(Error::invalid_hierarchy(
                    Some(first.clone()),
                    format!("{} is not the parent level of {}", pair[1], pair[0]),
                ));
            }
        }

        if chain.last().map(|k| k.level) != Some(HierarchyLevel::Sport) {
            return Err(Error::invalid_hierarchy(
                Some(first.clone()),
                "ancestor chain does not reach a sport",
            ));
        }

        Ok(Self {
            chain: chain.into(),
        })
    }

    /// The node's own key.
    #[must_use]
    pub fn key(&self) -> &IndexKey {
        &self.chain[0]
    }

    /// The node's level.
    #[must_use]
    pub fn level(&self) -> HierarchyLevel {
        self.chain[0].level
    }

    /// The node's own id.
    #[must_use]
    pub fn id(&self) -> &NodeId {
        &self.chain[0].id
    }

    /// The ancestor chain, own key first and sport last.
    #[must_use]
    pub fn chain(&self) -> &[IndexKey] {
        &self.chain
    }

    /// The ancestor (or self) at `level`, if the node is at or below it.
    #[must_use]
    pub fn ancestor(&self, level: HierarchyLevel) -> Option<&IndexKey> {
        let own = self.level().depth();
        own.checked_sub(level.depth()).map(|i| &self.chain[i])
    }

    /// The sport at the root of the chain.
    #[must_use]
    pub fn sport(&self) -> &NodeId {
        &self.chain[self.chain.len() - 1].id
    }

    /// Returns true if `key` is this node or one of its ancestors.
    #[must_use]
    pub fn descends_from(&self, key: &IndexKey) -> bool {
        self.ancestor(key.level) == Some(key)
    }
}

impl fmt::Debug for HierarchyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HierarchyNode(")?;
        for (i, key) in self.chain.iter().enumerate() {
            if i > 0 {
                write!(f, " < ")?;
            }
            write!(f, "{key}")?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for HierarchyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl TryFrom<&CatalogRecord> for HierarchyNode {
    type Error = Error;

    fn try_from(record: &CatalogRecord) -> Result<Self> {
        Self::from_record(record)
    }
}

// =============================================================================
// Hierarchy Tree
// =============================================================================

/// Parent-linked catalog for feeds that deliver nodes one at a time.
///
/// Links are stored as given; parents may arrive after their children. The
/// chain is assembled and validated when a node is requested.
#[derive(Clone, Debug, Default)]
pub struct HierarchyTree {
    /// key -> parent key (`None` for sports).
    parents: BTreeMap<IndexKey, Option<IndexKey>>,
}

impl HierarchyTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of nodes registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// Returns true if no nodes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Returns true if `key` is registered.
    #[must_use]
    pub fn contains(&self, key: &IndexKey) -> bool {
        self.parents.contains_key(key)
    }

    /// Registers a node and its parent link.
    ///
    /// Re-registering the same link is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHierarchy` if the id is blank, a non-sport node has no
    /// parent, a sport is given a parent, or the node is already registered
    /// under a different parent.
    pub fn insert(&mut self, key: IndexKey, parent: Option<IndexKey>) -> Result<()> {
        Self::check_link(&key, parent.as_ref())?;

        match self.parents.get(&key) {
            Some(existing) if *existing == parent => Ok(()),
            Some(existing) => Err(Error::invalid_hierarchy(
                Some(key),
                format!(
                    "already registered under {}",
                    existing
                        .as_ref()
                        .map_or_else(|| "no parent".to_string(), ToString::to_string)
                ),
            )),
            None => {
                self.parents.insert(key, parent);
                Ok(())
            }
        }
    }

    /// Registers every link named by a flat record and returns its market.
    ///
    /// Nothing is registered if any link conflicts.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHierarchy` if the record is incomplete or contradicts
    /// links already in the tree.
    pub fn insert_record(&mut self, record: &CatalogRecord) -> Result<HierarchyNode> {
        let node = HierarchyNode::from_record(record)?;
        let chain = node.chain();

        let links: Vec<(IndexKey, Option<IndexKey>)> = chain
            .iter()
            .enumerate()
            .map(|(i, key)| (key.clone(), chain.get(i + 1).cloned()))
            .collect();

        for (key, parent) in &links {
            if let Some(existing) = self.parents.get(key) {
                if existing != parent {
                    return Err(Error::invalid_hierarchy(
                        Some(key.clone()),
                        "record contradicts an existing parent link",
                    ));
                }
            }
        }

        for (key, parent) in links {
            self.parents.entry(key).or_insert(parent);
        }
        Ok(node)
    }

    /// Assembles and validates the ancestor chain of `key`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHierarchy` if the node or one of its ancestors is not
    /// registered, a parent sits at the wrong level, or the links form a cycle.
    pub fn node(&self, key: &IndexKey) -> Result<HierarchyNode> {
        let mut chain = Vec::with_capacity(HierarchyLevel::COUNT);
        let mut seen = HashSet::with_capacity(HierarchyLevel::COUNT);
        let mut current = key.clone();

        loop {
            if !seen.insert(current.clone()) {
                return Err(Error::invalid_hierarchy(
                    Some(key.clone()),
                    format!("cycle through {current}"),
                ));
            }

            let parent = self.parents.get(&current).ok_or_else(|| {
                Error::invalid_hierarchy(Some(key.clone()), format!("missing node {current}"))
            })?;

            chain.push(current);
            match parent {
                Some(parent) => current = parent.clone(),
                None => break,
            }
        }

        HierarchyNode::from_chain(chain)
    }

    /// Every registered market, in key order.
    pub fn markets(&self) -> impl Iterator<Item = Result<HierarchyNode>> + '_ {
        self.parents
            .keys()
            .filter(|k| k.level == HierarchyLevel::Market)
            .map(|k| self.node(k))
    }

    fn check_link(key: &IndexKey, parent: Option<&IndexKey>) -> Result<()> {
        if key.id.is_blank() {
            return Err(Error::invalid_hierarchy(Some(key.clone()), "blank id"));
        }
        match (key.level, parent) {
            (HierarchyLevel::Sport, Some(p)) => Err(Error::invalid_hierarchy(
                Some(key.clone()),
                format!("sport cannot have parent {p}"),
            )),
            (HierarchyLevel::Sport, None) => Ok(()),
            (level, None) => Err(Error::invalid_hierarchy(
                Some(key.clone()),
                format!(
                    "missing {} reference",
                    level.parent().map_or("parent", HierarchyLevel::name)
                ),
            )),
            (_, Some(p)) if p.id.is_blank() => Err(Error::invalid_hierarchy(
                Some(key.clone()),
                format!("blank {} reference", p.level),
            )),
            (_, Some(_)) => Ok(()),
        }
    }
}
