//! Catalog hierarchy levels.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A level of the catalog hierarchy.
///
/// Levels are totally ordered from coarsest ([`Sport`](Self::Sport)) to finest
/// ([`Market`](Self::Market)), so `Market > Event` reads as "more specific".
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum HierarchyLevel {
    /// Root of the tree (football, tennis, ...).
    Sport,
    /// A league or tournament within a sport.
    Competition,
    /// A fixture within a competition.
    Event,
    /// A bettable market within an event. Always a leaf.
    Market,
}

impl HierarchyLevel {
    /// All levels, coarsest first.
    pub const ALL: [HierarchyLevel; 4] = [
        HierarchyLevel::Sport,
        HierarchyLevel::Competition,
        HierarchyLevel::Event,
        HierarchyLevel::Market,
    ];

    /// Number of levels in the hierarchy.
    pub const COUNT: usize = 4;

    /// Distance from the root: 0 for `Sport`, 3 for `Market`.
    #[must_use]
    pub const fn depth(self) -> usize {
        match self {
            Self::Sport => 0,
            Self::Competition => 1,
            Self::Event => 2,
            Self::Market => 3,
        }
    }

    /// Returns the level for a depth, if in range.
    #[must_use]
    pub const fn from_depth(depth: usize) -> Option<Self> {
        match depth {
            0 => Some(Self::Sport),
            1 => Some(Self::Competition),
            2 => Some(Self::Event),
            3 => Some(Self::Market),
            _ => None,
        }
    }

    /// The level directly above this one. `None` for `Sport`.
    #[must_use]
    pub const fn parent(self) -> Option<Self> {
        match self {
            Self::Sport => None,
            Self::Competition => Some(Self::Sport),
            Self::Event => Some(Self::Competition),
            Self::Market => Some(Self::Event),
        }
    }

    /// The level directly below this one. `None` for `Market`.
    #[must_use]
    pub const fn child(self) -> Option<Self> {
        match self {
            Self::Sport => Some(Self::Competition),
            Self::Competition => Some(Self::Event),
            Self::Event => Some(Self::Market),
            Self::Market => None,
        }
    }

    /// Lowercase name used in keys and records.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sport => "sport",
            Self::Competition => "competition",
            Self::Event => "event",
            Self::Market => "market",
        }
    }
}

impl fmt::Display for HierarchyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a level name cannot be parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseLevelError(pub String);

impl fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown hierarchy level `{}`", self.0)
    }
}

impl std::error::Error for ParseLevelError {}

impl FromStr for HierarchyLevel {
    type Err = ParseLevelError;

    /// Accepts level names in any case, or a numeric depth `0..=3`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(depth) = trimmed.parse::<usize>() {
            return Self::from_depth(depth).ok_or_else(|| ParseLevelError(s.to_string()));
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "sport" => Ok(Self::Sport),
            "competition" => Ok(Self::Competition),
            "event" => Ok(Self::Event),
            "market" => Ok(Self::Market),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}
