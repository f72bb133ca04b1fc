//! Integration tests for identifiers, levels, and verdicts

use std::collections::BTreeSet;

use rulegate_foundation::{Effect, HierarchyLevel, IndexKey, NodeId, Verdict};

// =============================================================================
// Levels
// =============================================================================

#[test]
fn levels_order_coarse_to_fine() {
    assert!(HierarchyLevel::Sport < HierarchyLevel::Competition);
    assert!(HierarchyLevel::Event < HierarchyLevel::Market);
    assert_eq!(HierarchyLevel::ALL.len(), HierarchyLevel::COUNT);
    for (depth, level) in HierarchyLevel::ALL.into_iter().enumerate() {
        assert_eq!(level.depth(), depth);
        assert_eq!(HierarchyLevel::from_depth(depth), Some(level));
    }
    assert_eq!(HierarchyLevel::from_depth(4), None);
}

#[test]
fn levels_parse_by_name_or_depth() {
    assert_eq!("SPORT".parse::<HierarchyLevel>(), Ok(HierarchyLevel::Sport));
    assert_eq!("Event".parse::<HierarchyLevel>(), Ok(HierarchyLevel::Event));
    assert_eq!("3".parse::<HierarchyLevel>(), Ok(HierarchyLevel::Market));
    assert!("LEAGUE".parse::<HierarchyLevel>().is_err());
    assert!("4".parse::<HierarchyLevel>().is_err());
}

#[test]
fn parent_and_child_walk_the_levels() {
    assert_eq!(HierarchyLevel::Sport.parent(), None);
    assert_eq!(HierarchyLevel::Market.parent(), Some(HierarchyLevel::Event));
    assert_eq!(HierarchyLevel::Market.child(), None);
    assert_eq!(HierarchyLevel::Sport.child(), Some(HierarchyLevel::Competition));
}

// =============================================================================
// Keys
// =============================================================================

#[test]
fn key_equality_is_level_and_id() {
    assert_eq!(IndexKey::event("531321"), IndexKey::new(HierarchyLevel::Event, "531321"));
    assert_ne!(IndexKey::event("1"), IndexKey::market("1"));
    assert_eq!(IndexKey::sport(1_u64), IndexKey::sport("1"));
}

#[test]
fn keys_sort_by_level_first() {
    let keys: BTreeSet<_> = [
        IndexKey::market("1"),
        IndexKey::sport("9"),
        IndexKey::event("5"),
        IndexKey::sport("2"),
    ]
    .into_iter()
    .collect();
    let rendered: Vec<String> = keys.iter().map(ToString::to_string).collect();
    assert_eq!(rendered, vec!["sport:2", "sport:9", "event:5", "market:1"]);
}

#[test]
fn blank_node_ids() {
    assert!(NodeId::new("").is_blank());
    assert!(NodeId::new("  ").is_blank());
    assert!(!NodeId::new("0").is_blank());
}

// =============================================================================
// Effects and Verdicts
// =============================================================================

#[test]
fn effects_map_to_verdicts() {
    assert_eq!(Effect::Allow.verdict(), Verdict::Allowed);
    assert_eq!(Effect::Block.verdict(), Verdict::Blocked);
    assert!(Verdict::Allowed.is_allowed());
    assert!(!Verdict::Blocked.is_allowed());
}

#[test]
fn effects_parse_and_display() {
    assert_eq!("BLOCK".parse::<Effect>(), Ok(Effect::Block));
    assert_eq!(Effect::Allow.to_string(), "ALLOW");
    assert_eq!(Verdict::Blocked.to_string(), "BLOCKED");
    assert!("DENY".parse::<Effect>().unwrap_err().contains("DENY"));
}
