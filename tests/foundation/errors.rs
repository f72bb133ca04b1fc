//! Integration tests for Error types
//!
//! Tests error construction, display, context, and fatality.

use rulegate_foundation::{Error, ErrorContext, ErrorKind, IndexKey, RuleId};

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn error_invalid_hierarchy() {
    let err = Error::invalid_hierarchy(Some(IndexKey::market("4001")), "missing event reference");
    assert!(matches!(err.kind, ErrorKind::InvalidHierarchy { .. }));
    assert_eq!(
        format!("{err}"),
        "invalid hierarchy at market:4001: missing event reference"
    );
}

#[test]
fn error_malformed_rule() {
    let err = Error::malformed_rule(Some(RuleId::from("r9")), "blank target");
    assert_eq!(format!("{err}"), "malformed rule r9: blank target");

    let anonymous = Error::malformed_rule(None, "blank rule id");
    assert_eq!(format!("{anonymous}"), "malformed rule: blank rule id");
}

#[test]
fn error_rule_bookkeeping() {
    let err = Error::duplicate_rule(RuleId::from("dup"));
    assert!(matches!(err.kind, ErrorKind::DuplicateRule(_)));
    assert!(format!("{err}").contains("dup"));

    let err = Error::unknown_rule(RuleId::from("gone"));
    assert!(matches!(err.kind, ErrorKind::UnknownRule(_)));
    assert!(format!("{err}").contains("gone"));
}

#[test]
fn error_unknown_jurisdiction() {
    let err = Error::unknown_jurisdiction("NV");
    assert_eq!(format!("{err}"), "unknown jurisdiction: NV");
}

// =============================================================================
// Fatality
// =============================================================================

#[test]
fn only_corruption_is_fatal() {
    assert!(Error::index_corruption("bucket mismatch").is_fatal());
    assert!(!Error::invalid_hierarchy(None, "x").is_fatal());
    assert!(!Error::malformed_rule(None, "x").is_fatal());
    assert!(!Error::duplicate_rule(RuleId::from("x")).is_fatal());
    assert!(!Error::unknown_rule(RuleId::from("x")).is_fatal());
    assert!(!Error::unknown_jurisdiction("x").is_fatal());
    assert!(!Error::new(ErrorKind::Internal("x".to_string())).is_fatal());
}

// =============================================================================
// Context
// =============================================================================

#[test]
fn context_display() {
    assert_eq!(
        ErrorContext::new().with_source("feed-a").with_position(3).to_string(),
        "at feed-a#3"
    );
    assert_eq!(ErrorContext::new().with_position(3).to_string(), "at #3");
    assert_eq!(ErrorContext::new().to_string(), "");
}

#[test]
fn at_position_keeps_source() {
    let err = Error::invalid_hierarchy(None, "x")
        .with_context(ErrorContext::new().with_source("feed-a"))
        .at_position(7);
    let context = err.context.expect("context attached");
    assert_eq!(context.source.as_deref(), Some("feed-a"));
    assert_eq!(context.position, Some(7));
}
