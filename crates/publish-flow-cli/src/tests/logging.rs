// crates/publish-flow-cli/src/tests/logging.rs
// ============================================================================
// Module: CLI Logging Tests
// Description: Unit tests for filter resolution.
// Purpose: Pin the precedence of the env directive over the verbose flag.
// Dependencies: publish-flow-cli logging module
// ============================================================================

//! ## Overview
//! Filter resolution tests; the global subscriber is never installed here.

use crate::logging::LoggingError;
use crate::logging::build_filter;

#[test]
fn default_filter_is_info() {
    let filter = build_filter(false, None).unwrap();
    assert_eq!(filter.to_string(), "info");
}

#[test]
fn verbose_raises_to_debug() {
    let filter = build_filter(true, None).unwrap();
    assert_eq!(filter.to_string(), "debug");
}

#[test]
fn env_directive_wins_over_verbose() {
    let filter = build_filter(true, Some("publish_flow_core=trace")).unwrap();
    assert_eq!(filter.to_string(), "publish_flow_core=trace");
}

#[test]
fn blank_directive_is_ignored() {
    let filter = build_filter(false, Some("   ")).unwrap();
    assert_eq!(filter.to_string(), "info");
}

#[test]
fn malformed_directive_is_rejected() {
    let result = build_filter(false, Some("publish_flow_core=notalevel"));
    assert!(matches!(result, Err(LoggingError::Filter(_))));
}
