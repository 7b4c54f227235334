// crates/publish-flow-core/src/lib.rs
// ============================================================================
// Module: Publish Flow Core
// Description: Plugin publication checks, registry updates, and reporting.
// Purpose: Provide the forge-agnostic engine behind the publish-flow CLI.
// Dependencies: regex, serde, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! Publish Flow turns a structured issue into a registry change. A check
//! extracts fields from the issue body, validates them against the schema
//! for the issue's publish type, applies cross-field rules, and reports the
//! outcome as an issue comment. Valid submissions are written to the
//! registry on a dedicated branch and proposed through a pull request.
//!
//! Invariants:
//! - Validation never short-circuits: every field is checked and every
//!   error is reported in schema order, followed by rule errors.
//! - All side effects go through the traits in [`interfaces`].
//!
//! Security posture: issue bodies and comments are untrusted input and are
//! HTML-escaped before being echoed into reports.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;
pub use crate::interfaces::*;
pub use crate::runtime::*;
