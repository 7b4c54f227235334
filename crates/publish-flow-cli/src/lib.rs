// crates/publish-flow-cli/src/lib.rs
// ============================================================================
// Module: Publish Flow CLI Library
// Description: Shared helpers for the publish-flow command-line interface.
// Purpose: Provide reusable components (i18n, logging) for the binary and tests.
// Dependencies: clap, publish-flow-core, tracing-subscriber
// ============================================================================

//! ## Overview
//! This library houses the CLI message catalog and logging setup. The binary
//! entry point (`src/main.rs`) imports these helpers so every user-facing
//! line goes through one catalog and every run logs the same way.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Internationalization helpers and message catalog.
pub mod i18n;
/// Tracing subscriber setup.
pub mod logging;
