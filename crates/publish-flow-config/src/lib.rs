// crates/publish-flow-config/src/lib.rs
// ============================================================================
// Module: Publish Flow Config Library
// Description: Canonical config model, workflow-input overrides, and validation.
// Purpose: Single source of truth for publish-flow.toml semantics.
// Dependencies: publish-flow-core, regex, serde, toml, url
// ============================================================================

//! ## Overview
//! `publish-flow-config` defines the run configuration for the publish
//! workflow. A TOML file supplies defaults, the surrounding automation
//! overrides them through environment variables, and the merged result is
//! validated fail-closed before any collaborator is built.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod env;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use env::EnvOverrides;
pub use env::parse_flag;
pub use env::strip_ansi;
