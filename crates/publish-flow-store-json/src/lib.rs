// crates/publish-flow-store-json/src/lib.rs
// ============================================================================
// Module: Publish Flow JSON Registry Store
// Description: File-backed registry store for the publish workflow.
// Purpose: Read and rewrite the JSON registry in the working tree.
// Dependencies: publish-flow-core, serde, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! The registry is a single JSON object mapping submission names to records.
//! [`JsonRegistryStore`] re-reads the file on every call because the
//! workflow switches branches between lookups.
//!
//! Security posture: registry contents are untrusted and size-limited.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::DEFAULT_MAX_REGISTRY_BYTES;
pub use store::JsonRegistryConfig;
pub use store::JsonRegistryError;
pub use store::JsonRegistryStore;
