// crates/publish-flow-core/src/runtime/reachability.rs
// ============================================================================
// Module: Publish Flow Reachability Cache
// Description: Per-invocation memoization of URL probe results.
// Purpose: Probe each project home page at most once per validation run.
// Dependencies: crate::interfaces, tracing
// ============================================================================

//! ## Overview
//! The cache is an explicit value owned by whoever drives validation. It
//! lives exactly as long as the caller keeps it and can be cleared at any
//! time; there is no process-wide memo table.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;

use tracing::debug;

use crate::interfaces::ProbeStatus;
use crate::interfaces::ReachabilityProbe;

// ============================================================================
// SECTION: Cache
// ============================================================================

/// Memoized probe results keyed by the full URL string.
///
/// # Invariants
/// - A URL is probed at most once between calls to [`ReachabilityCache::clear`].
/// - Network failures are cached like any other status.
#[derive(Debug, Clone, Default)]
pub struct ReachabilityCache {
    /// Probe results by URL.
    entries: HashMap<String, ProbeStatus>,
}

impl ReachabilityCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached status for `url`, probing on first use.
    pub fn check(&mut self, probe: &dyn ReachabilityProbe, url: &str) -> ProbeStatus {
        if let Some(status) = self.entries.get(url) {
            debug!(url, status_code = status.status_code, "reachability cache hit");
            return status.clone();
        }
        let status = probe.probe(url);
        debug!(url, status_code = status.status_code, message = %status.message, "probed url");
        self.entries.insert(url.to_string(), status.clone());
        status
    }

    /// Drops every cached result.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the number of cached URLs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
