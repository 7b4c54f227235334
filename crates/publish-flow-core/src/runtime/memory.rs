// crates/publish-flow-core/src/runtime/memory.rs
// ============================================================================
// Module: Publish Flow In-Memory Registry
// Description: Registry store backed by an ordered in-memory JSON object.
// Purpose: Offline validation and tests without touching the working tree.
// Dependencies: serde_json, crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`InMemoryRegistryStore`] keeps the registry as one ordered JSON object
//! behind a mutex and applies the same upsert rules as the file-backed store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;
use std::sync::PoisonError;

use serde_json::Map;
use serde_json::Value;

use crate::core::RegistryEntry;
use crate::core::RegistryRecord;
use crate::core::VersionChange;
use crate::core::upsert_record;
use crate::interfaces::RegistryError;
use crate::interfaces::RegistryStore;

// ============================================================================
// SECTION: Store
// ============================================================================

/// In-memory registry store.
#[derive(Debug, Default)]
pub struct InMemoryRegistryStore {
    /// Registry document keyed by submission name.
    registry: Mutex<Map<String, Value>>,
}

impl InMemoryRegistryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with `registry`.
    #[must_use]
    pub const fn with_registry(registry: Map<String, Value>) -> Self {
        Self {
            registry: Mutex::new(registry),
        }
    }

    /// Returns a copy of the current registry document.
    #[must_use]
    pub fn snapshot(&self) -> Map<String, Value> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl RegistryStore for InMemoryRegistryStore {
    fn lookup(&self, name: &str) -> Result<Option<RegistryEntry>, RegistryError> {
        let registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        match registry.get(name) {
            None => Ok(None),
            Some(Value::Object(entry)) => Ok(Some(entry.clone())),
            Some(_) => Err(RegistryError::Invalid(format!("entry `{name}` is not an object"))),
        }
    }

    fn update(&self, name: &str, record: &RegistryRecord) -> Result<VersionChange, RegistryError> {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(upsert_record(&mut registry, name, record))
    }
}
