// crates/publish-flow-store-json/src/store.rs
// ============================================================================
// Module: JSON Registry Store
// Description: RegistryStore over a pretty-printed JSON object file.
// Purpose: Look up and upsert registry records with stable key order.
// Dependencies: publish-flow-core, serde, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! The store reads the registry file, applies the change in memory, and
//! writes the whole document back as two-space indented JSON with a trailing
//! newline. Non-ASCII text is written unescaped so diffs stay readable.
//!
//! ## Invariants
//! - Rewriting an unchanged record produces a byte-identical file.
//! - Existing names keep their position; new names are appended.
//! - Files larger than the configured limit are rejected before parsing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use publish_flow_core::RegistryEntry;
use publish_flow_core::RegistryError;
use publish_flow_core::RegistryRecord;
use publish_flow_core::RegistryStore;
use publish_flow_core::VersionChange;
use publish_flow_core::upsert_record;
use serde::Deserialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default maximum registry file size.
pub const DEFAULT_MAX_REGISTRY_BYTES: usize = 16 * 1024 * 1024;
/// Maximum path component length.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Configuration for [`JsonRegistryStore`].
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `max_bytes` must be greater than zero.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JsonRegistryConfig {
    /// Path to the registry file.
    pub path: PathBuf,
    /// Maximum accepted file size in bytes.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

impl JsonRegistryConfig {
    /// Creates a config for `path` with the default size limit.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_bytes: DEFAULT_MAX_REGISTRY_BYTES,
        }
    }
}

/// Returns the default maximum registry size.
const fn default_max_bytes() -> usize {
    DEFAULT_MAX_REGISTRY_BYTES
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// JSON registry store errors.
///
/// # Invariants
/// - Error messages never embed registry contents.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JsonRegistryError {
    /// Filesystem error.
    #[error("json registry io error: {0}")]
    Io(String),
    /// The file is not valid JSON.
    #[error("json registry parse error: {0}")]
    Parse(String),
    /// The file or config has an unexpected shape.
    #[error("json registry invalid: {0}")]
    Invalid(String),
    /// The file exceeds the size limit.
    #[error("json registry too large: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual file size in bytes.
        actual_bytes: usize,
    },
}

impl From<JsonRegistryError> for RegistryError {
    fn from(error: JsonRegistryError) -> Self {
        match error {
            JsonRegistryError::Io(message) => Self::Io(message),
            JsonRegistryError::Parse(message) => Self::Parse(message),
            JsonRegistryError::Invalid(message) => Self::Invalid(message),
            JsonRegistryError::TooLarge {
                max_bytes,
                actual_bytes,
            } => Self::TooLarge {
                max_bytes,
                actual_bytes,
            },
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// File-backed registry store.
#[derive(Debug, Clone)]
pub struct JsonRegistryStore {
    /// Store configuration.
    config: JsonRegistryConfig,
}

impl JsonRegistryStore {
    /// Creates a store after validating its configuration.
    ///
    /// The file itself is not read until the first lookup.
    ///
    /// # Errors
    ///
    /// Returns [`JsonRegistryError::Invalid`] when the path or limit is invalid.
    pub fn new(config: JsonRegistryConfig) -> Result<Self, JsonRegistryError> {
        validate_registry_path(&config.path)?;
        if config.max_bytes == 0 {
            return Err(JsonRegistryError::Invalid("max_bytes must be greater than zero".to_string()));
        }
        Ok(Self {
            config,
        })
    }

    /// Returns the registry file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Reads and parses the whole registry document.
    ///
    /// # Errors
    ///
    /// Returns [`JsonRegistryError`] when the file is missing, oversized,
    /// unparseable, or not a JSON object.
    pub fn read_document(&self) -> Result<Map<String, Value>, JsonRegistryError> {
        let bytes = fs::read(&self.config.path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => {
                JsonRegistryError::Io(format!("registry file not found: {}", self.config.path.display()))
            }
            _ => JsonRegistryError::Io(err.to_string()),
        })?;
        if bytes.len() > self.config.max_bytes {
            return Err(JsonRegistryError::TooLarge {
                max_bytes: self.config.max_bytes,
                actual_bytes: bytes.len(),
            });
        }
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(document)) => Ok(document),
            Ok(_) => Err(JsonRegistryError::Invalid("registry root must be an object".to_string())),
            Err(err) => Err(JsonRegistryError::Parse(err.to_string())),
        }
    }

    /// Writes the whole registry document.
    ///
    /// # Errors
    ///
    /// Returns [`JsonRegistryError`] when serialization or the write fails.
    pub fn write_document(&self, document: &Map<String, Value>) -> Result<(), JsonRegistryError> {
        let mut text = serde_json::to_string_pretty(document)
            .map_err(|err| JsonRegistryError::Invalid(err.to_string()))?;
        text.push('\n');
        fs::write(&self.config.path, text).map_err(|err| JsonRegistryError::Io(err.to_string()))
    }
}

impl RegistryStore for JsonRegistryStore {
    fn lookup(&self, name: &str) -> Result<Option<RegistryEntry>, RegistryError> {
        let document = self.read_document()?;
        match document.get(name) {
            None => Ok(None),
            Some(Value::Object(entry)) => Ok(Some(entry.clone())),
            Some(_) => Err(RegistryError::Invalid(format!("entry `{name}` is not an object"))),
        }
    }

    fn update(&self, name: &str, record: &RegistryRecord) -> Result<VersionChange, RegistryError> {
        let mut document = self.read_document()?;
        let change = upsert_record(&mut document, name, record);
        self.write_document(&document)?;
        debug!(path = %self.config.path.display(), name, old = %change.old, new = %change.new, "registry written");
        Ok(change)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates the registry path shape.
fn validate_registry_path(path: &Path) -> Result<(), JsonRegistryError> {
    if path.as_os_str().is_empty() {
        return Err(JsonRegistryError::Invalid("registry path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(JsonRegistryError::Invalid("registry path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(JsonRegistryError::Invalid(
                "registry path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(JsonRegistryError::Invalid(
            "registry path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}
