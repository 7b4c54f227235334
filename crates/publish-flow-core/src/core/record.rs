// crates/publish-flow-core/src/core/record.rs
// ============================================================================
// Module: Publish Flow Registry Records
// Description: Registry record layout, load-test context, and version changes.
// Purpose: Define what gets written to the registry and what load tests report.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A [`RegistryRecord`] is the persisted form of a validated plugin. Its
//! field order is fixed and matches the on-disk layout exactly so that
//! rewriting an unchanged record produces an unchanged file.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::core::fields::field;
use crate::core::outcome::ValidData;

// ============================================================================
// SECTION: Registry Entry
// ============================================================================

/// Raw registry entry as stored on disk, keys in file order.
pub type RegistryEntry = Map<String, Value>;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while converting validated data into a registry record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// A required field is absent.
    #[error("registry record field `{0}` is missing")]
    MissingField(String),
    /// A field has the wrong JSON type.
    #[error("registry record field `{0}` has an invalid type")]
    InvalidField(String),
}

// ============================================================================
// SECTION: Registry Record
// ============================================================================

/// Persisted plugin record keyed by plugin name in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryRecord {
    /// Importable module name.
    pub module: String,
    /// Module path inside the project.
    pub module_path: String,
    /// Plugin description.
    pub description: String,
    /// Usage text.
    pub usage: String,
    /// Submitting account login.
    pub author: String,
    /// Published version.
    pub version: String,
    /// Plugin type.
    pub plugin_type: String,
    /// Whether the module path is a directory.
    pub is_dir: bool,
    /// Project home page.
    pub github_url: String,
}

impl RegistryRecord {
    /// Builds a record from validated data.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] when a record field is absent or mistyped.
    pub fn from_data(data: &ValidData) -> Result<Self, RecordError> {
        Ok(Self {
            module: text_field(data, field::MODULE)?,
            module_path: text_field(data, field::MODULE_PATH)?,
            description: text_field(data, field::DESCRIPTION)?,
            usage: text_field(data, field::USAGE)?,
            author: text_field(data, field::AUTHOR)?,
            version: text_field(data, field::VERSION)?,
            plugin_type: text_field(data, field::PLUGIN_TYPE)?,
            is_dir: flag_field(data, field::IS_DIR)?,
            github_url: text_field(data, field::GITHUB_URL)?,
        })
    }

    /// Returns the record as an ordered JSON object in on-disk layout.
    #[must_use]
    pub fn to_entry(&self) -> RegistryEntry {
        let mut entry = Map::new();
        entry.insert(field::MODULE.to_string(), Value::String(self.module.clone()));
        entry.insert(field::MODULE_PATH.to_string(), Value::String(self.module_path.clone()));
        entry.insert(field::DESCRIPTION.to_string(), Value::String(self.description.clone()));
        entry.insert(field::USAGE.to_string(), Value::String(self.usage.clone()));
        entry.insert(field::AUTHOR.to_string(), Value::String(self.author.clone()));
        entry.insert(field::VERSION.to_string(), Value::String(self.version.clone()));
        entry.insert(field::PLUGIN_TYPE.to_string(), Value::String(self.plugin_type.clone()));
        entry.insert(field::IS_DIR.to_string(), Value::Bool(self.is_dir));
        entry.insert(field::GITHUB_URL.to_string(), Value::String(self.github_url.clone()));
        entry
    }
}

/// Reads a required text field.
fn text_field(data: &ValidData, name: &str) -> Result<String, RecordError> {
    match data.get(name) {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(_) => Err(RecordError::InvalidField(name.to_string())),
        None => Err(RecordError::MissingField(name.to_string())),
    }
}

/// Reads a required boolean field.
fn flag_field(data: &ValidData, name: &str) -> Result<bool, RecordError> {
    match data.get(name) {
        Some(Value::Bool(flag)) => Ok(*flag),
        Some(_) => Err(RecordError::InvalidField(name.to_string())),
        None => Err(RecordError::MissingField(name.to_string())),
    }
}

// ============================================================================
// SECTION: Version Change
// ============================================================================

/// Version transition produced by a registry update.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VersionChange {
    /// Previously published version, empty for a first publication.
    pub old: String,
    /// Newly written version.
    pub new: String,
}

impl VersionChange {
    /// Returns true when the record replaced an existing one.
    #[must_use]
    pub fn is_update(&self) -> bool {
        !self.old.is_empty()
    }
}

/// Writes `record` under `name`, keeping the key's position when it exists.
///
/// Returns the transition from the previously stored version to the new one.
pub fn upsert_record(
    registry: &mut Map<String, Value>,
    name: &str,
    record: &RegistryRecord,
) -> VersionChange {
    let old = registry
        .get(name)
        .and_then(|entry| entry.get(field::VERSION))
        .map(|value| value.as_str().map_or_else(|| value.to_string(), str::to_string))
        .unwrap_or_default();
    registry.insert(name.to_string(), Value::Object(record.to_entry()));
    VersionChange {
        old,
        new: record.version.clone(),
    }
}

// ============================================================================
// SECTION: Load Test Context
// ============================================================================

/// Metadata reported by the plugin load test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginTestMetadata {
    /// Plugin description.
    pub description: String,
    /// Usage text.
    pub usage: String,
    /// Plugin type.
    #[serde(alias = "type")]
    pub plugin_type: String,
    /// Plugin version.
    pub version: String,
}

/// Result of the externally executed plugin load test.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoadTestContext {
    /// Whether the load test was deliberately skipped.
    pub skip: bool,
    /// Whether the load test succeeded.
    pub passed: bool,
    /// Captured load-test output with terminal escapes removed.
    pub output: String,
    /// Metadata reported by a successful load.
    pub metadata: Option<PluginTestMetadata>,
}
