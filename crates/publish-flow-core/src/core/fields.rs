// crates/publish-flow-core/src/core/fields.rs
// ============================================================================
// Module: Publish Flow Raw Fields
// Description: Untyped field values extracted from issue bodies and metadata.
// Purpose: Carry extraction results into schema validation without losing absence.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`RawFieldMap`] is the meeting point between extraction and validation.
//! Absent fields are simply not present in the map; validation reports them
//! as `missing` rather than the extractor guessing a default.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Field Names
// ============================================================================

/// Canonical field names shared by the extractor, schema, and registry.
pub mod field {
    /// Submission name (registry key).
    pub const NAME: &str = "name";
    /// Importable module name.
    pub const MODULE: &str = "module";
    /// Module path inside the project.
    pub const MODULE_PATH: &str = "module_path";
    /// Whether the module path is a directory.
    pub const IS_DIR: &str = "is_dir";
    /// Submitting account login.
    pub const AUTHOR: &str = "author";
    /// Project home page.
    pub const GITHUB_URL: &str = "github_url";
    /// Metadata-provided description.
    pub const DESCRIPTION: &str = "description";
    /// Metadata-provided usage text.
    pub const USAGE: &str = "usage";
    /// Metadata-provided version.
    pub const VERSION: &str = "version";
    /// Metadata-provided plugin type.
    pub const PLUGIN_TYPE: &str = "plugin_type";
    /// Raw contents of the configuration fence.
    pub const CONFIG: &str = "config";

    /// Rule location for the duplicate-release check.
    pub const PREVIOUS_DATA: &str = "previous_data";
    /// Rule location for the metadata-presence check.
    pub const METADATA: &str = "metadata";
    /// Rule location for the load-test result check.
    pub const PLUGIN_TEST: &str = "plugin_test";

    /// Fields that only exist when load-test metadata is available.
    pub const METADATA_FIELDS: [&str; 4] = [USAGE, DESCRIPTION, PLUGIN_TYPE, VERSION];
}

// ============================================================================
// SECTION: Field Values
// ============================================================================

/// Untyped value produced by extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Free-form text.
    Text(String),
    /// Boolean flag.
    Flag(bool),
    /// List of text items.
    List(Vec<String>),
}

impl FieldValue {
    /// Returns the text payload when the value is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Flag(_) | Self::List(_) => None,
        }
    }

    /// Converts the value into its JSON form.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Flag(flag) => Value::Bool(*flag),
            Self::List(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

// ============================================================================
// SECTION: Raw Field Map
// ============================================================================

/// Map of raw field values keyed by canonical field name.
///
/// # Invariants
/// - A field that was not found is absent from the map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawFieldMap {
    /// Values keyed by field name.
    fields: BTreeMap<String, FieldValue>,
}

impl RawFieldMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a field value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Inserts a field when a value is present, leaving it absent otherwise.
    pub fn insert_opt(&mut self, name: impl Into<String>, value: Option<FieldValue>) {
        if let Some(value) = value {
            self.fields.insert(name.into(), value);
        }
    }

    /// Returns the value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Returns the text value for `name` when it is text.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_text)
    }

    /// Returns true when `name` is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterates over present fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Returns the number of present fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true when no field is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
