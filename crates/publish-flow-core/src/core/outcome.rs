// crates/publish-flow-core/src/core/outcome.rs
// ============================================================================
// Module: Publish Flow Validation Outcome
// Description: Structured validation errors and the combined check verdict.
// Purpose: Provide the single result type shared by reporting and publishing.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Validation produces an ordered list of [`ErrorEntry`] values and the
//! subset of fields that passed, then folds both into a
//! [`ValidationOutcome`]. The outcome is the only input the reporter and the
//! branch reconciler consume.
//!
//! ## Invariants
//! - `valid` is true exactly when `errors` is empty.
//! - `data` is a subset of the schema fields and never contains a field that
//!   also has an error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::core::fields::field;
use crate::core::identifiers::PublishType;

// ============================================================================
// SECTION: Valid Data
// ============================================================================

/// Validated field values in schema declaration order.
pub type ValidData = Map<String, Value>;

// ============================================================================
// SECTION: Error Kinds
// ============================================================================

/// Machine-readable category of a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Required field is absent.
    Missing,
    /// Value is not text.
    StringType,
    /// Value is not a boolean.
    BoolType,
    /// Text exceeds the maximum length.
    StringTooLong,
    /// Text does not match the required pattern.
    StringPatternMismatch,
    /// Project home page is unreachable.
    GithubUrl,
    /// Submission is identical to the registry record.
    PreviousData,
    /// Load-test metadata is unavailable.
    Metadata,
    /// Load test failed.
    PluginTest,
}

impl ErrorKind {
    /// Returns the stable snake case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::StringType => "string_type",
            Self::BoolType => "bool_type",
            Self::StringTooLong => "string_too_long",
            Self::StringPatternMismatch => "string_pattern_mismatch",
            Self::GithubUrl => "github_url",
            Self::PreviousData => "previous_data",
            Self::Metadata => "metadata",
            Self::PluginTest => "plugin_test",
        }
    }

    /// Returns the catalog key for the default message of this kind.
    #[must_use]
    pub fn message_key(self) -> String {
        format!("error.{}", self.as_str())
    }
}

// ============================================================================
// SECTION: Error Entry
// ============================================================================

/// One validation failure.
///
/// # Invariants
/// - `loc` is non-empty; the first element names a field or a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// Location path; the first element is the field or rule name.
    pub loc: Vec<String>,
    /// Rendered human-readable message.
    pub msg: String,
    /// Machine-readable error category.
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    /// Structured context used by reporting.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub ctx: Map<String, Value>,
    /// Offending input when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
}

impl ErrorEntry {
    /// Creates an entry located at a single field or rule name.
    #[must_use]
    pub fn at(location: &str, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            loc: vec![location.to_string()],
            msg: msg.into(),
            kind,
            ctx: Map::new(),
            input: None,
        }
    }

    /// Adds a context value.
    #[must_use]
    pub fn with_ctx(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.ctx.insert(key.to_string(), value.into());
        self
    }

    /// Sets the offending input.
    #[must_use]
    pub fn with_input(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }

    /// Returns the field or rule name this entry is located at.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.loc.first().map(String::as_str)
    }
}

// ============================================================================
// SECTION: Field Validation
// ============================================================================

/// Intermediate result of schema validation and rule application.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldValidation {
    /// Fields that passed validation.
    pub data: ValidData,
    /// Ordered validation errors.
    pub errors: Vec<ErrorEntry>,
}

// ============================================================================
// SECTION: Validation Outcome
// ============================================================================

/// Final verdict for one submission.
///
/// # Invariants
/// - `valid == errors.is_empty()`.
/// - `name` and `author` are always present, possibly empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// True when no errors were found.
    pub valid: bool,
    /// Publish type the submission was validated as.
    pub publish_type: PublishType,
    /// Submission name from validated data or the raw extraction.
    pub name: String,
    /// Submitting account login.
    pub author: String,
    /// Fields that passed validation.
    pub data: ValidData,
    /// Ordered validation errors.
    pub errors: Vec<ErrorEntry>,
}

impl ValidationOutcome {
    /// Returns the issue and pull request title for this outcome.
    #[must_use]
    pub fn title(&self) -> String {
        self.publish_type.title_for(&self.name)
    }

    /// Returns a validated text field.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.data.get(name).and_then(Value::as_str)
    }

    /// Returns the validated project home page.
    #[must_use]
    pub fn github_url(&self) -> Option<&str> {
        self.text(field::GITHUB_URL)
    }

    /// Returns the error located at `name`, if any.
    #[must_use]
    pub fn error_for(&self, name: &str) -> Option<&ErrorEntry> {
        self.errors.iter().find(|entry| entry.field() == Some(name))
    }
}
