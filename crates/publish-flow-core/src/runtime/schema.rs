// crates/publish-flow-core/src/runtime/schema.rs
// ============================================================================
// Module: Publish Flow Schema Validator
// Description: Declarative per-field schema and its fail-soft validator.
// Purpose: Validate every field independently and collect ordered errors.
// Dependencies: regex, serde_json, thiserror, crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! A [`Schema`] is an ordered list of [`FieldSpec`] values. The
//! [`SchemaValidator`] walks it in declaration order and never stops at the
//! first failure: every field yields either a validated value or one error.
//!
//! ## Invariants
//! - Errors appear in schema declaration order.
//! - A field produces at most one error.
//! - The reachability probe runs before any other rule on its field, and only
//!   when the raw value is text.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::core::ErrorEntry;
use crate::core::ErrorKind;
use crate::core::FieldValidation;
use crate::core::FieldValue;
use crate::core::Locale;
use crate::core::PublishType;
use crate::core::RawFieldMap;
use crate::core::field;
use crate::interfaces::ReachabilityProbe;
use crate::msg;
use crate::runtime::reachability::ReachabilityCache;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum length of a submission name.
pub const NAME_MAX_LENGTH: usize = 50;

/// Pattern every project home page must match.
pub const GITHUB_URL_PATTERN: &str = r"^https?://.*$";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Schema construction errors.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A field pattern failed to compile.
    #[error("invalid pattern for field `{field}`: {source}")]
    Pattern {
        /// Field the pattern belongs to.
        field: &'static str,
        /// Compilation error.
        #[source]
        source: regex::Error,
    },
}

// ============================================================================
// SECTION: Field Specs
// ============================================================================

/// Expected value type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Text value.
    Text,
    /// Boolean value.
    Flag,
}

/// A single validation rule applied after the type check.
#[derive(Debug, Clone)]
pub enum FieldRule {
    /// Probe the URL before anything else and fail when it is unreachable.
    Reachable,
    /// Strip surrounding whitespace.
    Trim,
    /// Limit the number of characters.
    MaxLength(usize),
    /// Require a regular expression match.
    Pattern {
        /// Pattern source reported in error context.
        source: String,
        /// Compiled pattern.
        regex: Regex,
    },
}

/// One declared field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Canonical field name.
    pub name: &'static str,
    /// Expected type.
    pub ty: FieldType,
    /// Rules in application order.
    pub rules: Vec<FieldRule>,
}

impl FieldSpec {
    /// Declares a text field with no rules.
    #[must_use]
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            ty: FieldType::Text,
            rules: Vec::new(),
        }
    }

    /// Declares a boolean field.
    #[must_use]
    pub const fn flag(name: &'static str) -> Self {
        Self {
            name,
            ty: FieldType::Flag,
            rules: Vec::new(),
        }
    }

    /// Appends a rule.
    #[must_use]
    pub fn rule(mut self, rule: FieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Appends a pattern rule.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Pattern`] when `pattern` does not compile.
    pub fn pattern(self, pattern: &str) -> Result<Self, SchemaError> {
        let regex = Regex::new(pattern).map_err(|source| SchemaError::Pattern {
            field: self.name,
            source,
        })?;
        Ok(self.rule(FieldRule::Pattern {
            source: pattern.to_string(),
            regex,
        }))
    }

    /// Returns true when the field is probed for reachability.
    fn is_probed(&self) -> bool {
        self.rules.iter().any(|rule| matches!(rule, FieldRule::Reachable))
    }
}

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Ordered field declarations for one publish type.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Publish type the schema validates.
    publish_type: PublishType,
    /// Fields in declaration order.
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Creates a schema from ordered field specs.
    #[must_use]
    pub const fn new(publish_type: PublishType, fields: Vec<FieldSpec>) -> Self {
        Self {
            publish_type,
            fields,
        }
    }

    /// Returns the plugin submission schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when a built-in pattern fails to compile.
    pub fn plugin() -> Result<Self, SchemaError> {
        Ok(Self::new(
            PublishType::Plugin,
            vec![
                FieldSpec::text(field::NAME).rule(FieldRule::MaxLength(NAME_MAX_LENGTH)),
                FieldSpec::text(field::MODULE),
                FieldSpec::text(field::MODULE_PATH),
                FieldSpec::flag(field::IS_DIR),
                FieldSpec::text(field::AUTHOR),
                FieldSpec::text(field::GITHUB_URL)
                    .rule(FieldRule::Reachable)
                    .rule(FieldRule::Trim)
                    .pattern(GITHUB_URL_PATTERN)?,
                FieldSpec::text(field::DESCRIPTION),
                FieldSpec::text(field::USAGE),
                FieldSpec::text(field::VERSION),
                FieldSpec::text(field::PLUGIN_TYPE),
            ],
        ))
    }

    /// Returns the publish type.
    #[must_use]
    pub const fn publish_type(&self) -> PublishType {
        self.publish_type
    }

    /// Returns the fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }
}

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Collaborators used while validating one submission.
pub struct ValidationContext<'a> {
    /// Message language.
    pub locale: Locale,
    /// URL probe.
    pub probe: &'a dyn ReachabilityProbe,
    /// Probe memo owned by the caller.
    pub cache: &'a mut ReachabilityCache,
}

/// Fail-soft schema validator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl SchemaValidator {
    /// Validates `raw` against `schema`, collecting every field error.
    #[must_use]
    pub fn validate(
        schema: &Schema,
        raw: &RawFieldMap,
        ctx: &mut ValidationContext<'_>,
    ) -> FieldValidation {
        let mut result = FieldValidation::default();
        for spec in schema.fields() {
            match validate_field(spec, raw.get(spec.name), ctx) {
                Ok(value) => {
                    result.data.insert(spec.name.to_string(), value);
                }
                Err(entry) => result.errors.push(*entry),
            }
        }
        result
    }
}

/// Validates one field, returning its JSON value or a single error.
fn validate_field(
    spec: &FieldSpec,
    value: Option<&FieldValue>,
    ctx: &mut ValidationContext<'_>,
) -> Result<Value, Box<ErrorEntry>> {
    let locale = ctx.locale;
    if spec.is_probed()
        && let Some(FieldValue::Text(url)) = value
    {
        let status = ctx.cache.check(ctx.probe, url.trim());
        if !status.is_reachable() {
            return Err(Box::new(
                ErrorEntry::at(spec.name, ErrorKind::GithubUrl, msg!(locale, "error.github_url"))
                    .with_ctx("status_code", status.status_code)
                    .with_ctx("msg", status.message)
                    .with_input(Value::String(url.clone())),
            ));
        }
    }

    let Some(value) = value else {
        return Err(Box::new(ErrorEntry::at(
            spec.name,
            ErrorKind::Missing,
            msg!(locale, "error.missing"),
        )));
    };

    match (spec.ty, value) {
        (FieldType::Flag, FieldValue::Flag(flag)) => Ok(Value::Bool(*flag)),
        (FieldType::Flag, other) => Err(Box::new(
            ErrorEntry::at(spec.name, ErrorKind::BoolType, msg!(locale, "error.bool_type"))
                .with_input(other.to_json()),
        )),
        (FieldType::Text, FieldValue::Text(text)) => {
            apply_text_rules(spec, text, locale).map(Value::String)
        }
        (FieldType::Text, other) => Err(Box::new(
            ErrorEntry::at(spec.name, ErrorKind::StringType, msg!(locale, "error.string_type"))
                .with_input(other.to_json()),
        )),
    }
}

/// Applies trim, length, and pattern rules to a text value.
fn apply_text_rules(
    spec: &FieldSpec,
    text: &str,
    locale: Locale,
) -> Result<String, Box<ErrorEntry>> {
    let mut text = text.to_string();
    for rule in &spec.rules {
        match rule {
            FieldRule::Reachable => {}
            FieldRule::Trim => text = text.trim().to_string(),
            FieldRule::MaxLength(max) => {
                if text.chars().count() > *max {
                    return Err(Box::new(
                        ErrorEntry::at(
                            spec.name,
                            ErrorKind::StringTooLong,
                            msg!(locale, "error.string_too_long", max_length = max),
                        )
                        .with_ctx("max_length", *max)
                        .with_input(Value::String(text)),
                    ));
                }
            }
            FieldRule::Pattern {
                source,
                regex,
            } => {
                if !regex.is_match(&text) {
                    return Err(Box::new(
                        ErrorEntry::at(
                            spec.name,
                            ErrorKind::StringPatternMismatch,
                            msg!(locale, "error.string_pattern_mismatch", pattern = source),
                        )
                        .with_ctx("pattern", source.clone())
                        .with_input(Value::String(text)),
                    ));
                }
            }
        }
    }
    Ok(text)
}
