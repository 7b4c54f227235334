// crates/publish-flow-core/src/runtime/rules.rs
// ============================================================================
// Module: Publish Flow Rule Engine
// Description: Cross-field rules applied after schema validation.
// Purpose: Detect duplicates and gate on load-test results for plugins.
// Dependencies: serde_json, crate::core
// ============================================================================

//! ## Overview
//! Rules see the schema result and external context (the previous registry
//! entry and the load-test outcome) and may append errors or drop data.
//! Rule errors always follow schema errors.
//!
//! Plugin rules run in a fixed order:
//! 1. Duplicate check against the previous registry entry.
//! 2. Metadata gating: without load-test metadata the metadata-derived fields
//!    are dropped along with their errors and a single `metadata` error is
//!    reported instead.
//! 3. Load-test result.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

use crate::core::ErrorEntry;
use crate::core::ErrorKind;
use crate::core::FieldValidation;
use crate::core::LoadTestContext;
use crate::core::Locale;
use crate::core::RegistryEntry;
use crate::core::field;
use crate::msg;

// ============================================================================
// SECTION: Context
// ============================================================================

/// External inputs available to rules.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Registry entry currently published under the submitted name.
    pub previous: Option<&'a RegistryEntry>,
    /// Load-test outcome.
    pub load_test: &'a LoadTestContext,
    /// Message language.
    pub locale: Locale,
}

// ============================================================================
// SECTION: Rule Engine
// ============================================================================

/// Cross-field rules for one publish type.
pub trait PublishRules {
    /// Applies rules to a schema result.
    fn apply(&self, ctx: &RuleContext<'_>, validation: FieldValidation) -> FieldValidation;
}

/// Rules for plugin submissions.
#[derive(Debug, Clone, Copy, Default)]
pub struct PluginRuleEngine;

impl PublishRules for PluginRuleEngine {
    fn apply(&self, ctx: &RuleContext<'_>, mut validation: FieldValidation) -> FieldValidation {
        if let Some(previous) = ctx.previous
            && matches_previous(previous, &validation)
        {
            validation.errors.push(
                ErrorEntry::at(
                    field::PREVIOUS_DATA,
                    ErrorKind::PreviousData,
                    msg!(ctx.locale, "error.previous_data"),
                )
                .with_ctx("previous_data", Value::Object(previous.clone()))
                .with_ctx("data", Value::Object(validation.data.clone())),
            );
        }

        if ctx.load_test.metadata.is_none() && !ctx.load_test.skip {
            validation.errors.push(
                ErrorEntry::at(
                    field::METADATA,
                    ErrorKind::Metadata,
                    msg!(ctx.locale, "error.metadata"),
                )
                .with_ctx("plugin_test_result", ctx.load_test.passed),
            );
            validation.errors.retain(|entry| {
                !entry.field().is_some_and(|name| field::METADATA_FIELDS.contains(&name))
            });
            for name in field::METADATA_FIELDS {
                validation.data.shift_remove(name);
            }
        }

        if !ctx.load_test.skip && !ctx.load_test.passed {
            validation.errors.push(
                ErrorEntry::at(
                    field::PLUGIN_TEST,
                    ErrorKind::PluginTest,
                    msg!(ctx.locale, "error.plugin_test"),
                )
                .with_ctx("output", ctx.load_test.output.clone()),
            );
        }

        validation
    }
}

/// Returns true when every previous key holds an equal value in the data.
///
/// A key missing from the data counts as a difference.
fn matches_previous(previous: &RegistryEntry, validation: &FieldValidation) -> bool {
    previous.iter().all(|(key, value)| validation.data.get(key) == Some(value))
}
