// crates/publish-flow-core/src/runtime/reducer.rs
// ============================================================================
// Module: Publish Flow Report Reducer
// Description: Folds validation results into the final outcome.
// Purpose: Produce the single outcome consumed by reporting and publishing.
// Dependencies: serde_json, crate::core
// ============================================================================

//! ## Overview
//! The reducer never inspects individual rules. It derives `valid` from the
//! error list and picks the display name and author, preferring validated
//! values and falling back to the raw extraction so that even a failed
//! submission can be titled and reported.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

use crate::core::FieldValidation;
use crate::core::PublishType;
use crate::core::RawFieldMap;
use crate::core::ValidationOutcome;
use crate::core::field;

// ============================================================================
// SECTION: Reducer
// ============================================================================

/// Folds a rule-checked validation into a [`ValidationOutcome`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportReducer;

impl ReportReducer {
    /// Builds the outcome for `publish_type`.
    #[must_use]
    pub fn reduce(
        publish_type: PublishType,
        raw: &RawFieldMap,
        validation: FieldValidation,
    ) -> ValidationOutcome {
        let name = validation
            .data
            .get(field::NAME)
            .and_then(Value::as_str)
            .or_else(|| raw.text(field::NAME))
            .unwrap_or_default()
            .to_string();
        let author = validation
            .data
            .get(field::AUTHOR)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        ValidationOutcome {
            valid: validation.errors.is_empty(),
            publish_type,
            name,
            author,
            data: validation.data,
            errors: validation.errors,
        }
    }
}
