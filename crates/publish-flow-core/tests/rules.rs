// crates/publish-flow-core/tests/rules.rs
// ============================================================================
// Module: Plugin Rule Tests
// Description: Duplicate detection, metadata gating, and load-test rules.
// Purpose: Ensure cross-field rules append errors after schema errors.
// Dependencies: publish-flow-core, serde_json
// ============================================================================

//! Plugin rule engine behavior tests.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test setup uses unwrap for clarity."
)]

mod common;

use publish_flow_core::ErrorEntry;
use publish_flow_core::ErrorKind;
use publish_flow_core::FieldValidation;
use publish_flow_core::LoadTestContext;
use publish_flow_core::Locale;
use publish_flow_core::PluginRuleEngine;
use publish_flow_core::PublishRules;
use publish_flow_core::RegistryEntry;
use publish_flow_core::RuleContext;
use publish_flow_core::field;
use serde_json::Value;
use serde_json::json;

use crate::common::demo_entry;
use crate::common::failed_load_test;
use crate::common::passed_load_test;

/// Validated data equal to the demo registry entry plus name.
fn demo_validation(version: &str) -> FieldValidation {
    let mut data = demo_entry(version);
    data.insert(field::NAME.to_string(), json!("demo"));
    FieldValidation {
        data,
        errors: Vec::new(),
    }
}

fn apply(
    previous: Option<&RegistryEntry>,
    load_test: &LoadTestContext,
    validation: FieldValidation,
) -> FieldValidation {
    let ctx = RuleContext {
        previous,
        load_test,
        locale: Locale::En,
    };
    PluginRuleEngine.apply(&ctx, validation)
}

fn kinds(validation: &FieldValidation) -> Vec<ErrorKind> {
    validation.errors.iter().map(|entry| entry.kind).collect()
}

#[test]
fn passing_load_test_adds_no_errors() {
    let result = apply(None, &passed_load_test("0.1.0"), demo_validation("0.1.0"));

    assert!(result.errors.is_empty());
    assert_eq!(result.data.get(field::VERSION), Some(&json!("0.1.0")));
}

#[test]
fn identical_resubmission_is_a_duplicate() {
    let previous = demo_entry("0.1.0");

    let result = apply(Some(&previous), &passed_load_test("0.1.0"), demo_validation("0.1.0"));

    assert_eq!(kinds(&result), vec![ErrorKind::PreviousData]);
    let entry = &result.errors[0];
    assert_eq!(entry.ctx.get("previous_data"), Some(&Value::Object(previous)));
    assert!(entry.ctx.contains_key("data"));
}

#[test]
fn version_bump_is_not_a_duplicate() {
    let previous = demo_entry("0.1.0");

    let result = apply(Some(&previous), &passed_load_test("0.2.0"), demo_validation("0.2.0"));

    assert!(result.errors.is_empty());
}

#[test]
fn missing_data_key_is_not_a_duplicate() {
    let previous = demo_entry("0.1.0");
    let mut validation = demo_validation("0.1.0");
    validation.data.shift_remove(field::MODULE);

    let result = apply(Some(&previous), &passed_load_test("0.1.0"), validation);

    assert!(result.errors.is_empty());
}

#[test]
fn missing_metadata_replaces_metadata_field_errors() {
    let mut validation = demo_validation("0.1.0");
    for name in field::METADATA_FIELDS {
        validation.data.shift_remove(name);
    }
    validation.errors.push(ErrorEntry::at(field::MODULE, ErrorKind::Missing, "Field required"));
    for name in field::METADATA_FIELDS {
        validation.errors.push(ErrorEntry::at(name, ErrorKind::Missing, "Field required"));
    }

    let result = apply(None, &failed_load_test("ImportError"), validation);

    assert_eq!(
        kinds(&result),
        vec![ErrorKind::Missing, ErrorKind::Metadata, ErrorKind::PluginTest]
    );
    assert_eq!(result.errors[0].field(), Some(field::MODULE));
    assert_eq!(result.errors[1].ctx.get("plugin_test_result"), Some(&json!(false)));
    assert_eq!(result.errors[2].ctx.get("output"), Some(&json!("ImportError")));
    for name in field::METADATA_FIELDS {
        assert!(!result.data.contains_key(name));
    }
}

#[test]
fn passed_test_without_metadata_only_reports_metadata() {
    let load_test = LoadTestContext {
        skip: false,
        passed: true,
        output: String::new(),
        metadata: None,
    };

    let result = apply(None, &load_test, demo_validation("0.1.0"));

    assert_eq!(kinds(&result), vec![ErrorKind::Metadata]);
    assert_eq!(result.errors[0].ctx.get("plugin_test_result"), Some(&json!(true)));
    assert!(!result.data.contains_key(field::USAGE));
    assert!(result.data.contains_key(field::MODULE));
}

#[test]
fn skipped_test_bypasses_metadata_and_load_rules() {
    let load_test = LoadTestContext {
        skip: true,
        ..LoadTestContext::default()
    };
    let mut validation = demo_validation("0.1.0");
    validation.errors.push(ErrorEntry::at(field::USAGE, ErrorKind::Missing, "Field required"));

    let result = apply(None, &load_test, validation);

    assert_eq!(kinds(&result), vec![ErrorKind::Missing]);
    assert!(result.data.contains_key(field::DESCRIPTION));
}

#[test]
fn rule_errors_follow_in_fixed_order() {
    let previous = demo_entry("0.1.0");
    let load_test = LoadTestContext {
        skip: false,
        passed: false,
        output: "boom".to_string(),
        metadata: None,
    };

    let result = apply(Some(&previous), &load_test, demo_validation("0.1.0"));

    assert_eq!(
        kinds(&result),
        vec![ErrorKind::PreviousData, ErrorKind::Metadata, ErrorKind::PluginTest]
    );
}
