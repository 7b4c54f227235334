// crates/publish-flow-core/tests/schema.rs
// ============================================================================
// Module: Schema Validator Tests
// Description: Field typing, rules, reachability probing, and error order.
// Purpose: Ensure validation is fail-soft and reports errors in schema order.
// Dependencies: publish-flow-core, serde_json
// ============================================================================

//! Schema validator behavior tests.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test setup uses unwrap for clarity."
)]

mod common;

use publish_flow_core::ErrorKind;
use publish_flow_core::FieldValue;
use publish_flow_core::Locale;
use publish_flow_core::ProbeStatus;
use publish_flow_core::RawFieldMap;
use publish_flow_core::ReachabilityCache;
use publish_flow_core::Schema;
use publish_flow_core::SchemaValidator;
use publish_flow_core::ValidationContext;
use publish_flow_core::field;
use publish_flow_core::translate;
use serde_json::Value;
use serde_json::json;

use crate::common::HOME_PAGE;
use crate::common::StaticProbe;

fn complete_raw() -> RawFieldMap {
    let mut raw = RawFieldMap::new();
    raw.insert(field::NAME, "demo");
    raw.insert(field::MODULE, "nonebot_plugin_demo");
    raw.insert(field::MODULE_PATH, "src/plugins/demo");
    raw.insert(field::IS_DIR, false);
    raw.insert(field::AUTHOR, "author");
    raw.insert(field::GITHUB_URL, HOME_PAGE);
    raw.insert(field::DESCRIPTION, "A demo plugin");
    raw.insert(field::USAGE, "/demo");
    raw.insert(field::VERSION, "0.1.0");
    raw.insert(field::PLUGIN_TYPE, "NORMAL");
    raw
}

fn validate(raw: &RawFieldMap, probe: &StaticProbe) -> publish_flow_core::FieldValidation {
    let schema = Schema::plugin().unwrap();
    let mut cache = ReachabilityCache::new();
    let mut ctx = ValidationContext {
        locale: Locale::En,
        probe,
        cache: &mut cache,
    };
    SchemaValidator::validate(&schema, raw, &mut ctx)
}

#[test]
fn complete_submission_validates_in_schema_order() {
    let result = validate(&complete_raw(), &StaticProbe::new());

    assert!(result.errors.is_empty());
    let keys: Vec<&str> = result.data.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "name",
            "module",
            "module_path",
            "is_dir",
            "author",
            "github_url",
            "description",
            "usage",
            "version",
            "plugin_type",
        ]
    );
    assert_eq!(result.data.get(field::IS_DIR), Some(&Value::Bool(false)));
}

#[test]
fn every_missing_field_is_reported() {
    let result = validate(&RawFieldMap::new(), &StaticProbe::new());

    assert!(result.data.is_empty());
    assert_eq!(result.errors.len(), 10);
    assert!(result.errors.iter().all(|entry| entry.kind == ErrorKind::Missing));
    assert_eq!(result.errors[0].field(), Some(field::NAME));
    assert_eq!(result.errors[9].field(), Some(field::PLUGIN_TYPE));
}

#[test]
fn valid_fields_survive_next_to_invalid_ones() {
    let mut raw = complete_raw();
    raw.insert(field::NAME, "o".repeat(60));

    let result = validate(&raw, &StaticProbe::new());

    assert_eq!(result.errors.len(), 1);
    let entry = &result.errors[0];
    assert_eq!(entry.kind, ErrorKind::StringTooLong);
    assert_eq!(entry.ctx.get("max_length"), Some(&json!(50)));
    assert!(!result.data.contains_key(field::NAME));
    assert_eq!(result.data.len(), 9);
}

#[test]
fn name_at_the_limit_is_accepted() {
    let mut raw = complete_raw();
    raw.insert(field::NAME, "名".repeat(50));

    let result = validate(&raw, &StaticProbe::new());

    assert!(result.errors.is_empty());
}

#[test]
fn unreachable_home_page_reports_status_code() {
    let probe = StaticProbe::new().with_status(HOME_PAGE, ProbeStatus::http(404, "Not Found"));

    let result = validate(&complete_raw(), &probe);

    assert_eq!(result.errors.len(), 1);
    let entry = &result.errors[0];
    assert_eq!(entry.kind, ErrorKind::GithubUrl);
    assert_eq!(entry.loc, vec!["github_url".to_string()]);
    assert_eq!(entry.ctx.get("status_code"), Some(&json!(404)));
    assert_eq!(entry.input, Some(Value::String(HOME_PAGE.to_string())));
    assert!(!result.data.contains_key(field::GITHUB_URL));
}

#[test]
fn network_failure_reports_negative_status() {
    let probe =
        StaticProbe::new().with_status(HOME_PAGE, ProbeStatus::network_error("connection refused"));

    let result = validate(&complete_raw(), &probe);

    assert_eq!(result.errors[0].ctx.get("status_code"), Some(&json!(-1)));
    assert_eq!(result.errors[0].ctx.get("msg"), Some(&json!("connection refused")));
    assert_eq!(result.errors[0].msg, "Project home page is unreachable");
}

#[test]
fn http_failure_keeps_status_reason_in_context() {
    let probe = StaticProbe::new().with_status(HOME_PAGE, ProbeStatus::http(404, "Not Found"));

    let result = validate(&complete_raw(), &probe);

    assert_eq!(result.errors[0].ctx.get("status_code"), Some(&json!(404)));
    assert_eq!(result.errors[0].ctx.get("msg"), Some(&json!("Not Found")));
}

#[test]
fn home_page_is_trimmed_and_probed_trimmed() {
    let mut raw = complete_raw();
    raw.insert(field::GITHUB_URL, format!("  {HOME_PAGE}  "));
    let probe = StaticProbe::new();

    let result = validate(&raw, &probe);

    assert!(result.errors.is_empty());
    assert_eq!(result.data.get(field::GITHUB_URL), Some(&json!(HOME_PAGE)));
    assert_eq!(probe.calls(), vec![HOME_PAGE.to_string()]);
}

#[test]
fn home_page_must_be_http() {
    let mut raw = complete_raw();
    raw.insert(field::GITHUB_URL, "ftp://example.com/demo");

    let result = validate(&raw, &StaticProbe::new());

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind, ErrorKind::StringPatternMismatch);
    assert_eq!(result.errors[0].ctx.get("pattern"), Some(&json!("^https?://.*$")));
}

#[test]
fn wrong_types_are_reported_with_input() {
    let mut raw = complete_raw();
    raw.insert(field::IS_DIR, "否");
    raw.insert(field::MODULE, FieldValue::Flag(true));

    let result = validate(&raw, &StaticProbe::new());

    let kinds: Vec<ErrorKind> = result.errors.iter().map(|entry| entry.kind).collect();
    assert_eq!(kinds, vec![ErrorKind::StringType, ErrorKind::BoolType]);
    assert_eq!(result.errors[1].input, Some(json!("否")));
}

#[test]
fn reachability_is_probed_once_per_url() {
    let probe = StaticProbe::new();
    let schema = Schema::plugin().unwrap();
    let mut cache = ReachabilityCache::new();
    let raw = complete_raw();

    for _ in 0 .. 3 {
        let mut ctx = ValidationContext {
            locale: Locale::En,
            probe: &probe,
            cache: &mut cache,
        };
        let _ = SchemaValidator::validate(&schema, &raw, &mut ctx);
    }

    assert_eq!(probe.calls().len(), 1);
    assert_eq!(cache.len(), 1);
    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn messages_follow_the_locale() {
    let schema = Schema::plugin().unwrap();
    let probe = StaticProbe::new();
    let mut cache = ReachabilityCache::new();
    let mut zh = ValidationContext {
        locale: Locale::Zh,
        probe: &probe,
        cache: &mut cache,
    };
    let zh_result = SchemaValidator::validate(&schema, &RawFieldMap::new(), &mut zh);
    let en_result = validate(&RawFieldMap::new(), &probe);

    assert_ne!(zh_result.errors[0].msg, en_result.errors[0].msg);
    assert_eq!(zh_result.errors[0].kind, en_result.errors[0].kind);
}

#[test]
fn error_kinds_are_limited_to_categories_validation_emits() {
    let bool_type: ErrorKind = serde_json::from_value(json!("bool_type")).unwrap();

    assert_eq!(bool_type, ErrorKind::BoolType);
    assert!(serde_json::from_value::<ErrorKind>(json!("list_type")).is_err());
    assert_eq!(translate(Locale::En, "error.list_type", &[]), "error.list_type");
    assert_eq!(
        translate(Locale::En, &ErrorKind::BoolType.message_key(), &[]),
        "Input should be a valid boolean"
    );
}
