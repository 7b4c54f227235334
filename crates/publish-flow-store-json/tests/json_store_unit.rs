// crates/publish-flow-store-json/tests/json_store_unit.rs
// ============================================================================
// Module: JSON Registry Store Unit Tests
// Description: Lookup, upsert, formatting, and limits of the JSON registry.
// Purpose: Ensure registry rewrites are stable and bounded.
// ============================================================================

//! ## Overview
//! Unit-level tests for the JSON registry store:
//! - Version transitions on insert and update
//! - Key order and byte-stable formatting
//! - Size limits, missing files, and malformed content

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::fs;
use std::path::Path;

use publish_flow_core::RegistryError;
use publish_flow_core::RegistryRecord;
use publish_flow_core::RegistryStore;
use publish_flow_store_json::JsonRegistryConfig;
use publish_flow_store_json::JsonRegistryError;
use publish_flow_store_json::JsonRegistryStore;
use tempfile::TempDir;

fn record(version: &str) -> RegistryRecord {
    RegistryRecord {
        module: "nonebot_plugin_demo".to_string(),
        module_path: "src/plugins/demo".to_string(),
        description: "演示插件".to_string(),
        usage: "/demo".to_string(),
        author: "author".to_string(),
        version: version.to_string(),
        plugin_type: "NORMAL".to_string(),
        is_dir: false,
        github_url: "https://github.com/author/nonebot-plugin-demo".to_string(),
    }
}

fn store_with(dir: &TempDir, content: &str) -> JsonRegistryStore {
    let path = dir.path().join("plugins.json");
    fs::write(&path, content).unwrap();
    JsonRegistryStore::new(JsonRegistryConfig::new(path)).unwrap()
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn first_publication_has_empty_old_version() {
    let dir = TempDir::new().unwrap();
    let store = store_with(&dir, "{}\n");

    let change = store.update("demo", &record("0.1.0")).unwrap();

    assert_eq!(change.old, "");
    assert_eq!(change.new, "0.1.0");
    assert!(!change.is_update());
    assert_eq!(store.previous_version("demo").unwrap(), "0.1.0");
}

#[test]
fn update_reports_old_version_and_keeps_position() {
    let dir = TempDir::new().unwrap();
    let store = store_with(&dir, r#"{"alpha": {"version": "1"}, "demo": {"version": "0.1"}, "omega": {"version": 2}}"#);

    let change = store.update("demo", &record("0.2")).unwrap();
    store.update("zeta", &record("1.0")).unwrap();

    assert_eq!(change.old, "0.1");
    assert_eq!(change.new, "0.2");
    let keys: Vec<String> = store.read_document().unwrap().keys().cloned().collect();
    assert_eq!(keys, vec!["alpha", "demo", "omega", "zeta"]);
    assert_eq!(store.previous_version("omega").unwrap(), "2");
}

#[test]
fn file_is_pretty_printed_with_unescaped_text() {
    let dir = TempDir::new().unwrap();
    let store = store_with(&dir, "{}");

    store.update("demo", &record("0.1.0")).unwrap();
    let text = read(store.path());

    assert!(text.starts_with("{\n  \"demo\": {\n    \"module\": \"nonebot_plugin_demo\","));
    assert!(text.contains("演示插件"));
    assert!(text.ends_with("}\n"));
}

#[test]
fn rewriting_the_same_record_is_byte_stable() {
    let dir = TempDir::new().unwrap();
    let store = store_with(&dir, "{}");
    store.update("demo", &record("0.1.0")).unwrap();
    let first = read(store.path());

    store.update("demo", &record("0.1.0")).unwrap();

    assert_eq!(read(store.path()), first);
}

#[test]
fn lookup_returns_raw_entry() {
    let dir = TempDir::new().unwrap();
    let store = store_with(&dir, r#"{"demo": {"version": "0.1", "extra": true}}"#);

    let entry = store.lookup("demo").unwrap().unwrap();

    assert_eq!(entry.get("extra"), Some(&serde_json::Value::Bool(true)));
    assert_eq!(store.lookup("missing").unwrap(), None);
}

#[test]
fn oversized_registry_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plugins.json");
    fs::write(&path, "{}            ").unwrap();
    let config = JsonRegistryConfig {
        path,
        max_bytes: 4,
    };
    let store = JsonRegistryStore::new(config).unwrap();

    let err = store.lookup("demo").unwrap_err();

    assert_eq!(
        err,
        RegistryError::TooLarge {
            max_bytes: 4,
            actual_bytes: 14,
        }
    );
}

#[test]
fn malformed_and_non_object_registries_fail() {
    let dir = TempDir::new().unwrap();
    let broken = store_with(&dir, "{");
    assert!(matches!(broken.lookup("demo"), Err(RegistryError::Parse(_))));

    let array = store_with(&dir, "[]");
    assert!(matches!(array.lookup("demo"), Err(RegistryError::Invalid(_))));

    let scalar_entry = store_with(&dir, r#"{"demo": 1}"#);
    assert!(matches!(scalar_entry.lookup("demo"), Err(RegistryError::Invalid(_))));
}

#[test]
fn missing_registry_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let store = JsonRegistryStore::new(JsonRegistryConfig::new(dir.path().join("absent.json"))).unwrap();

    assert!(matches!(store.lookup("demo"), Err(RegistryError::Io(_))));
}

#[test]
fn directory_paths_and_zero_limits_are_rejected() {
    let dir = TempDir::new().unwrap();

    let directory = JsonRegistryStore::new(JsonRegistryConfig::new(dir.path()));
    let zero = JsonRegistryStore::new(JsonRegistryConfig {
        path: dir.path().join("plugins.json"),
        max_bytes: 0,
    });

    assert!(matches!(directory, Err(JsonRegistryError::Invalid(_))));
    assert!(matches!(zero, Err(JsonRegistryError::Invalid(_))));
}
