// crates/publish-flow-config/src/env.rs
// ============================================================================
// Module: Workflow Input Overrides
// Description: Environment variables supplied by the surrounding automation.
// Purpose: Fold load-test results and repository coordinates into the config.
// Dependencies: regex, serde_json, publish-flow-core
// ============================================================================

//! ## Overview
//! The automation that runs the load test passes its results through
//! environment variables. Unset load-test steps produce empty strings, so an
//! empty value always means "absent" rather than an error.
//!
//! Lookups go through a closure so tests never touch the process environment.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::LazyLock;

use publish_flow_core::PluginTestMetadata;
use publish_flow_core::RepoRef;
use regex::Regex;

use crate::config::ConfigError;
use crate::config::PublishFlowConfig;

// ============================================================================
// SECTION: Variable Names
// ============================================================================

/// Load-test success flag.
pub const PLUGIN_TEST_RESULT_VAR: &str = "PLUGIN_TEST_RESULT";
/// Load-test console output.
pub const PLUGIN_TEST_OUTPUT_VAR: &str = "PLUGIN_TEST_OUTPUT";
/// Load-test metadata as a JSON object.
pub const PLUGIN_TEST_METADATA_VAR: &str = "PLUGIN_TEST_METADATA";
/// Explicit load-test skip flag.
pub const SKIP_PLUGIN_TEST_VAR: &str = "SKIP_PLUGIN_TEST";
/// Repository slug in `owner/name` form.
pub const GITHUB_REPOSITORY_VAR: &str = "GITHUB_REPOSITORY";
/// Identifier of the current automation run.
pub const GITHUB_RUN_ID_VAR: &str = "GITHUB_RUN_ID";
/// Base branch override.
pub const BASE_VAR: &str = "PUBLISH_FLOW_BASE";
/// Registry path override.
pub const REGISTRY_PATH_VAR: &str = "PUBLISH_FLOW_REGISTRY_PATH";

/// Matches ANSI CSI sequences and two-byte escapes.
const ANSI_PATTERN: &str = r"\x1B(?:[@-Z\\-_]|\[[0-?]*[ -/]*[@-~])";

/// Compiled ANSI pattern; `None` only if the constant pattern fails to build.
static ANSI_REGEX: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(ANSI_PATTERN).ok());

// ============================================================================
// SECTION: Overrides
// ============================================================================

/// Applies workflow-input variables on top of a loaded config.
pub struct EnvOverrides<F> {
    /// Variable lookup, typically `std::env::var(..).ok()`.
    lookup: F,
}

impl<F> EnvOverrides<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Creates overrides backed by `lookup`.
    pub const fn new(lookup: F) -> Self {
        Self {
            lookup,
        }
    }

    /// Applies every variable that is set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a flag, slug, or metadata value is malformed.
    pub fn apply(&self, config: &mut PublishFlowConfig) -> Result<(), ConfigError> {
        if let Some(value) = self.get(PLUGIN_TEST_RESULT_VAR) {
            config.plugin_test.result = parse_flag(PLUGIN_TEST_RESULT_VAR, &value)?;
        }
        if let Some(value) = self.get(SKIP_PLUGIN_TEST_VAR) {
            config.plugin_test.skip = parse_flag(SKIP_PLUGIN_TEST_VAR, &value)?;
        }
        if let Some(value) = self.get(PLUGIN_TEST_OUTPUT_VAR) {
            config.plugin_test.output = strip_ansi(&value);
        }
        if let Some(value) = self.get(PLUGIN_TEST_METADATA_VAR) {
            config.plugin_test.metadata = parse_metadata(&value)?;
        }
        if let Some(value) = self.get(GITHUB_REPOSITORY_VAR)
            && !value.trim().is_empty()
        {
            let repo = RepoRef::parse(&value).ok_or_else(|| {
                ConfigError::Invalid(format!("{GITHUB_REPOSITORY_VAR} must be owner/name"))
            })?;
            config.repository.owner = Some(repo.owner);
            config.repository.name = Some(repo.name);
        }
        if let Some(value) = self.get(GITHUB_RUN_ID_VAR)
            && !value.trim().is_empty()
        {
            config.repository.run_id = Some(value.trim().to_string());
        }
        if let Some(value) = self.get(BASE_VAR) {
            config.input.base = value.trim().to_string();
        }
        if let Some(value) = self.get(REGISTRY_PATH_VAR) {
            config.input.registry_path = PathBuf::from(value.trim());
        }
        Ok(())
    }

    /// Returns the variable value when set.
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
    }
}

// ============================================================================
// SECTION: Parsers
// ============================================================================

/// Parses a workflow flag; the empty string reads as `false`.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] for values that are not a recognizable flag.
pub fn parse_flag(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "off" => Ok(false),
        "1" | "true" | "yes" | "on" => Ok(true),
        _ => Err(ConfigError::Invalid(format!("{name} must be a boolean flag"))),
    }
}

/// Parses load-test metadata; the empty string reads as absent.
fn parse_metadata(value: &str) -> Result<Option<PluginTestMetadata>, ConfigError> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(value)
        .map(Some)
        .map_err(|err| ConfigError::Parse(format!("{PLUGIN_TEST_METADATA_VAR}: {err}")))
}

/// Removes terminal escape sequences from captured console output.
#[must_use]
pub fn strip_ansi(text: &str) -> String {
    ANSI_REGEX
        .as_ref()
        .map_or_else(|| text.to_string(), |regex| regex.replace_all(text, "").into_owned())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_ansi_removes_color_and_cursor_codes() {
        let raw = "\u{1b}[31mERROR\u{1b}[0m load failed\u{1b}[2K\u{1b}M";
        assert_eq!(strip_ansi(raw), "ERROR load failed");
    }

    #[test]
    fn flags_accept_common_spellings() {
        assert_eq!(parse_flag("X", "").ok(), Some(false));
        assert_eq!(parse_flag("X", "True").ok(), Some(true));
        assert_eq!(parse_flag("X", " off ").ok(), Some(false));
        assert!(parse_flag("X", "maybe").is_err());
    }

    #[test]
    fn empty_metadata_is_absent() {
        assert_eq!(parse_metadata("  ").ok(), Some(None));
        assert!(matches!(parse_metadata("{"), Err(ConfigError::Parse(_))));
    }
}
