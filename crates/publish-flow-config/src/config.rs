// crates/publish-flow-config/src/config.rs
// ============================================================================
// Module: Publish Flow Configuration
// Description: Configuration loading and validation for the publish workflow.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: publish-flow-core, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits,
//! then overridden by workflow inputs from the environment. The merged config
//! is built once at process start and passed by reference; nothing reads it
//! from a global.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use publish_flow_core::DEFAULT_BOT_MARKER;
use publish_flow_core::LoadTestContext;
use publish_flow_core::Locale;
use publish_flow_core::PluginTestMetadata;
use publish_flow_core::RepoRef;
use publish_flow_core::WorkflowSettings;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::env::EnvOverrides;
use crate::env::strip_ansi;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "publish-flow.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "PUBLISH_FLOW_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Smallest accepted probe timeout.
pub(crate) const MIN_PROBE_TIMEOUT_MS: u64 = 100;
/// Largest accepted probe timeout.
pub(crate) const MAX_PROBE_TIMEOUT_MS: u64 = 60_000;
/// Web host used for automation run links.
const WEB_BASE: &str = "https://github.com";

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// Complete run configuration.
///
/// # Invariants
/// - A value returned by [`PublishFlowConfig::load`] has passed
///   [`PublishFlowConfig::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublishFlowConfig {
    /// Branch and registry location.
    #[serde(default)]
    pub input: InputConfig,
    /// Forge repository coordinates.
    #[serde(default)]
    pub repository: RepositoryConfig,
    /// Load-test results.
    #[serde(default)]
    pub plugin_test: PluginTestConfig,
    /// Reachability probe settings.
    #[serde(default)]
    pub probe: ProbeConfig,
    /// Report presentation settings.
    #[serde(default)]
    pub report: ReportConfig,
    /// Git and event-filter settings.
    #[serde(default)]
    pub git: GitConfig,
}

impl PublishFlowConfig {
    /// Loads configuration with overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading, overriding, or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |key| env::var(key).ok())
    }

    /// Loads configuration resolving variables through `lookup`.
    ///
    /// An explicit path must exist. When only the default file name is
    /// resolved and it is missing, all defaults are used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading, overriding, or validation fails.
    pub fn load_with_env<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (resolved, explicit) = resolve_path(path, &lookup)?;
        validate_path(&resolved)?;
        let mut config = match fs::read(&resolved) {
            Ok(bytes) => Self::from_bytes(&bytes)?,
            Err(err) if err.kind() == ErrorKind::NotFound && !explicit => Self::default(),
            Err(err) => return Err(ConfigError::Io(err.to_string())),
        };
        EnvOverrides::new(lookup).apply(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration bytes without applying overrides or validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the content is oversized, not UTF-8, or
    /// not valid TOML.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.plugin_test.output = strip_ansi(&config.plugin_test.output);
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.input.validate()?;
        self.repository.validate()?;
        self.probe.validate()?;
        self.git.validate()?;
        Ok(())
    }

    /// Returns the load-test context handed to validation.
    #[must_use]
    pub fn load_test(&self) -> LoadTestContext {
        LoadTestContext {
            skip: self.plugin_test.skip,
            passed: self.plugin_test.result,
            output: self.plugin_test.output.clone(),
            metadata: self.plugin_test.metadata.clone(),
        }
    }

    /// Returns the link to the current automation run when known.
    #[must_use]
    pub fn action_url(&self) -> Option<String> {
        let repo = self.repository.repo()?;
        let run_id = self.repository.run_id.as_deref()?;
        Some(format!("{WEB_BASE}/{}/actions/runs/{run_id}", repo.slug()))
    }

    /// Builds the workflow settings for this run.
    #[must_use]
    pub fn workflow_settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            base: self.input.base.clone(),
            locale: self.report.locale,
            load_test: self.load_test(),
            action_url: self.action_url(),
            bot_marker: self.git.bot_marker.clone(),
            install_hooks: self.git.install_hooks,
        }
    }
}

// ============================================================================
// SECTION: Input
// ============================================================================

/// Branch and registry location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputConfig {
    /// Base branch that publish branches are cut from.
    #[serde(default = "default_base")]
    pub base: String,
    /// Registry file path relative to the working tree.
    #[serde(default = "default_registry_path")]
    pub registry_path: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            base: default_base(),
            registry_path: default_registry_path(),
        }
    }
}

impl InputConfig {
    /// Validates branch and path fields.
    fn validate(&self) -> Result<(), ConfigError> {
        let base = self.base.trim();
        if base.is_empty() {
            return Err(ConfigError::Invalid("input.base must be non-empty".to_string()));
        }
        if base.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid("input.base must not contain whitespace".to_string()));
        }
        validate_path_string("input.registry_path", &self.registry_path.to_string_lossy())
    }
}

// ============================================================================
// SECTION: Repository
// ============================================================================

/// Forge repository coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Owning account or organization.
    #[serde(default)]
    pub owner: Option<String>,
    /// Repository name.
    #[serde(default)]
    pub name: Option<String>,
    /// Current automation run identifier.
    #[serde(default)]
    pub run_id: Option<String>,
    /// REST and GraphQL API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            owner: None,
            name: None,
            run_id: None,
            api_base: default_api_base(),
        }
    }
}

impl RepositoryConfig {
    /// Returns the repository when both coordinates are set.
    #[must_use]
    pub fn repo(&self) -> Option<RepoRef> {
        Some(RepoRef {
            owner: self.owner.clone()?,
            name: self.name.clone()?,
        })
    }

    /// Validates coordinates and the API base.
    fn validate(&self) -> Result<(), ConfigError> {
        match (&self.owner, &self.name) {
            (None, None) => {}
            (Some(owner), Some(name)) => {
                if RepoRef::parse(&format!("{owner}/{name}")).is_none() {
                    return Err(ConfigError::Invalid(
                        "repository.owner and repository.name must form owner/name".to_string(),
                    ));
                }
            }
            _ => {
                return Err(ConfigError::Invalid(
                    "repository.owner and repository.name must be set together".to_string(),
                ));
            }
        }
        let url = Url::parse(&self.api_base)
            .map_err(|_| ConfigError::Invalid("repository.api_base must be a url".to_string()))?;
        if !matches!(url.scheme(), "https" | "http") {
            return Err(ConfigError::Invalid(
                "repository.api_base must use http or https".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Plugin Test
// ============================================================================

/// Load-test results supplied by the automation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginTestConfig {
    /// Whether the load test passed; the empty string reads as `false`.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub result: bool,
    /// Load-test output with terminal escapes removed.
    #[serde(default)]
    pub output: String,
    /// Metadata reported by the load test; the empty string reads as absent.
    #[serde(default, deserialize_with = "deserialize_metadata")]
    pub metadata: Option<PluginTestMetadata>,
    /// Whether the load test was skipped.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub skip: bool,
}

/// Flag written either as a TOML boolean or as workflow text.
#[derive(Deserialize)]
#[serde(untagged)]
enum FlagInput {
    /// Native boolean.
    Bool(bool),
    /// Text such as `""` or `"true"`.
    Text(String),
}

/// Metadata written either as a table or as workflow text.
#[derive(Deserialize)]
#[serde(untagged)]
enum MetadataInput {
    /// Native table.
    Table(PluginTestMetadata),
    /// JSON text, possibly empty.
    Text(String),
}

/// Deserializes a flag that tolerates the empty string.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match FlagInput::deserialize(deserializer)? {
        FlagInput::Bool(value) => Ok(value),
        FlagInput::Text(text) => {
            crate::env::parse_flag("flag", &text).map_err(serde::de::Error::custom)
        }
    }
}

/// Deserializes metadata that tolerates the empty string.
fn deserialize_metadata<'de, D>(deserializer: D) -> Result<Option<PluginTestMetadata>, D::Error>
where
    D: Deserializer<'de>,
{
    match MetadataInput::deserialize(deserializer)? {
        MetadataInput::Table(metadata) => Ok(Some(metadata)),
        MetadataInput::Text(text) if text.trim().is_empty() => Ok(None),
        MetadataInput::Text(text) => {
            serde_json::from_str(&text).map(Some).map_err(serde::de::Error::custom)
        }
    }
}

// ============================================================================
// SECTION: Probe
// ============================================================================

/// Reachability probe settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeConfig {
    /// Whole-request timeout in milliseconds.
    #[serde(default = "default_probe_timeout_ms")]
    pub timeout_ms: u64,
    /// User agent sent with probe requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Whether redirects are followed before reading the status.
    #[serde(default = "default_true")]
    pub follow_redirects: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_probe_timeout_ms(),
            user_agent: default_user_agent(),
            follow_redirects: true,
        }
    }
}

impl ProbeConfig {
    /// Validates timeout bounds and the user agent.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_PROBE_TIMEOUT_MS ..= MAX_PROBE_TIMEOUT_MS).contains(&self.timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "probe.timeout_ms must be between {MIN_PROBE_TIMEOUT_MS} and \
                 {MAX_PROBE_TIMEOUT_MS}"
            )));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid("probe.user_agent must be non-empty".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Report
// ============================================================================

/// Report presentation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    /// Language for messages and the rendered comment.
    #[serde(default)]
    pub locale: Locale,
}

// ============================================================================
// SECTION: Git
// ============================================================================

/// Git and event-filter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GitConfig {
    /// Login suffix identifying bot accounts.
    #[serde(default = "default_bot_marker")]
    pub bot_marker: String,
    /// Whether to install pre-commit hooks during setup.
    #[serde(default = "default_true")]
    pub install_hooks: bool,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            bot_marker: default_bot_marker(),
            install_hooks: true,
        }
    }
}

impl GitConfig {
    /// Validates the bot marker.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_marker.trim().is_empty() {
            return Err(ConfigError::Invalid("git.bot_marker must be non-empty".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML or JSON parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path and whether it was requested explicitly.
fn resolve_path<F>(path: Option<&Path>, lookup: &F) -> Result<(PathBuf, bool), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Some(env_path) = lookup(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Default base branch.
fn default_base() -> String {
    "master".to_string()
}

/// Default registry path.
fn default_registry_path() -> PathBuf {
    PathBuf::from("plugins.json")
}

/// Default forge API base.
fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

/// Default probe timeout.
const fn default_probe_timeout_ms() -> u64 {
    10_000
}

/// Default probe user agent.
fn default_user_agent() -> String {
    concat!("publish-flow/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Default bot login suffix.
fn default_bot_marker() -> String {
    DEFAULT_BOT_MARKER.to_string()
}

/// Serde default for flags that start enabled.
const fn default_true() -> bool {
    true
}
