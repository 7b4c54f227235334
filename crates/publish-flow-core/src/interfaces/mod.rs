// crates/publish-flow-core/src/interfaces/mod.rs
// ============================================================================
// Module: Publish Flow Interfaces
// Description: Backend-agnostic seams for git, HTTP probes, the forge, and storage.
// Purpose: Define the contract surfaces used by the publish runtime.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the publish workflow reaches the outside world
//! without embedding any backend. Every side effect (running git, probing a
//! URL, calling the forge, touching the registry file) goes through one of
//! these traits so the runtime can be exercised with in-memory doubles.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::Issue;
use crate::core::IssueComment;
use crate::core::IssueUpdate;
use crate::core::Locale;
use crate::core::MergeMethod;
use crate::core::NewPullRequest;
use crate::core::PullRequest;
use crate::core::RegistryEntry;
use crate::core::RegistryRecord;
use crate::core::ValidationOutcome;
use crate::core::VersionChange;
use crate::core::field;

// ============================================================================
// SECTION: Command Runner
// ============================================================================

/// Captured output of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

/// Command execution errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// No program was given.
    #[error("command must not be empty")]
    Empty,
    /// The program could not be started.
    #[error("command `{command}` could not be started: {message}")]
    Spawn {
        /// Rendered command line.
        command: String,
        /// Underlying error message.
        message: String,
    },
    /// The program exited unsuccessfully.
    #[error("command `{command}` exited with status {status:?}: {stderr}")]
    Failed {
        /// Rendered command line.
        command: String,
        /// Exit code when the process exited normally.
        status: Option<i32>,
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
    },
}

/// Runs external programs such as `git`.
pub trait CommandRunner {
    /// Runs `args[0]` with the remaining arguments and captures its output.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] when the program cannot start or exits
    /// unsuccessfully.
    fn run(&self, args: &[&str]) -> Result<CommandOutput, CommandError>;
}

// ============================================================================
// SECTION: Reachability Probe
// ============================================================================

/// Result of probing a URL.
///
/// # Invariants
/// - `status_code` is the HTTP status, or [`ProbeStatus::NETWORK_ERROR`] when
///   no response was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeStatus {
    /// HTTP status code or `-1`.
    pub status_code: i32,
    /// Reason phrase or transport error message.
    pub message: String,
}

impl ProbeStatus {
    /// Status code used when the request never produced a response.
    pub const NETWORK_ERROR: i32 = -1;

    /// Creates a status from an HTTP response code.
    #[must_use]
    pub fn http(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code: i32::from(status_code),
            message: message.into(),
        }
    }

    /// Creates a status for a transport failure.
    #[must_use]
    pub fn network_error(message: impl Into<String>) -> Self {
        Self {
            status_code: Self::NETWORK_ERROR,
            message: message.into(),
        }
    }

    /// Returns true when the URL answered with `200`.
    #[must_use]
    pub const fn is_reachable(&self) -> bool {
        self.status_code == 200
    }
}

/// Performs a GET against a URL and reports the status.
///
/// Transport failures are encoded in the returned [`ProbeStatus`] rather than
/// surfaced as errors.
pub trait ReachabilityProbe {
    /// Probes `url`.
    fn probe(&self, url: &str) -> ProbeStatus;
}

// ============================================================================
// SECTION: Forge Client
// ============================================================================

/// Forge API errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForgeError {
    /// The forge answered with a non-success status.
    #[error("forge request failed with status {status}: {message}")]
    RequestFailed {
        /// HTTP status code.
        status: u16,
        /// Response body or error message.
        message: String,
    },
    /// The request never completed.
    #[error("forge transport error: {0}")]
    Transport(String),
    /// The response could not be decoded.
    #[error("forge response decode error: {0}")]
    Decode(String),
    /// A GraphQL mutation reported errors.
    #[error("forge graphql error: {0}")]
    GraphQl(String),
}

impl ForgeError {
    /// Returns true when the forge rejected the request as unprocessable
    /// (for example, a pull request for the head already exists).
    #[must_use]
    pub const fn is_unprocessable(&self) -> bool {
        matches!(self, Self::RequestFailed { status: 422, .. })
    }
}

/// Repository-scoped forge operations used by the workflow.
pub trait ForgeClient {
    /// Returns the repository owner used for `owner:branch` head filters.
    fn owner(&self) -> &str;

    /// Fetches an issue.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError`] when the request fails.
    fn get_issue(&self, number: u64) -> Result<Issue, ForgeError>;

    /// Applies a partial issue update.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError`] when the request fails.
    fn update_issue(&self, number: u64, update: &IssueUpdate) -> Result<(), ForgeError>;

    /// Lists all comments on an issue in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError`] when the request fails.
    fn list_issue_comments(&self, number: u64) -> Result<Vec<IssueComment>, ForgeError>;

    /// Creates an issue comment.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError`] when the request fails.
    fn create_issue_comment(&self, number: u64, body: &str) -> Result<(), ForgeError>;

    /// Replaces the body of an existing comment.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError`] when the request fails.
    fn update_issue_comment(&self, comment_id: u64, body: &str) -> Result<(), ForgeError>;

    /// Opens a pull request.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError::RequestFailed`] with status 422 when a pull
    /// request for the head already exists.
    fn create_pull_request(&self, request: &NewPullRequest) -> Result<PullRequest, ForgeError>;

    /// Changes a pull request title.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError`] when the request fails.
    fn update_pull_request_title(&self, number: u64, title: &str) -> Result<(), ForgeError>;

    /// Lists open pull requests whose head matches `owner:branch`.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError`] when the request fails.
    fn list_pull_requests_by_head(&self, head: &str) -> Result<Vec<PullRequest>, ForgeError>;

    /// Lists all open pull requests.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError`] when the request fails.
    fn list_open_pull_requests(&self) -> Result<Vec<PullRequest>, ForgeError>;

    /// Adds labels to an issue or pull request.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError`] when the request fails.
    fn add_labels(&self, number: u64, labels: &[String]) -> Result<(), ForgeError>;

    /// Fetches a pull request.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError`] when the request fails.
    fn get_pull_request(&self, number: u64) -> Result<PullRequest, ForgeError>;

    /// Merges a pull request.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError`] when the forge refuses the merge.
    fn merge_pull_request(&self, number: u64, method: MergeMethod) -> Result<(), ForgeError>;

    /// Converts a pull request to a draft.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError`] when the mutation fails.
    fn convert_pull_request_to_draft(&self, node_id: &str) -> Result<(), ForgeError>;

    /// Marks a draft pull request as ready for review.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError`] when the mutation fails.
    fn mark_pull_request_ready(&self, node_id: &str) -> Result<(), ForgeError>;
}

// ============================================================================
// SECTION: Registry Store
// ============================================================================

/// Registry storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Registry I/O error.
    #[error("registry io error: {0}")]
    Io(String),
    /// Registry content is not valid JSON.
    #[error("registry parse error: {0}")]
    Parse(String),
    /// Registry content has an unexpected shape.
    #[error("registry entry invalid: {0}")]
    Invalid(String),
    /// Registry exceeds its size limit.
    #[error("registry exceeds size limit: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual bytes.
        actual_bytes: usize,
    },
}

/// JSON registry mapping submission name to record.
pub trait RegistryStore {
    /// Returns the raw entry for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the registry cannot be read.
    fn lookup(&self, name: &str) -> Result<Option<RegistryEntry>, RegistryError>;

    /// Inserts or replaces the record for `name`, preserving the position of
    /// existing keys and appending new ones.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the registry cannot be read or written.
    fn update(&self, name: &str, record: &RegistryRecord) -> Result<VersionChange, RegistryError>;

    /// Returns the currently published version for `name`, or an empty
    /// string when there is none.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the registry cannot be read.
    fn previous_version(&self, name: &str) -> Result<String, RegistryError> {
        Ok(self
            .lookup(name)?
            .and_then(|entry| entry.get(field::VERSION).map(version_text))
            .unwrap_or_default())
    }
}

/// Renders a stored version value as text.
#[must_use]
pub fn version_text(value: &serde_json::Value) -> String {
    value.as_str().map_or_else(|| value.to_string(), str::to_string)
}

// ============================================================================
// SECTION: Report Renderer
// ============================================================================

/// Presentation inputs for a check report beyond the outcome itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportContext {
    /// Output language.
    pub locale: Locale,
    /// True when an earlier report comment is being replaced.
    pub reuse: bool,
    /// True when the plugin load test was skipped.
    pub skip_plugin_test: bool,
    /// Load-test output shown when the test failed.
    pub plugin_test_output: String,
    /// Link to the run that produced the load-test result.
    pub action_url: Option<String>,
}

/// Renders a validation outcome into a comment body.
pub trait ReportRenderer {
    /// Renders `outcome`; the output must end with the bot marker.
    fn render(&self, outcome: &ValidationOutcome, context: &ReportContext) -> String;
}
