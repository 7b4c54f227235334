// crates/publish-flow-core/src/core/identifiers.rs
// ============================================================================
// Module: Publish Flow Identifiers
// Description: Publish types, issue numbers, and branch naming conventions.
// Purpose: Provide strongly typed identifiers with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the identifiers that tie an issue, its publish branch,
//! and its pull request together. Branch names are always derived from the
//! issue number via [`branch_for_issue`] and parsed back with
//! [`issue_number_from_ref`]; nothing else in the crate formats them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Prefix shared by every publish branch (`publish/issue123`).
pub const BRANCH_NAME_PREFIX: &str = "publish/issue";

/// Maximum number of name characters kept in issue and pull request titles.
pub const TITLE_MAX_LENGTH: usize = 50;

// ============================================================================
// SECTION: Publish Type
// ============================================================================

/// Kind of submission carried by an issue or pull request.
///
/// # Invariants
/// - The label text (`"Plugin"`) is the display name used in titles.
/// - The commit noun (`"plugin"`) is the lowercase form used in commit messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PublishType {
    /// Plugin submission.
    Plugin,
}

impl PublishType {
    /// All publish types known to this build.
    pub const ALL: [Self; 1] = [Self::Plugin];

    /// Returns the label and title form of the publish type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plugin => "Plugin",
        }
    }

    /// Returns the lowercase noun used in commit messages.
    #[must_use]
    pub const fn commit_noun(self) -> &'static str {
        match self {
            Self::Plugin => "plugin",
        }
    }

    /// Resolves a publish type from a single label name.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == label)
    }

    /// Resolves a publish type from the first matching label in `labels`.
    #[must_use]
    pub fn from_labels<I, S>(labels: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        labels.into_iter().find_map(|label| Self::from_label(label.as_ref()))
    }

    /// Resolves a publish type from a title of the form `"Plugin: name"`.
    #[must_use]
    pub fn from_title(title: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| title.starts_with(&kind.title_prefix()))
    }

    /// Recovers the submission name from a title.
    ///
    /// A trailing version transition suffix (`" (v0.1 -> v0.2)"`) is
    /// removed so the result matches the registry key.
    #[must_use]
    pub fn name_from_title(self, title: &str) -> Option<String> {
        let prefix = self.title_prefix();
        let start = title.find(&prefix)? + prefix.len();
        let rest = &title[start..];
        let name = strip_version_suffix(rest).trim();
        if name.is_empty() { None } else { Some(name.to_string()) }
    }

    /// Builds a title from the submission name, truncated to
    /// [`TITLE_MAX_LENGTH`] characters.
    #[must_use]
    pub fn title_for(self, name: &str) -> String {
        let truncated: String = name.chars().take(TITLE_MAX_LENGTH).collect();
        format!("{}{truncated}", self.title_prefix())
    }

    /// Returns the `"Plugin: "` title prefix.
    fn title_prefix(self) -> String {
        format!("{}: ", self.as_str())
    }
}

impl fmt::Display for PublishType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Removes a `" (v<old> -> v<new>)"` suffix when present.
fn strip_version_suffix(title: &str) -> &str {
    let Some(open) = title.rfind(" (v") else {
        return title;
    };
    let suffix = &title[open..];
    if suffix.ends_with(')') && suffix.contains(" -> v") { &title[..open] } else { title }
}

// ============================================================================
// SECTION: Issue Number
// ============================================================================

/// Issue number on the forge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueNumber(u64);

impl IssueNumber {
    /// Creates a new issue number.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw issue number.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for IssueNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for IssueNumber {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Branch Names
// ============================================================================

/// Returns the publish branch for an issue (`publish/issue{N}`).
#[must_use]
pub fn branch_for_issue(issue: IssueNumber) -> String {
    format!("{BRANCH_NAME_PREFIX}{issue}")
}

/// Extracts the issue number from a publish branch reference.
///
/// Returns `None` when the reference does not contain the publish prefix
/// followed by at least one digit.
#[must_use]
pub fn issue_number_from_ref(reference: &str) -> Option<IssueNumber> {
    let start = reference.find(BRANCH_NAME_PREFIX)? + BRANCH_NAME_PREFIX.len();
    let digits: String =
        reference[start..].chars().take_while(char::is_ascii_digit).collect();
    digits.parse::<u64>().ok().map(IssueNumber::new)
}
