// crates/publish-flow-core/src/core/forge.rs
// ============================================================================
// Module: Publish Flow Forge Types
// Description: Issues, comments, and pull requests as seen by the workflow.
// Purpose: Decouple workflow logic from any particular forge wire format.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! These types carry only the fields the publish workflow reads. Forge
//! clients map their wire payloads into them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Repository
// ============================================================================

/// Repository coordinates on the forge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    /// Owning account or organization.
    pub owner: String,
    /// Repository name.
    pub name: String,
}

impl RepoRef {
    /// Parses an `owner/name` slug.
    #[must_use]
    pub fn parse(slug: &str) -> Option<Self> {
        let (owner, name) = slug.trim().split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    /// Returns the `owner/name` slug.
    #[must_use]
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

// ============================================================================
// SECTION: Issues
// ============================================================================

/// Open or closed state of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    /// Issue is open.
    Open,
    /// Issue is closed.
    Closed,
}

impl IssueState {
    /// Returns the wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

/// Reason recorded when closing an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// Work was completed.
    Completed,
    /// Work will not be done.
    NotPlanned,
}

impl CloseReason {
    /// Returns the wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::NotPlanned => "not_planned",
        }
    }
}

/// Issue as read by the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Issue number.
    pub number: u64,
    /// Issue title.
    pub title: String,
    /// Issue body, absent when empty.
    pub body: Option<String>,
    /// Issue state.
    pub state: IssueState,
    /// Login of the issue author.
    pub author: Option<String>,
    /// Label names.
    pub labels: Vec<String>,
    /// True when the issue is a pull request.
    pub is_pull_request: bool,
}

/// Partial issue update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueUpdate {
    /// New title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// New state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<IssueState>,
    /// Close reason, only meaningful with a closed state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_reason: Option<CloseReason>,
}

impl IssueUpdate {
    /// Update that only changes the title.
    #[must_use]
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Update that only changes the body.
    #[must_use]
    pub fn body(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            ..Self::default()
        }
    }

    /// Update that closes the issue with a reason.
    #[must_use]
    pub fn close(reason: CloseReason) -> Self {
        Self {
            state: Some(IssueState::Closed),
            state_reason: Some(reason),
            ..Self::default()
        }
    }
}

/// Issue comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueComment {
    /// Comment identifier.
    pub id: u64,
    /// Comment body.
    pub body: Option<String>,
    /// Login of the comment author.
    pub author: Option<String>,
    /// Author association (`OWNER`, `MEMBER`, `CONTRIBUTOR`, ...).
    pub author_association: String,
}

// ============================================================================
// SECTION: Pull Requests
// ============================================================================

/// Pull request as read by the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Pull request number.
    pub number: u64,
    /// Global node id used by draft conversions.
    pub node_id: String,
    /// Pull request title.
    pub title: String,
    /// True when the pull request is a draft.
    pub draft: bool,
    /// Head branch name.
    pub head_ref: String,
    /// Label names.
    pub labels: Vec<String>,
    /// Mergeability as computed by the forge, `None` while unknown.
    pub mergeable: Option<bool>,
    /// True when the pull request was merged.
    pub merged: bool,
}

/// Pull request creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPullRequest {
    /// Title.
    pub title: String,
    /// Body.
    pub body: String,
    /// Base branch.
    pub base: String,
    /// Head branch.
    pub head: String,
}

/// Merge strategy for pull requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMethod {
    /// Merge commit.
    Merge,
    /// Squash merge.
    Squash,
    /// Rebase merge.
    Rebase,
}

impl MergeMethod {
    /// Returns the wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::Squash => "squash",
            Self::Rebase => "rebase",
        }
    }
}
