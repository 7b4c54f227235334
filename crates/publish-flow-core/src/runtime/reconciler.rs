// crates/publish-flow-core/src/runtime/reconciler.rs
// ============================================================================
// Module: Publish Flow Branch Reconciler
// Description: Publish branches, registry commits, and conflict replay.
// Purpose: Turn a valid outcome into a pushed publish branch.
// Dependencies: thiserror, tracing, crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The reconciler owns every git interaction of the publish flow. A publish
//! recreates `publish/issue{N}` from the current checkout, rewrites the
//! registry entry, commits, and force-pushes only when the local branch
//! differs from the remote one. Conflict resolution replays the registry
//! entry found on a pull request's branch onto a fresh copy of the base.
//!
//! ## Invariants
//! - A failed commit is retried exactly once after re-staging.
//! - A push happens only when `git diff origin/{branch} {branch}` reports a
//!   difference or cannot be computed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use thiserror::Error;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::core::IssueNumber;
use crate::core::PublishType;
use crate::core::PullRequest;
use crate::core::RecordError;
use crate::core::RegistryRecord;
use crate::core::ValidationOutcome;
use crate::core::VersionChange;
use crate::core::branch_for_issue;
use crate::core::field;
use crate::core::issue_number_from_ref;
use crate::interfaces::CommandError;
use crate::interfaces::CommandOutput;
use crate::interfaces::CommandRunner;
use crate::interfaces::RegistryError;
use crate::interfaces::RegistryStore;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Commit message prefix for first publications.
pub const COMMIT_MESSAGE_PREFIX: &str = ":beers: publish";

/// Commit message prefix for version updates.
pub const UPDATE_MESSAGE_PREFIX: &str = ":tada: update";

/// Remote all branches are pushed to.
const REMOTE: &str = "origin";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Branch reconciliation errors.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A git command failed.
    #[error(transparent)]
    Command(#[from] CommandError),
    /// The registry could not be read or written.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// The outcome lacks a registry record field.
    #[error(transparent)]
    Record(#[from] RecordError),
    /// Only valid outcomes can be published.
    #[error("refusing to publish invalid submission `{0}`")]
    InvalidOutcome(String),
}

// ============================================================================
// SECTION: Results
// ============================================================================

/// Result of publishing an outcome to its branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedBranch {
    /// Branch name.
    pub branch: String,
    /// Registry version transition.
    pub change: VersionChange,
    /// True when the branch was pushed.
    pub pushed: bool,
}

/// Per-pull-request result of conflict resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictResolution {
    /// The pull request branch was rebuilt from the base.
    Replayed {
        /// Pull request number.
        number: u64,
        /// Rebuilt branch.
        branch: PublishedBranch,
    },
    /// The pull request was left untouched.
    Skipped {
        /// Pull request number.
        number: u64,
        /// Reason the pull request was skipped.
        reason: SkipReason,
    },
}

/// Why a pull request was not replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The head branch does not encode an issue number.
    NoIssueNumber,
    /// The pull request is a draft.
    Draft,
    /// No label names a publish type.
    NoPublishType,
    /// The title does not contain a submission name.
    NoName,
    /// The registry on the head branch has no entry for the name.
    NoEntry,
}

// ============================================================================
// SECTION: Message Helpers
// ============================================================================

/// Returns the commit message for a publication.
///
/// First publications read `:beers: publish plugin {name} (#{issue})`;
/// updates read `:tada: update plugin {name} to v{new} (#{issue})`.
#[must_use]
pub fn commit_message(
    outcome: &ValidationOutcome,
    issue: IssueNumber,
    change: &VersionChange,
) -> String {
    let noun = outcome.publish_type.commit_noun();
    if change.is_update() {
        format!(
            "{UPDATE_MESSAGE_PREFIX} {noun} {} to v{} (#{issue})",
            outcome.name, change.new
        )
    } else {
        format!("{COMMIT_MESSAGE_PREFIX} {noun} {} (#{issue})", outcome.name)
    }
}

/// Returns the pull request title, adding the version transition on updates.
#[must_use]
pub fn pull_request_title(outcome: &ValidationOutcome, change: &VersionChange) -> String {
    let title = outcome.title();
    if change.is_update() {
        format!("{title} (v{} -> v{})", change.old, change.new)
    } else {
        title
    }
}

// ============================================================================
// SECTION: Reconciler
// ============================================================================

/// Git and registry driver for publish branches.
pub struct BranchReconciler<'a> {
    /// Git command runner.
    runner: &'a dyn CommandRunner,
    /// Registry in the working tree.
    store: &'a dyn RegistryStore,
    /// Base branch pull requests target.
    base: &'a str,
}

impl<'a> BranchReconciler<'a> {
    /// Creates a reconciler.
    #[must_use]
    pub fn new(runner: &'a dyn CommandRunner, store: &'a dyn RegistryStore, base: &'a str) -> Self {
        Self {
            runner,
            store,
            base,
        }
    }

    /// Publishes a valid outcome to `publish/issue{N}`.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when the outcome is invalid or any git or
    /// registry step fails.
    pub fn publish(
        &self,
        outcome: &ValidationOutcome,
        issue: IssueNumber,
    ) -> Result<PublishedBranch, ReconcileError> {
        if !outcome.valid {
            return Err(ReconcileError::InvalidOutcome(outcome.name.clone()));
        }
        let branch = branch_for_issue(issue);
        self.git(&["switch", "-C", &branch])?;
        self.apply_and_push(outcome, &branch, issue)
    }

    /// Rebuilds each eligible pull request branch from the base.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when a git or registry step fails for an
    /// eligible pull request.
    pub fn resolve_conflicts(
        &self,
        pulls: &[PullRequest],
    ) -> Result<Vec<ConflictResolution>, ReconcileError> {
        let mut results = Vec::with_capacity(pulls.len());
        for pull in pulls {
            let resolution = self.resolve_one(pull)?;
            results.push(resolution);
        }
        Ok(results)
    }

    /// Rebuilds one pull request branch.
    fn resolve_one(&self, pull: &PullRequest) -> Result<ConflictResolution, ReconcileError> {
        let skipped = |reason| ConflictResolution::Skipped {
            number: pull.number,
            reason,
        };
        let Some(issue) = issue_number_from_ref(&pull.head_ref) else {
            error!(pull = pull.number, head = %pull.head_ref, "cannot recover issue number from head branch");
            return Ok(skipped(SkipReason::NoIssueNumber));
        };
        info!(pull = pull.number, title = %pull.title, "resolving conflicts");
        if pull.draft {
            info!(pull = pull.number, "pull request is a draft, skipping");
            return Ok(skipped(SkipReason::Draft));
        }
        let Some(publish_type) = PublishType::from_labels(&pull.labels) else {
            info!(pull = pull.number, "pull request has no publish type label, skipping");
            return Ok(skipped(SkipReason::NoPublishType));
        };
        let Some(name) = publish_type.name_from_title(&pull.title) else {
            warn!(pull = pull.number, title = %pull.title, "cannot recover name from title");
            return Ok(skipped(SkipReason::NoName));
        };

        self.git(&["fetch", REMOTE])?;
        self.git(&["checkout", &pull.head_ref])?;
        let outcome = self.outcome_from_registry(publish_type, &name)?;
        self.git(&["checkout", self.base])?;
        let Some(outcome) = outcome else {
            warn!(pull = pull.number, name = %name, head = %pull.head_ref, "registry entry missing, skipping");
            return Ok(skipped(SkipReason::NoEntry));
        };
        self.git(&["switch", "-C", &pull.head_ref])?;
        let branch = self.apply_and_push(&outcome, &pull.head_ref, issue)?;
        info!(pull = pull.number, pushed = branch.pushed, "pull request branch rebuilt");
        Ok(ConflictResolution::Replayed {
            number: pull.number,
            branch,
        })
    }

    /// Rebuilds a valid outcome from the registry entry for `name`, or
    /// `None` when the registry has no such entry.
    fn outcome_from_registry(
        &self,
        publish_type: PublishType,
        name: &str,
    ) -> Result<Option<ValidationOutcome>, ReconcileError> {
        let Some(entry) = self.store.lookup(name)? else {
            return Ok(None);
        };
        let author =
            entry.get(field::AUTHOR).and_then(Value::as_str).unwrap_or_default().to_string();
        let mut data = entry;
        data.insert(field::NAME.to_string(), Value::String(name.to_string()));
        Ok(Some(ValidationOutcome {
            valid: true,
            publish_type,
            name: name.to_string(),
            author,
            data,
            errors: Vec::new(),
        }))
    }

    /// Writes the registry entry, commits, and pushes when changed.
    fn apply_and_push(
        &self,
        outcome: &ValidationOutcome,
        branch: &str,
        issue: IssueNumber,
    ) -> Result<PublishedBranch, ReconcileError> {
        let record = RegistryRecord::from_data(&outcome.data)?;
        let change = self.store.update(&outcome.name, &record)?;
        info!(name = %outcome.name, old = %change.old, new = %change.new, "registry updated");
        self.commit(outcome, issue, &change)?;
        let pushed = self.push_if_changed(branch)?;
        Ok(PublishedBranch {
            branch: branch.to_string(),
            change,
            pushed,
        })
    }

    /// Stages and commits all changes as the submitter, retrying once.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Command`] when configuring git fails or the
    /// retried commit fails again.
    pub fn commit(
        &self,
        outcome: &ValidationOutcome,
        issue: IssueNumber,
        change: &VersionChange,
    ) -> Result<(), ReconcileError> {
        let email = format!("{}@users.noreply.github.com", outcome.author);
        self.git(&["config", "--global", "user.name", &outcome.author])?;
        self.git(&["config", "--global", "user.email", &email])?;
        let message = commit_message(outcome, issue, change);
        self.git(&["add", "-A"])?;
        if let Err(err) = self.git(&["commit", "-m", &message]) {
            warn!(error = %err, "commit failed, staging hook changes and retrying once");
            self.git(&["add", "-A"])?;
            self.git(&["commit", "-m", &message])?;
        }
        Ok(())
    }

    /// Force-pushes `branch` unless it already matches the remote branch.
    ///
    /// Returns true when a push happened.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Command`] when the push fails.
    pub fn push_if_changed(&self, branch: &str) -> Result<bool, ReconcileError> {
        let remote_branch = format!("{REMOTE}/{branch}");
        let unchanged = self
            .git(&["fetch", REMOTE])
            .and_then(|_| self.git(&["diff", &remote_branch, branch]))
            .map(|output| output.stdout.trim().is_empty());
        match unchanged {
            Ok(true) => {
                info!(branch, "branch matches remote, skipping push");
                Ok(false)
            }
            Ok(false) | Err(_) => {
                self.git(&["push", REMOTE, branch, "-f"])?;
                info!(branch, "branch pushed");
                Ok(true)
            }
        }
    }

    /// Runs a git subcommand.
    fn git(&self, args: &[&str]) -> Result<CommandOutput, CommandError> {
        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("git");
        argv.extend_from_slice(args);
        self.runner.run(&argv)
    }
}
