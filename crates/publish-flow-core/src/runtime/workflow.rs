// crates/publish-flow-core/src/runtime/workflow.rs
// ============================================================================
// Module: Publish Flow Workflow
// Description: Event handlers for issue checks, closed pull requests, and reviews.
// Purpose: Drive validation, publishing, and reporting against the forge.
// Dependencies: thiserror, tracing, crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! [`PublishWorkflow`] is the single entry point used by the CLI. It owns the
//! per-invocation reachability cache and borrows every collaborator through
//! the interfaces, so a run can be replayed entirely against in-memory
//! doubles.
//!
//! ## Invariants
//! - Every check that reaches reporting posts or updates exactly one comment.
//! - The issue title is updated only after pull request work has finished.
//! - A comment is rewritten only when its rendered body changed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::core::CloseReason;
use crate::core::Issue;
use crate::core::IssueNumber;
use crate::core::IssueState;
use crate::core::IssueUpdate;
use crate::core::LoadTestContext;
use crate::core::Locale;
use crate::core::MergeMethod;
use crate::core::NewPullRequest;
use crate::core::PublishType;
use crate::core::PullRequest;
use crate::core::ValidationOutcome;
use crate::core::VersionChange;
use crate::core::branch_for_issue;
use crate::core::issue_number_from_ref;
use crate::interfaces::CommandError;
use crate::interfaces::CommandRunner;
use crate::interfaces::ForgeClient;
use crate::interfaces::ForgeError;
use crate::interfaces::ReachabilityProbe;
use crate::interfaces::RegistryError;
use crate::interfaces::RegistryStore;
use crate::interfaces::ReportContext;
use crate::interfaces::ReportRenderer;
use crate::runtime::publish_types::PublishTypeError;
use crate::runtime::publish_types::PublishTypeRegistry;
use crate::runtime::publish_types::Submission;
use crate::runtime::publish_types::ValidationEnv;
use crate::runtime::publish_types::validate_submission;
use crate::runtime::reachability::ReachabilityCache;
use crate::runtime::reconciler::BranchReconciler;
use crate::runtime::reconciler::ConflictResolution;
use crate::runtime::reconciler::ReconcileError;
use crate::runtime::reconciler::pull_request_title;
use crate::runtime::report::REPORT_MARKER;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Comment body that requests skipping the load test.
pub const SKIP_PLUGIN_TEST_COMMENT: &str = "/skip";

/// Author associations allowed to skip tests and approve merges.
pub const MAINTAINER_ASSOCIATIONS: [&str; 2] = ["OWNER", "MEMBER"];

/// Login suffix identifying bot accounts.
pub const DEFAULT_BOT_MARKER: &str = "[bot]";

/// Review state that triggers an automatic merge.
const APPROVED: &str = "approved";

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Run parameters resolved once at process start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSettings {
    /// Base branch pull requests target.
    pub base: String,
    /// Report and message language.
    pub locale: Locale,
    /// Load-test outcome supplied by the surrounding automation.
    pub load_test: LoadTestContext,
    /// Link to the automation run, shown next to load-test results.
    pub action_url: Option<String>,
    /// Suffix identifying bot logins whose comments are ignored.
    pub bot_marker: String,
    /// Whether to install pre-commit hooks before touching git.
    pub install_hooks: bool,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            base: "master".to_string(),
            locale: Locale::default(),
            load_test: LoadTestContext::default(),
            action_url: None,
            bot_marker: DEFAULT_BOT_MARKER.to_string(),
            install_hooks: true,
        }
    }
}

/// Collaborators borrowed by the workflow.
pub struct WorkflowServices<'a> {
    /// Forge API client.
    pub forge: &'a dyn ForgeClient,
    /// Git command runner.
    pub runner: &'a dyn CommandRunner,
    /// Registry in the working tree.
    pub store: &'a dyn RegistryStore,
    /// URL probe.
    pub probe: &'a dyn ReachabilityProbe,
    /// Comment renderer.
    pub renderer: &'a dyn ReportRenderer,
    /// Publish type handlers.
    pub types: &'a PublishTypeRegistry,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Fatal workflow errors. Every variant aborts the run.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A forge request failed.
    #[error(transparent)]
    Forge(#[from] ForgeError),
    /// A git or registry step failed.
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    /// A setup command failed.
    #[error(transparent)]
    Command(#[from] CommandError),
    /// The registry could not be read.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// The publish type has no handler.
    #[error(transparent)]
    PublishType(#[from] PublishTypeError),
}

// ============================================================================
// SECTION: Reports
// ============================================================================

/// Why an event was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    /// The triggering comment came from a bot.
    BotComment,
    /// The issue is a pull request.
    PullRequest,
    /// No label names a publish type.
    NotPublish,
    /// The issue is no longer open.
    NotOpen,
    /// The head branch does not encode an issue number.
    NoIssueNumber,
    /// The reviewer is not a maintainer.
    NotMaintainer,
    /// The review is not an approval.
    NotApproved,
}

/// What happened to the report comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentAction {
    /// A new comment was created.
    Created,
    /// The existing comment was rewritten.
    Updated,
    /// The existing comment already had the rendered body.
    Unchanged,
}

/// Result of an issue check.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckReport {
    /// The event was ignored.
    Ignored(Ignored),
    /// The submission was checked and reported.
    Checked {
        /// Validation outcome.
        outcome: ValidationOutcome,
        /// Final issue title.
        title: String,
        /// Pull request opened or refreshed for a valid submission.
        pull_request: Option<u64>,
        /// Comment action taken.
        comment: CommentAction,
    },
}

/// Result of handling a closed pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClosedReport {
    /// The event was ignored.
    Ignored(Ignored),
    /// The related issue was handled.
    Handled {
        /// Related issue number.
        issue: IssueNumber,
        /// True when the issue was closed by this run.
        closed_issue: bool,
        /// Conflict replays performed after a merge.
        resolutions: Vec<ConflictResolution>,
    },
}

/// Result of handling a submitted review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewReport {
    /// The event was ignored.
    Ignored(Ignored),
    /// The pull request was merged.
    Merged {
        /// Pull request number.
        number: u64,
        /// Conflict replays performed before merging.
        resolutions: Vec<ConflictResolution>,
    },
}

// ============================================================================
// SECTION: Workflow
// ============================================================================

/// Publish workflow bound to one repository and one set of run parameters.
pub struct PublishWorkflow<'a> {
    /// Collaborators.
    services: WorkflowServices<'a>,
    /// Run parameters.
    settings: &'a WorkflowSettings,
    /// Reachability memo for this invocation.
    cache: ReachabilityCache,
}

impl<'a> PublishWorkflow<'a> {
    /// Creates a workflow with an empty reachability cache.
    #[must_use]
    pub fn new(services: WorkflowServices<'a>, settings: &'a WorkflowSettings) -> Self {
        Self {
            services,
            settings,
            cache: ReachabilityCache::new(),
        }
    }

    /// Returns the reachability cache, mainly for inspection and clearing.
    pub const fn cache_mut(&mut self) -> &mut ReachabilityCache {
        &mut self.cache
    }

    /// Marks every directory safe for git and installs pre-commit hooks.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] when either command fails.
    pub fn prepare_git(&self) -> Result<(), CommandError> {
        self.services.runner.run(&["git", "config", "--global", "safe.directory", "*"])?;
        if self.settings.install_hooks {
            self.services.runner.run(&["pre-commit", "install", "--install-hooks"])?;
        }
        Ok(())
    }

    /// Validates a submission without touching the forge or git.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the publish type is unsupported or the
    /// registry cannot be read.
    pub fn validate(
        &mut self,
        publish_type: PublishType,
        body: &str,
        author: Option<&str>,
    ) -> Result<ValidationOutcome, WorkflowError> {
        let load_test = self.settings.load_test.clone();
        self.validate_with(publish_type, body, author, &load_test)
    }

    /// Checks an issue: validate, publish on success, report, retitle.
    ///
    /// `commenter` is the login of the comment author when the event was a
    /// new comment.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when a forge, git, or registry step fails.
    pub fn handle_publish_check(
        &mut self,
        issue_number: IssueNumber,
        commenter: Option<&str>,
    ) -> Result<CheckReport, WorkflowError> {
        if commenter.is_some_and(|login| login.ends_with(&self.settings.bot_marker)) {
            info!("comment from a bot, skipping");
            return Ok(CheckReport::Ignored(Ignored::BotComment));
        }
        let issue = self.services.forge.get_issue(issue_number.get())?;
        if issue.is_pull_request {
            info!("comment on a pull request, skipping");
            return Ok(CheckReport::Ignored(Ignored::PullRequest));
        }
        let Some(publish_type) = PublishType::from_labels(&issue.labels) else {
            info!("issue is not a publish request, skipping");
            return Ok(CheckReport::Ignored(Ignored::NotPublish));
        };
        if issue.state != IssueState::Open {
            info!("issue is not open, skipping");
            return Ok(CheckReport::Ignored(Ignored::NotOpen));
        }
        self.prepare_git()?;

        let mut load_test = self.settings.load_test.clone();
        load_test.skip = load_test.skip || self.should_skip_plugin_test(issue_number)?;
        let body = self.ensure_issue_content(&issue, publish_type, load_test.skip)?;

        let outcome =
            self.validate_with(publish_type, &body, issue.author.as_deref(), &load_test)?;
        info!(valid = outcome.valid, name = %outcome.name, errors = outcome.errors.len(), "publish check finished");

        let mut title = outcome.title();
        let branch = branch_for_issue(issue_number);
        let mut pull_request = None;
        if outcome.valid {
            let reconciler = BranchReconciler::new(
                self.services.runner,
                self.services.store,
                &self.settings.base,
            );
            let published = reconciler.publish(&outcome, issue_number)?;
            title = pull_request_title(&outcome, &published.change);
            pull_request = Some(self.open_pull_request(
                publish_type,
                &branch,
                issue_number,
                &title,
                &published.change,
            )?);
        } else {
            self.draft_existing_pull_request(&branch)?;
        }

        if issue.title != title {
            self.services.forge.update_issue(issue_number.get(), &IssueUpdate::title(&title))?;
            info!(title = %title, "issue title updated");
        }

        let comment = self.comment_issue(issue_number, &outcome, &load_test)?;
        Ok(CheckReport::Checked {
            outcome,
            title,
            pull_request,
            comment,
        })
    }

    /// Handles a closed publish pull request.
    ///
    /// Closes the related issue, deletes the head branch, and after a merge
    /// replays every other open pull request of the same publish type.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when a forge, git, or registry step fails.
    pub fn handle_pull_request_closed(
        &mut self,
        pull_number: u64,
    ) -> Result<ClosedReport, WorkflowError> {
        let pull = self.services.forge.get_pull_request(pull_number)?;
        let Some(publish_type) = PublishType::from_labels(&pull.labels) else {
            info!("pull request is not a publish request, skipping");
            return Ok(ClosedReport::Ignored(Ignored::NotPublish));
        };
        let Some(issue_number) = issue_number_from_ref(&pull.head_ref) else {
            error!(head = %pull.head_ref, "cannot recover related issue number");
            return Ok(ClosedReport::Ignored(Ignored::NoIssueNumber));
        };
        self.prepare_git()?;

        let issue = self.services.forge.get_issue(issue_number.get())?;
        let closed_issue = issue.state == IssueState::Open;
        if closed_issue {
            let reason = if pull.merged { CloseReason::Completed } else { CloseReason::NotPlanned };
            info!(issue = %issue_number, reason = reason.as_str(), "closing issue");
            self.services.forge.update_issue(issue_number.get(), &IssueUpdate::close(reason))?;
        }
        info!(issue = %issue_number, "issue closed");

        match self.services.runner.run(&["git", "push", "origin", "--delete", &pull.head_ref]) {
            Ok(_) => info!(branch = %pull.head_ref, "branch deleted"),
            Err(err) => info!(branch = %pull.head_ref, error = %err, "branch missing or already deleted"),
        }

        let resolutions = if pull.merged {
            info!("pull request merged, rebuilding open publish pull requests");
            let pulls = self.open_pull_requests_of(publish_type)?;
            self.reconciler().resolve_conflicts(&pulls)?
        } else {
            info!("pull request closed without merge, skipping rebuild");
            Vec::new()
        };
        Ok(ClosedReport::Handled {
            issue: issue_number,
            closed_issue,
            resolutions,
        })
    }

    /// Merges an approved publish pull request, replaying it first when it
    /// is not mergeable.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when a forge, git, or registry step fails.
    pub fn handle_review_submitted(
        &mut self,
        pull_number: u64,
        review_state: &str,
        author_association: &str,
    ) -> Result<ReviewReport, WorkflowError> {
        let pull = self.services.forge.get_pull_request(pull_number)?;
        if PublishType::from_labels(&pull.labels).is_none() {
            info!("pull request is not a publish request, skipping");
            return Ok(ReviewReport::Ignored(Ignored::NotPublish));
        }
        if !MAINTAINER_ASSOCIATIONS.contains(&author_association) {
            info!(association = author_association, "reviewer is not a maintainer, skipping");
            return Ok(ReviewReport::Ignored(Ignored::NotMaintainer));
        }
        if !review_state.eq_ignore_ascii_case(APPROVED) {
            info!(state = review_state, "review is not an approval, skipping");
            return Ok(ReviewReport::Ignored(Ignored::NotApproved));
        }
        self.prepare_git()?;

        let resolutions = if pull.mergeable == Some(true) {
            Vec::new()
        } else {
            self.reconciler().resolve_conflicts(std::slice::from_ref(&pull))?
        };
        self.services.forge.merge_pull_request(pull_number, MergeMethod::Rebase)?;
        info!(pull = pull_number, "pull request merged");
        Ok(ReviewReport::Merged {
            number: pull_number,
            resolutions,
        })
    }

    /// Rebuilds every open publish pull request from the base branch.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when a forge, git, or registry step fails.
    pub fn resolve_open_conflicts(&mut self) -> Result<Vec<ConflictResolution>, WorkflowError> {
        self.prepare_git()?;
        let mut resolutions = Vec::new();
        for publish_type in self.services.types.publish_types() {
            let pulls = self.open_pull_requests_of(publish_type)?;
            resolutions.extend(self.reconciler().resolve_conflicts(&pulls)?);
        }
        Ok(resolutions)
    }

    /// Returns true when a maintainer commented the skip command.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError`] when the comments cannot be listed.
    pub fn should_skip_plugin_test(&self, issue_number: IssueNumber) -> Result<bool, ForgeError> {
        let comments = self.services.forge.list_issue_comments(issue_number.get())?;
        Ok(comments.iter().any(|comment| {
            comment.body.as_deref() == Some(SKIP_PLUGIN_TEST_COMMENT)
                && MAINTAINER_ASSOCIATIONS.contains(&comment.author_association.as_str())
        }))
    }

    /// Runs the validation pipeline with an explicit load-test context.
    fn validate_with(
        &mut self,
        publish_type: PublishType,
        body: &str,
        author: Option<&str>,
        load_test: &LoadTestContext,
    ) -> Result<ValidationOutcome, WorkflowError> {
        let handler = self.services.types.handler(publish_type)?;
        let mut env = ValidationEnv {
            locale: self.settings.locale,
            load_test,
            probe: self.services.probe,
            cache: &mut self.cache,
            registry: self.services.store,
        };
        Ok(validate_submission(
            handler,
            &Submission {
                body,
                author,
            },
            &mut env,
        )?)
    }

    /// Adds missing required headings when the load test is skipped.
    ///
    /// Returns the body to validate.
    fn ensure_issue_content(
        &self,
        issue: &Issue,
        publish_type: PublishType,
        skip: bool,
    ) -> Result<String, WorkflowError> {
        let body = issue.body.clone().unwrap_or_default();
        if publish_type != PublishType::Plugin || !skip {
            return Ok(body);
        }
        let handler = self.services.types.handler(publish_type)?;
        let Some(ensured) = handler.extractor().ensure_sections(&body) else {
            return Ok(body);
        };
        self.services.forge.update_issue(issue.number, &IssueUpdate::body(&ensured))?;
        info!("issue body was missing sections, updated");
        Ok(ensured)
    }

    /// Opens the pull request for a published branch, or refreshes the
    /// existing one when the forge reports it already exists.
    fn open_pull_request(
        &self,
        publish_type: PublishType,
        branch: &str,
        issue_number: IssueNumber,
        title: &str,
        change: &VersionChange,
    ) -> Result<u64, WorkflowError> {
        let request = NewPullRequest {
            title: title.to_string(),
            body: format!("resolve #{issue_number}"),
            base: self.settings.base.clone(),
            head: branch.to_string(),
        };
        match self.services.forge.create_pull_request(&request) {
            Ok(pull) => {
                self.services.forge.add_labels(pull.number, &[publish_type.as_str().to_string()])?;
                info!(pull = pull.number, old = %change.old, new = %change.new, "pull request created");
                Ok(pull.number)
            }
            Err(err) if err.is_unprocessable() => {
                info!("pull request already exists, refreshing it");
                let head = format!("{}:{branch}", self.services.forge.owner());
                let pulls = self.services.forge.list_pull_requests_by_head(&head)?;
                let Some(pull) = pulls.into_iter().next() else {
                    return Err(err.into());
                };
                if pull.title != title {
                    self.services.forge.update_pull_request_title(pull.number, title)?;
                    info!(title, "pull request title updated");
                }
                if pull.draft {
                    self.services.forge.mark_pull_request_ready(&pull.node_id)?;
                    info!(pull = pull.number, "draft pull request marked ready");
                }
                Ok(pull.number)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Converts a previously opened pull request for `branch` to a draft.
    fn draft_existing_pull_request(&self, branch: &str) -> Result<(), WorkflowError> {
        let head = format!("{}:{branch}", self.services.forge.owner());
        let pulls = self.services.forge.list_pull_requests_by_head(&head)?;
        match pulls.first() {
            Some(pull) if !pull.draft => {
                self.services.forge.convert_pull_request_to_draft(&pull.node_id)?;
                info!(pull = pull.number, "check failed, existing pull request converted to draft");
            }
            _ => info!("check failed, no pull request created"),
        }
        Ok(())
    }

    /// Posts the report comment or updates the existing one.
    fn comment_issue(
        &self,
        issue_number: IssueNumber,
        outcome: &ValidationOutcome,
        load_test: &LoadTestContext,
    ) -> Result<CommentAction, WorkflowError> {
        let comments = self.services.forge.list_issue_comments(issue_number.get())?;
        let reusable = comments
            .iter()
            .find(|comment| comment.body.as_deref().unwrap_or_default().contains(REPORT_MARKER));
        let context = ReportContext {
            locale: self.settings.locale,
            reuse: reusable.is_some(),
            skip_plugin_test: load_test.skip,
            plugin_test_output: load_test.output.clone(),
            action_url: self
                .settings
                .action_url
                .clone()
                .filter(|_| load_test.passed || load_test.skip),
        };
        let body = self.services.renderer.render(outcome, &context);
        match reusable {
            Some(comment) if comment.body.as_deref() == Some(body.as_str()) => {
                info!(comment = comment.id, "comment unchanged, skipping update");
                Ok(CommentAction::Unchanged)
            }
            Some(comment) => {
                self.services.forge.update_issue_comment(comment.id, &body)?;
                info!(comment = comment.id, "comment updated");
                Ok(CommentAction::Updated)
            }
            None => {
                self.services.forge.create_issue_comment(issue_number.get(), &body)?;
                info!("comment created");
                Ok(CommentAction::Created)
            }
        }
    }

    /// Lists open pull requests labelled with `publish_type`.
    fn open_pull_requests_of(
        &self,
        publish_type: PublishType,
    ) -> Result<Vec<PullRequest>, ForgeError> {
        let pulls = self.services.forge.list_open_pull_requests()?;
        let filtered: Vec<PullRequest> = pulls
            .into_iter()
            .filter(|pull| PublishType::from_labels(&pull.labels) == Some(publish_type))
            .collect();
        if filtered.is_empty() {
            warn!(publish_type = %publish_type, "no open pull requests to rebuild");
        }
        Ok(filtered)
    }

    /// Returns a reconciler over the workflow collaborators.
    fn reconciler(&self) -> BranchReconciler<'_> {
        BranchReconciler::new(self.services.runner, self.services.store, &self.settings.base)
    }
}
