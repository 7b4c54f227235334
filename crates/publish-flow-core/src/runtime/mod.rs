// crates/publish-flow-core/src/runtime/mod.rs
// ============================================================================
// Module: Publish Flow Runtime
// Description: Validation pipeline, reporting, git reconciliation, workflow.
// Purpose: Implement every publish-check stage on top of the core types.
// Dependencies: regex, serde_json, thiserror, tracing, crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The runtime is ordered the way a check runs: [`extractor`] reads the
//! issue body, [`schema`] validates fields, [`rules`] applies cross-field
//! checks, [`reducer`] folds the result, [`report`] renders it, and
//! [`reconciler`] publishes it. [`workflow`] wires the stages to the forge.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod extractor;
pub mod memory;
pub mod publish_types;
pub mod reachability;
pub mod reconciler;
pub mod reducer;
pub mod report;
pub mod rules;
pub mod schema;
pub mod workflow;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use extractor::FieldExtractor;
pub use extractor::PLUGIN_SECTIONS;
pub use extractor::SectionKind;
pub use extractor::SectionLabel;
pub use memory::InMemoryRegistryStore;
pub use publish_types::PluginHandler;
pub use publish_types::PublishTypeError;
pub use publish_types::PublishTypeHandler;
pub use publish_types::PublishTypeRegistry;
pub use publish_types::Submission;
pub use publish_types::ValidationEnv;
pub use publish_types::validate_submission;
pub use reachability::ReachabilityCache;
pub use reconciler::BranchReconciler;
pub use reconciler::COMMIT_MESSAGE_PREFIX;
pub use reconciler::ConflictResolution;
pub use reconciler::PublishedBranch;
pub use reconciler::ReconcileError;
pub use reconciler::SkipReason;
pub use reconciler::UPDATE_MESSAGE_PREFIX;
pub use reconciler::commit_message;
pub use reconciler::pull_request_title;
pub use reducer::ReportReducer;
pub use report::MarkdownReportRenderer;
pub use report::REPORT_MARKER;
pub use rules::PluginRuleEngine;
pub use rules::PublishRules;
pub use rules::RuleContext;
pub use schema::FieldRule;
pub use schema::FieldSpec;
pub use schema::FieldType;
pub use schema::GITHUB_URL_PATTERN;
pub use schema::NAME_MAX_LENGTH;
pub use schema::Schema;
pub use schema::SchemaError;
pub use schema::SchemaValidator;
pub use schema::ValidationContext;
pub use workflow::CheckReport;
pub use workflow::ClosedReport;
pub use workflow::CommentAction;
pub use workflow::DEFAULT_BOT_MARKER;
pub use workflow::Ignored;
pub use workflow::MAINTAINER_ASSOCIATIONS;
pub use workflow::PublishWorkflow;
pub use workflow::ReviewReport;
pub use workflow::SKIP_PLUGIN_TEST_COMMENT;
pub use workflow::WorkflowError;
pub use workflow::WorkflowServices;
pub use workflow::WorkflowSettings;
