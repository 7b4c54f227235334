// crates/publish-flow-core/src/core/mod.rs
// ============================================================================
// Module: Publish Flow Core Types
// Description: Canonical identifiers, field values, outcomes, and records.
// Purpose: Provide stable, serializable types shared by every crate.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Core types describe what flows through a publish check: raw fields from
//! the issue, the validated outcome, and the registry record written on
//! success. They carry no behavior beyond conversions.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod fields;
pub mod forge;
pub mod identifiers;
pub mod messages;
pub mod outcome;
pub mod record;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use fields::FieldValue;
pub use fields::RawFieldMap;
pub use fields::field;
pub use forge::CloseReason;
pub use forge::Issue;
pub use forge::IssueComment;
pub use forge::IssueState;
pub use forge::IssueUpdate;
pub use forge::MergeMethod;
pub use forge::NewPullRequest;
pub use forge::PullRequest;
pub use forge::RepoRef;
pub use identifiers::BRANCH_NAME_PREFIX;
pub use identifiers::IssueNumber;
pub use identifiers::PublishType;
pub use identifiers::TITLE_MAX_LENGTH;
pub use identifiers::branch_for_issue;
pub use identifiers::issue_number_from_ref;
pub use messages::Locale;
pub use messages::MessageArg;
pub use messages::translate;
pub use outcome::ErrorEntry;
pub use outcome::ErrorKind;
pub use outcome::FieldValidation;
pub use outcome::ValidData;
pub use outcome::ValidationOutcome;
pub use record::LoadTestContext;
pub use record::PluginTestMetadata;
pub use record::RecordError;
pub use record::RegistryEntry;
pub use record::RegistryRecord;
pub use record::VersionChange;
pub use record::upsert_record;
