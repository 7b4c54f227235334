// crates/publish-flow-providers/src/lib.rs
// ============================================================================
// Module: Publish Flow Providers
// Description: Concrete collaborators for the publish workflow.
// Purpose: Connect the workflow interfaces to HTTP, git, and the forge API.
// Dependencies: publish-flow-core, reqwest, serde, tracing
// ============================================================================

//! ## Overview
//! This crate implements the workflow interfaces against real systems: a
//! blocking HTTP reachability probe, a process-backed command runner for git,
//! and a GitHub REST/GraphQL forge client. Each provider maps transport
//! failures into the interface error types and never panics on bad input.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod github;
pub mod http;
pub mod shell;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use github::DEFAULT_API_BASE;
pub use github::GitHubConfig;
pub use github::GitHubForge;
pub use http::HttpProbeConfig;
pub use http::HttpReachabilityProbe;
pub use http::ProbeError;
pub use shell::ShellCommandRunner;
