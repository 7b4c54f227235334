// crates/publish-flow-cli/src/logging.rs
// ============================================================================
// Module: CLI Logging
// Description: Tracing subscriber setup for the publish-flow binary.
// Purpose: Route structured logs to stderr in human or JSON form.
// Dependencies: clap, thiserror, tracing-subscriber
// ============================================================================

//! ## Overview
//! Logs always go to stderr so that JSON written to stdout stays parseable.
//! The filter defaults to `info`, `--verbose` raises it to `debug`, and
//! [`LOG_ENV_VAR`] replaces it entirely with an `EnvFilter` directive.

// ============================================================================
// SECTION: Imports
// ============================================================================

use clap::ValueEnum;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV_VAR: &str = "PUBLISH_FLOW_LOG";

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Human,
    /// One JSON object per line.
    Json,
}

/// Logging setup errors.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The filter directive is malformed.
    #[error("invalid {LOG_ENV_VAR} directive: {0}")]
    Filter(String),
    /// A global subscriber is already installed.
    #[error("subscriber already installed: {0}")]
    Install(String),
}

// ============================================================================
// SECTION: Setup
// ============================================================================

/// Builds the level filter from the verbosity flag and the env directive.
///
/// # Errors
///
/// Returns [`LoggingError::Filter`] when `directive` cannot be parsed.
pub fn build_filter(verbose: bool, directive: Option<&str>) -> Result<EnvFilter, LoggingError> {
    match directive.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => {
            EnvFilter::try_new(value).map_err(|err| LoggingError::Filter(err.to_string()))
        }
        None if verbose => Ok(EnvFilter::new("debug")),
        None => Ok(EnvFilter::new("info")),
    }
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns [`LoggingError`] when the filter is invalid or a subscriber is
/// already installed.
pub fn init_logging(
    verbose: bool,
    format: LogFormat,
    directive: Option<&str>,
) -> Result<(), LoggingError> {
    let filter = build_filter(verbose, directive)?;
    let registry = tracing_subscriber::registry().with(filter);
    let installed = match format {
        LogFormat::Human => registry.with(fmt::layer().with_writer(std::io::stderr)).try_init(),
        LogFormat::Json => {
            registry.with(fmt::layer().json().with_writer(std::io::stderr)).try_init()
        }
    };
    installed.map_err(|err| LoggingError::Install(err.to_string()))
}
