// crates/publish-flow-providers/src/http.rs
// ============================================================================
// Module: HTTP Reachability Probe
// Description: ReachabilityProbe backed by a blocking HTTP client.
// Purpose: Report the status of homepage and repository URLs.
// Dependencies: publish-flow-core, reqwest, tracing
// ============================================================================

//! ## Overview
//! The probe issues a single GET per URL and reports the final status code.
//! Transport failures (DNS, TLS, timeouts, malformed URLs) are encoded as
//! [`ProbeStatus::NETWORK_ERROR`] with the error text, so the validator can
//! render them like any other unreachable URL.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use publish_flow_core::ProbeStatus;
use publish_flow_core::ReachabilityProbe;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the HTTP probe.
///
/// # Invariants
/// - `timeout_ms` applies to the full request lifecycle.
/// - Redirects are followed up to `max_redirects` hops when enabled.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpProbeConfig {
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// User agent string for outbound requests.
    pub user_agent: String,
    /// Follow redirects before reading the status.
    pub follow_redirects: bool,
    /// Maximum redirect hops when following.
    pub max_redirects: usize,
}

impl Default for HttpProbeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            user_agent: concat!("publish-flow/", env!("CARGO_PKG_VERSION")).to_string(),
            follow_redirects: true,
            max_redirects: 10,
        }
    }
}

/// Probe construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// The configuration is unusable.
    #[error("probe config invalid: {0}")]
    InvalidConfig(String),
    /// The HTTP client could not be built.
    #[error("probe client build failed: {0}")]
    Client(String),
}

// ============================================================================
// SECTION: Probe
// ============================================================================

/// Reachability probe over HTTP(S).
pub struct HttpReachabilityProbe {
    /// HTTP client used for outbound requests.
    client: Client,
}

impl HttpReachabilityProbe {
    /// Creates a probe with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when the configuration is invalid or the client
    /// cannot be created.
    pub fn new(config: &HttpProbeConfig) -> Result<Self, ProbeError> {
        if config.timeout_ms == 0 {
            return Err(ProbeError::InvalidConfig("timeout_ms must be greater than zero".to_string()));
        }
        let redirect = if config.follow_redirects {
            Policy::limited(config.max_redirects)
        } else {
            Policy::none()
        };
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .redirect(redirect)
            .build()
            .map_err(|err| ProbeError::Client(err.to_string()))?;
        Ok(Self {
            client,
        })
    }
}

impl ReachabilityProbe for HttpReachabilityProbe {
    fn probe(&self, url: &str) -> ProbeStatus {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(err) => return ProbeStatus::network_error(format!("invalid url: {err}")),
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            return ProbeStatus::network_error(format!("unsupported url scheme: {}", parsed.scheme()));
        }
        let status = match self.client.get(parsed).send() {
            Ok(response) => {
                let code = response.status();
                ProbeStatus::http(code.as_u16(), code.canonical_reason().unwrap_or_default())
            }
            Err(err) => ProbeStatus::network_error(err.to_string()),
        };
        debug!(url, status = status.status_code, message = %status.message, "probed url");
        status
    }
}
