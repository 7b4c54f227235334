// crates/publish-flow-providers/src/github.rs
// ============================================================================
// Module: GitHub Forge Client
// Description: ForgeClient over the GitHub REST and GraphQL APIs.
// Purpose: Read issues and pull requests and apply workflow updates.
// Dependencies: publish-flow-core, reqwest, serde, serde_json, tracing
// ============================================================================

//! ## Overview
//! A blocking, repository-scoped client. REST covers issues, comments, pull
//! requests, labels, and merges; GraphQL covers the draft transitions REST
//! does not expose. Wire payloads are decoded into private structs and mapped
//! onto the core forge types so nothing outside this module sees GitHub JSON.
//!
//! ## Invariants
//! - Non-success statuses surface as [`ForgeError::RequestFailed`] with the
//!   HTTP status preserved.
//! - Response bodies larger than [`MAX_RESPONSE_BYTES`] are rejected.
//! - The bearer token is never logged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;

use publish_flow_core::ForgeClient;
use publish_flow_core::ForgeError;
use publish_flow_core::Issue;
use publish_flow_core::IssueComment;
use publish_flow_core::IssueState;
use publish_flow_core::IssueUpdate;
use publish_flow_core::MergeMethod;
use publish_flow_core::NewPullRequest;
use publish_flow_core::PullRequest;
use publish_flow_core::RepoRef;
use reqwest::Method;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::blocking::RequestBuilder;
use reqwest::header::ACCEPT;
use reqwest::header::AUTHORIZATION;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderName;
use reqwest::header::HeaderValue;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_json::json;
use tracing::debug;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Public GitHub REST API base.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";
/// Media type requested from the REST API.
const ACCEPT_MEDIA_TYPE: &str = "application/vnd.github+json";
/// REST API version header name.
const API_VERSION_HEADER: &str = "x-github-api-version";
/// REST API version header value.
const API_VERSION: &str = "2022-11-28";
/// Items requested per page.
const PAGE_SIZE: usize = 100;
/// Upper bound on pages fetched by a single listing.
const MAX_PAGES: usize = 50;
/// Maximum accepted response body size.
pub const MAX_RESPONSE_BYTES: usize = 8 * 1024 * 1024;
/// Longest error message kept from a failed response.
const MAX_ERROR_MESSAGE_CHARS: usize = 512;

/// GraphQL mutation converting a pull request to a draft.
const CONVERT_TO_DRAFT_MUTATION: &str = "mutation($id: ID!) { \
     convertPullRequestToDraft(input: {pullRequestId: $id}) { clientMutationId } }";
/// GraphQL mutation marking a draft pull request ready for review.
const MARK_READY_MUTATION: &str = "mutation($id: ID!) { \
     markPullRequestReadyForReview(input: {pullRequestId: $id}) { clientMutationId } }";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for [`GitHubForge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubConfig {
    /// REST API base URL.
    pub api_base: String,
    /// Repository the client is scoped to.
    pub repo: RepoRef,
    /// Bearer token; anonymous requests when unset.
    pub token: Option<String>,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl GitHubConfig {
    /// Creates an anonymous config for `repo` against the public API.
    #[must_use]
    pub fn new(repo: RepoRef) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            repo,
            token: None,
            user_agent: concat!("publish-flow/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_ms: 30_000,
        }
    }
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// GitHub forge client scoped to one repository.
pub struct GitHubForge {
    /// HTTP client with default headers installed.
    client: Client,
    /// REST base without a trailing slash.
    api_base: String,
    /// GraphQL endpoint.
    graphql_url: String,
    /// Repository coordinates.
    repo: RepoRef,
}

impl GitHubForge {
    /// Creates a client for the configured repository.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError::Transport`] when the base URL or token is
    /// unusable or the HTTP client cannot be created.
    pub fn new(config: GitHubConfig) -> Result<Self, ForgeError> {
        let api_base = config.api_base.trim_end_matches('/').to_string();
        Url::parse(&api_base)
            .map_err(|err| ForgeError::Transport(format!("invalid api base: {err}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_MEDIA_TYPE));
        headers.insert(
            HeaderName::from_static(API_VERSION_HEADER),
            HeaderValue::from_static(API_VERSION),
        );
        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                ForgeError::Transport("token is not a valid header value".to_string())
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent)
            .default_headers(headers)
            .build()
            .map_err(|err| ForgeError::Transport(format!("client build failed: {err}")))?;

        Ok(Self {
            client,
            graphql_url: graphql_endpoint(&api_base),
            api_base,
            repo: config.repo,
        })
    }

    /// Returns the repository the client is scoped to.
    #[must_use]
    pub const fn repo(&self) -> &RepoRef {
        &self.repo
    }

    /// Builds a repository-scoped REST URL.
    fn repo_url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}{path}", self.api_base, self.repo.owner, self.repo.name)
    }

    /// Starts a request, attaching a JSON body when given.
    fn request<B: Serialize>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<RequestBuilder, ForgeError> {
        debug!(%method, url, "forge request");
        let builder = self.client.request(method, url);
        match body {
            None => Ok(builder),
            Some(body) => {
                let bytes =
                    serde_json::to_vec(body).map_err(|err| ForgeError::Decode(err.to_string()))?;
                Ok(builder.header(CONTENT_TYPE, "application/json").body(bytes))
            }
        }
    }

    /// Sends a request and returns the raw success body.
    fn execute(&self, request: RequestBuilder) -> Result<Vec<u8>, ForgeError> {
        let mut response = request.send().map_err(|err| ForgeError::Transport(err.to_string()))?;
        let status = response.status();
        let body = read_response_limited(&mut response, MAX_RESPONSE_BYTES)?;
        if !status.is_success() {
            return Err(ForgeError::RequestFailed {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        Ok(body)
    }

    /// Sends a request and decodes the JSON response.
    fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ForgeError> {
        let body = self.execute(request)?;
        serde_json::from_slice(&body).map_err(|err| ForgeError::Decode(err.to_string()))
    }

    /// Sends a request whose response body is ignored.
    fn send<B: Serialize>(&self, method: Method, url: &str, body: &B) -> Result<(), ForgeError> {
        let request = self.request(method, url, Some(body))?;
        self.execute(request).map(|_| ())
    }

    /// Fetches every page of a listing endpoint.
    fn paginate<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<T>, ForgeError> {
        let per_page = PAGE_SIZE.to_string();
        let mut items = Vec::new();
        for page in 1 ..= MAX_PAGES {
            let page_text = page.to_string();
            let mut query: Vec<(&str, &str)> = params.to_vec();
            query.push(("per_page", per_page.as_str()));
            query.push(("page", page_text.as_str()));
            let url = Url::parse_with_params(&self.repo_url(path), &query)
                .map_err(|err| ForgeError::Transport(format!("invalid url: {err}")))?;
            let request = self.request::<Value>(Method::GET, url.as_str(), None)?;
            let batch: Vec<T> = self.fetch(request)?;
            let last = batch.len() < PAGE_SIZE;
            items.extend(batch);
            if last {
                break;
            }
        }
        Ok(items)
    }

    /// Runs a GraphQL mutation against a pull request node.
    fn pull_request_mutation(&self, mutation: &str, node_id: &str) -> Result<(), ForgeError> {
        let payload = json!({
            "query": mutation,
            "variables": {"id": node_id},
        });
        let request = self.request(Method::POST, &self.graphql_url, Some(&payload))?;
        let response: GraphQlResponse = self.fetch(request)?;
        if response.errors.is_empty() {
            return Ok(());
        }
        let messages: Vec<String> = response.errors.into_iter().map(|error| error.message).collect();
        Err(ForgeError::GraphQl(messages.join("; ")))
    }
}

impl ForgeClient for GitHubForge {
    fn owner(&self) -> &str {
        &self.repo.owner
    }

    fn get_issue(&self, number: u64) -> Result<Issue, ForgeError> {
        let request =
            self.request::<Value>(Method::GET, &self.repo_url(&format!("/issues/{number}")), None)?;
        let issue: WireIssue = self.fetch(request)?;
        Ok(issue.into())
    }

    fn update_issue(&self, number: u64, update: &IssueUpdate) -> Result<(), ForgeError> {
        self.send(Method::PATCH, &self.repo_url(&format!("/issues/{number}")), update)
    }

    fn list_issue_comments(&self, number: u64) -> Result<Vec<IssueComment>, ForgeError> {
        let comments: Vec<WireComment> =
            self.paginate(&format!("/issues/{number}/comments"), &[])?;
        Ok(comments.into_iter().map(IssueComment::from).collect())
    }

    fn create_issue_comment(&self, number: u64, body: &str) -> Result<(), ForgeError> {
        self.send(
            Method::POST,
            &self.repo_url(&format!("/issues/{number}/comments")),
            &json!({"body": body}),
        )
    }

    fn update_issue_comment(&self, comment_id: u64, body: &str) -> Result<(), ForgeError> {
        self.send(
            Method::PATCH,
            &self.repo_url(&format!("/issues/comments/{comment_id}")),
            &json!({"body": body}),
        )
    }

    fn create_pull_request(&self, request: &NewPullRequest) -> Result<PullRequest, ForgeError> {
        let builder = self.request(Method::POST, &self.repo_url("/pulls"), Some(request))?;
        let pull: WirePull = self.fetch(builder)?;
        Ok(pull.into())
    }

    fn update_pull_request_title(&self, number: u64, title: &str) -> Result<(), ForgeError> {
        self.send(
            Method::PATCH,
            &self.repo_url(&format!("/pulls/{number}")),
            &json!({"title": title}),
        )
    }

    fn list_pull_requests_by_head(&self, head: &str) -> Result<Vec<PullRequest>, ForgeError> {
        let pulls: Vec<WirePull> = self.paginate("/pulls", &[("state", "open"), ("head", head)])?;
        Ok(pulls.into_iter().map(PullRequest::from).collect())
    }

    fn list_open_pull_requests(&self) -> Result<Vec<PullRequest>, ForgeError> {
        let pulls: Vec<WirePull> = self.paginate("/pulls", &[("state", "open")])?;
        Ok(pulls.into_iter().map(PullRequest::from).collect())
    }

    fn add_labels(&self, number: u64, labels: &[String]) -> Result<(), ForgeError> {
        self.send(
            Method::POST,
            &self.repo_url(&format!("/issues/{number}/labels")),
            &json!({"labels": labels}),
        )
    }

    fn get_pull_request(&self, number: u64) -> Result<PullRequest, ForgeError> {
        let request =
            self.request::<Value>(Method::GET, &self.repo_url(&format!("/pulls/{number}")), None)?;
        let pull: WirePull = self.fetch(request)?;
        Ok(pull.into())
    }

    fn merge_pull_request(&self, number: u64, method: MergeMethod) -> Result<(), ForgeError> {
        self.send(
            Method::PUT,
            &self.repo_url(&format!("/pulls/{number}/merge")),
            &json!({"merge_method": method.as_str()}),
        )
    }

    fn convert_pull_request_to_draft(&self, node_id: &str) -> Result<(), ForgeError> {
        self.pull_request_mutation(CONVERT_TO_DRAFT_MUTATION, node_id)
    }

    fn mark_pull_request_ready(&self, node_id: &str) -> Result<(), ForgeError> {
        self.pull_request_mutation(MARK_READY_MUTATION, node_id)
    }
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Account reference.
#[derive(Debug, Deserialize)]
struct WireUser {
    /// Login name.
    login: String,
}

/// Label reference.
#[derive(Debug, Deserialize)]
struct WireLabel {
    /// Label name.
    name: String,
}

/// Issue payload.
#[derive(Debug, Deserialize)]
struct WireIssue {
    /// Issue number.
    number: u64,
    /// Title.
    title: String,
    /// Body, `null` when empty.
    #[serde(default)]
    body: Option<String>,
    /// Open or closed.
    state: IssueState,
    /// Author.
    #[serde(default)]
    user: Option<WireUser>,
    /// Labels.
    #[serde(default)]
    labels: Vec<WireLabel>,
    /// Present only on pull requests.
    #[serde(default)]
    pull_request: Option<Value>,
}

impl From<WireIssue> for Issue {
    fn from(wire: WireIssue) -> Self {
        Self {
            number: wire.number,
            title: wire.title,
            body: wire.body,
            state: wire.state,
            author: wire.user.map(|user| user.login),
            labels: wire.labels.into_iter().map(|label| label.name).collect(),
            is_pull_request: wire.pull_request.is_some(),
        }
    }
}

/// Issue comment payload.
#[derive(Debug, Deserialize)]
struct WireComment {
    /// Comment id.
    id: u64,
    /// Body.
    #[serde(default)]
    body: Option<String>,
    /// Author.
    #[serde(default)]
    user: Option<WireUser>,
    /// Author association.
    #[serde(default)]
    author_association: String,
}

impl From<WireComment> for IssueComment {
    fn from(wire: WireComment) -> Self {
        Self {
            id: wire.id,
            body: wire.body,
            author: wire.user.map(|user| user.login),
            author_association: wire.author_association,
        }
    }
}

/// Head branch reference.
#[derive(Debug, Deserialize)]
struct WireHead {
    /// Branch name.
    #[serde(rename = "ref")]
    ref_name: String,
}

/// Pull request payload.
#[derive(Debug, Deserialize)]
struct WirePull {
    /// Number.
    number: u64,
    /// Global node id.
    node_id: String,
    /// Title.
    title: String,
    /// Draft flag.
    #[serde(default)]
    draft: bool,
    /// Head branch.
    head: WireHead,
    /// Labels.
    #[serde(default)]
    labels: Vec<WireLabel>,
    /// Mergeability; only computed on single-pull responses.
    #[serde(default)]
    mergeable: Option<bool>,
    /// Merged flag; only present on single-pull responses.
    #[serde(default)]
    merged: Option<bool>,
    /// Merge timestamp; present on listings.
    #[serde(default)]
    merged_at: Option<String>,
}

impl From<WirePull> for PullRequest {
    fn from(wire: WirePull) -> Self {
        Self {
            number: wire.number,
            node_id: wire.node_id,
            title: wire.title,
            draft: wire.draft,
            head_ref: wire.head.ref_name,
            labels: wire.labels.into_iter().map(|label| label.name).collect(),
            mergeable: wire.mergeable,
            merged: wire.merged.unwrap_or(wire.merged_at.is_some()),
        }
    }
}

/// GraphQL response envelope.
#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    /// Reported errors.
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

/// GraphQL error entry.
#[derive(Debug, Deserialize)]
struct GraphQlError {
    /// Error message.
    message: String,
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Derives the GraphQL endpoint from a REST base.
///
/// Enterprise servers serve REST under `/api/v3` and GraphQL under
/// `/api/graphql`.
pub(crate) fn graphql_endpoint(api_base: &str) -> String {
    let trimmed = api_base.trim_end_matches('/');
    trimmed
        .strip_suffix("/v3")
        .map_or_else(|| format!("{trimmed}/graphql"), |prefix| format!("{prefix}/graphql"))
}

/// Extracts a readable message from an error body.
pub(crate) fn error_message(body: &[u8]) -> String {
    let message = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| value.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned());
    message.chars().take(MAX_ERROR_MESSAGE_CHARS).collect()
}

/// Reads the response body while enforcing a byte limit.
fn read_response_limited(
    response: &mut reqwest::blocking::Response,
    max_bytes: usize,
) -> Result<Vec<u8>, ForgeError> {
    let max_bytes_u64 = u64::try_from(max_bytes)
        .map_err(|_| ForgeError::Decode("response size limit exceeds u64".to_string()))?;
    if let Some(expected) = response.content_length()
        && expected > max_bytes_u64
    {
        return Err(ForgeError::Decode("forge response exceeds size limit".to_string()));
    }
    let mut buf = Vec::new();
    response
        .take(max_bytes_u64.saturating_add(1))
        .read_to_end(&mut buf)
        .map_err(|err| ForgeError::Transport(err.to_string()))?;
    if buf.len() > max_bytes {
        return Err(ForgeError::Decode("forge response exceeds size limit".to_string()));
    }
    Ok(buf)
}
