// crates/publish-flow-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared doubles and builders for publish-flow-core tests.
// Purpose: Drive the workflow without a forge, git, or network.
// Dependencies: publish-flow-core, serde_json
// ============================================================================

//! ## Overview
//! Recording doubles for every side-effect interface plus builders for
//! plugin issue bodies and load-test contexts.

#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test helpers are selectively used across suites."
)]

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::PoisonError;

use publish_flow_core::CommandError;
use publish_flow_core::CommandOutput;
use publish_flow_core::CommandRunner;
use publish_flow_core::ForgeClient;
use publish_flow_core::ForgeError;
use publish_flow_core::Issue;
use publish_flow_core::IssueComment;
use publish_flow_core::IssueState;
use publish_flow_core::IssueUpdate;
use publish_flow_core::LoadTestContext;
use publish_flow_core::MergeMethod;
use publish_flow_core::NewPullRequest;
use publish_flow_core::PluginTestMetadata;
use publish_flow_core::ProbeStatus;
use publish_flow_core::PullRequest;
use publish_flow_core::ReachabilityProbe;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Builders
// ============================================================================

/// Project home page used by the fixtures.
pub const HOME_PAGE: &str = "https://github.com/author/nonebot-plugin-demo";

/// Builds a plugin issue body from the answers of the issue form.
pub fn plugin_body(name: &str, module: &str, module_path: &str, url: &str, is_dir: &str) -> String {
    format!(
        "### 插件名称\n\n{name}\n\n### 模块名称\n\n{module}\n\n### 模块路径\n\n{module_path}\n\n\
         ### 仓库地址\n\n{url}\n\n### 是否为目录\n\n{is_dir}\n\n### 插件配置项\n\n```dotenv\nDEMO=1\n```\n"
    )
}

/// Builds the default valid plugin body.
pub fn demo_body() -> String {
    plugin_body("demo", "nonebot_plugin_demo", "src/plugins/demo", HOME_PAGE, "否")
}

/// Metadata returned by a successful load test.
pub fn demo_metadata(version: &str) -> PluginTestMetadata {
    PluginTestMetadata {
        description: "A demo plugin".to_string(),
        usage: "/demo".to_string(),
        plugin_type: "NORMAL".to_string(),
        version: version.to_string(),
    }
}

/// Load test that passed and reported metadata.
pub fn passed_load_test(version: &str) -> LoadTestContext {
    LoadTestContext {
        skip: false,
        passed: true,
        output: "loaded".to_string(),
        metadata: Some(demo_metadata(version)),
    }
}

/// Load test that failed without metadata.
pub fn failed_load_test(output: &str) -> LoadTestContext {
    LoadTestContext {
        skip: false,
        passed: false,
        output: output.to_string(),
        metadata: None,
    }
}

/// Registry entry as the store would hold it for the demo plugin.
pub fn demo_entry(version: &str) -> Map<String, Value> {
    let value = json!({
        "module": "nonebot_plugin_demo",
        "module_path": "src/plugins/demo",
        "description": "A demo plugin",
        "usage": "/demo",
        "author": "author",
        "version": version,
        "plugin_type": "NORMAL",
        "is_dir": false,
        "github_url": HOME_PAGE,
    });
    match value {
        Value::Object(map) => map,
        _ => unreachable!("fixture is an object"),
    }
}

/// Open plugin issue authored by `author`.
pub fn plugin_issue(number: u64, title: &str, body: &str) -> Issue {
    Issue {
        number,
        title: title.to_string(),
        body: Some(body.to_string()),
        state: IssueState::Open,
        author: Some("author".to_string()),
        labels: vec!["Plugin".to_string()],
        is_pull_request: false,
    }
}

/// Open plugin pull request for `publish/issue{issue}`.
pub fn plugin_pull(number: u64, issue: u64, title: &str) -> PullRequest {
    PullRequest {
        number,
        node_id: format!("PR_{number}"),
        title: title.to_string(),
        draft: false,
        head_ref: format!("publish/issue{issue}"),
        labels: vec!["Plugin".to_string()],
        mergeable: Some(true),
        merged: false,
    }
}

// ============================================================================
// SECTION: Command Runner
// ============================================================================

/// Runner state.
#[derive(Debug, Default)]
struct RunnerState {
    /// Executed command lines.
    calls: Vec<String>,
    /// Remaining failures per command-line prefix.
    failures: Vec<(String, usize)>,
    /// Scripted stdout per command-line prefix.
    outputs: HashMap<String, String>,
}

/// Command runner that records calls and replays scripted results.
#[derive(Debug, Default)]
pub struct RecordingCommandRunner {
    /// Shared state.
    state: Mutex<RunnerState>,
}

impl RecordingCommandRunner {
    /// Creates a runner where every command succeeds with empty output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the next `times` commands starting with `prefix`.
    pub fn fail(&self, prefix: &str, times: usize) {
        self.lock().failures.push((prefix.to_string(), times));
    }

    /// Returns `stdout` for commands starting with `prefix`.
    pub fn respond(&self, prefix: &str, stdout: &str) {
        self.lock().outputs.insert(prefix.to_string(), stdout.to_string());
    }

    /// Returns every executed command line.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Returns executed command lines starting with `prefix`.
    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls().into_iter().filter(|call| call.starts_with(prefix)).collect()
    }

    /// Forgets recorded calls.
    pub fn reset_calls(&self) {
        self.lock().calls.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RunnerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CommandRunner for RecordingCommandRunner {
    fn run(&self, args: &[&str]) -> Result<CommandOutput, CommandError> {
        let line = args.join(" ");
        let mut state = self.lock();
        state.calls.push(line.clone());
        if let Some((_, remaining)) = state
            .failures
            .iter_mut()
            .find(|(prefix, remaining)| *remaining > 0 && line.starts_with(prefix.as_str()))
        {
            *remaining -= 1;
            return Err(CommandError::Failed {
                command: line,
                status: Some(1),
                stdout: String::new(),
                stderr: "scripted failure".to_string(),
            });
        }
        let stdout = state
            .outputs
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, stdout)| stdout.clone())
            .unwrap_or_default();
        Ok(CommandOutput {
            stdout,
            stderr: String::new(),
        })
    }
}

// ============================================================================
// SECTION: Probe
// ============================================================================

/// Probe answering from a fixed table, `200` for unknown URLs.
#[derive(Debug, Default)]
pub struct StaticProbe {
    /// Status by URL.
    statuses: HashMap<String, ProbeStatus>,
    /// Probed URLs in order.
    calls: Mutex<Vec<String>>,
}

impl StaticProbe {
    /// Creates a probe where every URL is reachable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `status` for `url`.
    pub fn with_status(mut self, url: &str, status: ProbeStatus) -> Self {
        self.statuses.insert(url.to_string(), status);
        self
    }

    /// Returns probed URLs in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl ReachabilityProbe for StaticProbe {
    fn probe(&self, url: &str) -> ProbeStatus {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(url.to_string());
        self.statuses.get(url).cloned().unwrap_or_else(|| ProbeStatus::http(200, "OK"))
    }
}

// ============================================================================
// SECTION: Forge
// ============================================================================

/// Forge state.
#[derive(Debug, Default)]
struct ForgeState {
    /// Issues by number.
    issues: BTreeMap<u64, Issue>,
    /// Comments by issue number.
    comments: BTreeMap<u64, Vec<IssueComment>>,
    /// Pull requests by number.
    pulls: BTreeMap<u64, PullRequest>,
    /// Next identifier for created objects.
    next_id: u64,
    /// Mutating calls in order.
    calls: Vec<String>,
}

/// In-memory forge recording every mutation.
#[derive(Debug)]
pub struct InMemoryForge {
    /// Shared state.
    state: Mutex<ForgeState>,
}

impl Default for InMemoryForge {
    fn default() -> Self {
        Self {
            state: Mutex::new(ForgeState {
                next_id: 100,
                ..ForgeState::default()
            }),
        }
    }
}

impl InMemoryForge {
    /// Creates an empty forge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an issue.
    pub fn put_issue(&self, issue: Issue) {
        self.lock().issues.insert(issue.number, issue);
    }

    /// Stores a pull request.
    pub fn put_pull(&self, pull: PullRequest) {
        self.lock().pulls.insert(pull.number, pull);
    }

    /// Adds a comment to an issue.
    pub fn put_comment(&self, issue: u64, body: &str, author: &str, association: &str) {
        let mut state = self.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.comments.entry(issue).or_default().push(IssueComment {
            id,
            body: Some(body.to_string()),
            author: Some(author.to_string()),
            author_association: association.to_string(),
        });
    }

    /// Returns the stored issue.
    pub fn issue(&self, number: u64) -> Issue {
        self.lock().issues.get(&number).cloned().expect("issue exists")
    }

    /// Returns the stored comments of an issue.
    pub fn comments(&self, issue: u64) -> Vec<IssueComment> {
        self.lock().comments.get(&issue).cloned().unwrap_or_default()
    }

    /// Returns the stored pull request.
    pub fn get_pull(&self, number: u64) -> PullRequest {
        self.lock().pulls.get(&number).cloned().expect("pull exists")
    }

    /// Returns every stored pull request.
    pub fn pulls(&self) -> Vec<PullRequest> {
        self.lock().pulls.values().cloned().collect()
    }

    /// Returns mutating calls in order.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Forgets recorded calls.
    pub fn reset_calls(&self) {
        self.lock().calls.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ForgeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Not-found error.
fn not_found(what: &str) -> ForgeError {
    ForgeError::RequestFailed {
        status: 404,
        message: format!("{what} not found"),
    }
}

impl ForgeClient for InMemoryForge {
    fn owner(&self) -> &str {
        "owner"
    }

    fn get_issue(&self, number: u64) -> Result<Issue, ForgeError> {
        self.lock().issues.get(&number).cloned().ok_or_else(|| not_found("issue"))
    }

    fn update_issue(&self, number: u64, update: &IssueUpdate) -> Result<(), ForgeError> {
        let mut state = self.lock();
        state.calls.push(format!("update_issue {number}"));
        let issue = state.issues.get_mut(&number).ok_or_else(|| not_found("issue"))?;
        if let Some(title) = &update.title {
            issue.title.clone_from(title);
        }
        if let Some(body) = &update.body {
            issue.body = Some(body.clone());
        }
        if let Some(issue_state) = update.state {
            issue.state = issue_state;
        }
        Ok(())
    }

    fn list_issue_comments(&self, number: u64) -> Result<Vec<IssueComment>, ForgeError> {
        Ok(self.comments(number))
    }

    fn create_issue_comment(&self, number: u64, body: &str) -> Result<(), ForgeError> {
        self.lock().calls.push(format!("create_issue_comment {number}"));
        self.put_comment(number, body, "publish-flow[bot]", "NONE");
        Ok(())
    }

    fn update_issue_comment(&self, comment_id: u64, body: &str) -> Result<(), ForgeError> {
        let mut state = self.lock();
        state.calls.push(format!("update_issue_comment {comment_id}"));
        let comment = state
            .comments
            .values_mut()
            .flatten()
            .find(|comment| comment.id == comment_id)
            .ok_or_else(|| not_found("comment"))?;
        comment.body = Some(body.to_string());
        Ok(())
    }

    fn create_pull_request(&self, request: &NewPullRequest) -> Result<PullRequest, ForgeError> {
        let mut state = self.lock();
        state.calls.push(format!("create_pull_request {}", request.head));
        if state.pulls.values().any(|pull| pull.head_ref == request.head && !pull.merged) {
            return Err(ForgeError::RequestFailed {
                status: 422,
                message: "A pull request already exists".to_string(),
            });
        }
        state.next_id += 1;
        let number = state.next_id;
        let pull = PullRequest {
            number,
            node_id: format!("PR_{number}"),
            title: request.title.clone(),
            draft: false,
            head_ref: request.head.clone(),
            labels: Vec::new(),
            mergeable: Some(true),
            merged: false,
        };
        state.pulls.insert(number, pull.clone());
        Ok(pull)
    }

    fn update_pull_request_title(&self, number: u64, title: &str) -> Result<(), ForgeError> {
        let mut state = self.lock();
        state.calls.push(format!("update_pull_request_title {number}"));
        let pull = state.pulls.get_mut(&number).ok_or_else(|| not_found("pull"))?;
        pull.title = title.to_string();
        Ok(())
    }

    fn list_pull_requests_by_head(&self, head: &str) -> Result<Vec<PullRequest>, ForgeError> {
        let branch = head.split_once(':').map_or(head, |(_, branch)| branch);
        Ok(self
            .lock()
            .pulls
            .values()
            .filter(|pull| pull.head_ref == branch && !pull.merged)
            .cloned()
            .collect())
    }

    fn list_open_pull_requests(&self) -> Result<Vec<PullRequest>, ForgeError> {
        Ok(self.lock().pulls.values().filter(|pull| !pull.merged).cloned().collect())
    }

    fn add_labels(&self, number: u64, labels: &[String]) -> Result<(), ForgeError> {
        let mut state = self.lock();
        state.calls.push(format!("add_labels {number} {}", labels.join(",")));
        let pull = state.pulls.get_mut(&number).ok_or_else(|| not_found("pull"))?;
        pull.labels.extend(labels.iter().cloned());
        Ok(())
    }

    fn get_pull_request(&self, number: u64) -> Result<PullRequest, ForgeError> {
        self.lock().pulls.get(&number).cloned().ok_or_else(|| not_found("pull"))
    }

    fn merge_pull_request(&self, number: u64, method: MergeMethod) -> Result<(), ForgeError> {
        let mut state = self.lock();
        state.calls.push(format!("merge_pull_request {number} {}", method.as_str()));
        let pull = state.pulls.get_mut(&number).ok_or_else(|| not_found("pull"))?;
        pull.merged = true;
        Ok(())
    }

    fn convert_pull_request_to_draft(&self, node_id: &str) -> Result<(), ForgeError> {
        let mut state = self.lock();
        state.calls.push(format!("convert_pull_request_to_draft {node_id}"));
        let pull = state
            .pulls
            .values_mut()
            .find(|pull| pull.node_id == node_id)
            .ok_or_else(|| not_found("pull"))?;
        pull.draft = true;
        Ok(())
    }

    fn mark_pull_request_ready(&self, node_id: &str) -> Result<(), ForgeError> {
        let mut state = self.lock();
        state.calls.push(format!("mark_pull_request_ready {node_id}"));
        let pull = state
            .pulls
            .values_mut()
            .find(|pull| pull.node_id == node_id)
            .ok_or_else(|| not_found("pull"))?;
        pull.draft = false;
        Ok(())
    }
}
