// crates/publish-flow-providers/tests/github_forge_unit.rs
// ============================================================================
// Module: GitHub Forge Unit Tests
// Description: REST and GraphQL request shapes and response mapping.
// Purpose: Ensure forge calls match the API and failures keep their status.
// ============================================================================

//! ## Overview
//! Unit-level tests for the GitHub forge client against a scripted server:
//! - Authentication and API headers
//! - Wire payload mapping for issues, comments, and pull requests
//! - Pagination, unprocessable responses, and GraphQL errors

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

mod common;

use publish_flow_core::CloseReason;
use publish_flow_core::ForgeClient;
use publish_flow_core::ForgeError;
use publish_flow_core::IssueState;
use publish_flow_core::IssueUpdate;
use publish_flow_core::MergeMethod;
use publish_flow_core::NewPullRequest;
use publish_flow_core::RepoRef;
use publish_flow_providers::GitHubConfig;
use publish_flow_providers::GitHubForge;
use serde_json::Value;
use serde_json::json;

use crate::common::Reply;
use crate::common::ScriptedServer;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn forge(server: &ScriptedServer) -> GitHubForge {
    let mut config = GitHubConfig::new(RepoRef::parse("owner/registry").unwrap());
    config.api_base = server.base.clone();
    config.token = Some("secret-token".to_string());
    GitHubForge::new(config).unwrap()
}

fn wire_pull(number: u64, branch: &str) -> Value {
    json!({
        "number": number,
        "node_id": format!("PR_{number}"),
        "title": "Plugin: demo",
        "draft": false,
        "head": {"ref": branch, "sha": "abc"},
        "labels": [{"name": "Plugin", "color": "ffffff"}],
        "merged_at": null
    })
}

// ============================================================================
// SECTION: Issues
// ============================================================================

#[test]
fn get_issue_maps_payload_and_sends_auth_headers() {
    let server = ScriptedServer::start(vec![Reply::json(
        200,
        &json!({
            "number": 7,
            "title": "Plugin: demo",
            "body": "### 插件名称\n\ndemo",
            "state": "open",
            "user": {"login": "author", "id": 1},
            "labels": [{"name": "Plugin"}, {"name": "Publish"}],
            "pull_request": {"url": "https://example.invalid"}
        }),
    )]);

    let issue = forge(&server).get_issue(7).unwrap();
    let requests = server.finish();

    assert_eq!(issue.number, 7);
    assert_eq!(issue.state, IssueState::Open);
    assert_eq!(issue.author.as_deref(), Some("author"));
    assert_eq!(issue.labels, vec!["Plugin", "Publish"]);
    assert!(issue.is_pull_request);
    let request = &requests[0];
    assert_eq!(request.method, "GET");
    assert_eq!(request.url, "/repos/owner/registry/issues/7");
    assert_eq!(request.header("authorization"), Some("Bearer secret-token"));
    assert_eq!(request.header("accept"), Some("application/vnd.github+json"));
    assert_eq!(request.header("x-github-api-version"), Some("2022-11-28"));
}

#[test]
fn closing_an_issue_sends_only_state_fields() {
    let server = ScriptedServer::start(vec![Reply::json(200, &json!({}))]);

    forge(&server).update_issue(7, &IssueUpdate::close(CloseReason::NotPlanned)).unwrap();
    let requests = server.finish();

    assert_eq!(requests[0].method, "PATCH");
    assert_eq!(requests[0].json(), json!({"state": "closed", "state_reason": "not_planned"}));
}

#[test]
fn comments_are_paginated_in_order() {
    let first_page: Vec<Value> = (1 ..= 100)
        .map(|id| json!({"id": id, "body": "x", "user": {"login": "u"}, "author_association": "NONE"}))
        .collect();
    let server = ScriptedServer::start(vec![
        Reply::json(200, &Value::Array(first_page)),
        Reply::json(
            200,
            &json!([{"id": 101, "body": "/skip", "user": {"login": "owner"}, "author_association": "OWNER"}]),
        ),
    ]);

    let comments = forge(&server).list_issue_comments(7).unwrap();
    let requests = server.finish();

    assert_eq!(comments.len(), 101);
    assert_eq!(comments[100].body.as_deref(), Some("/skip"));
    assert_eq!(comments[100].author_association, "OWNER");
    assert!(requests[0].url.contains("page=1"));
    assert!(requests[1].url.contains("page=2"));
    assert!(requests[1].url.contains("per_page=100"));
}

#[test]
fn comment_create_and_update_hit_distinct_endpoints() {
    let server = ScriptedServer::start(vec![
        Reply::json(201, &json!({"id": 1})),
        Reply::json(200, &json!({"id": 1})),
    ]);
    let forge = forge(&server);

    forge.create_issue_comment(7, "report").unwrap();
    forge.update_issue_comment(55, "report v2").unwrap();
    let requests = server.finish();

    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].url, "/repos/owner/registry/issues/7/comments");
    assert_eq!(requests[0].json(), json!({"body": "report"}));
    assert_eq!(requests[1].method, "PATCH");
    assert_eq!(requests[1].url, "/repos/owner/registry/issues/comments/55");
}

// ============================================================================
// SECTION: Pull Requests
// ============================================================================

#[test]
fn create_pull_request_maps_response() {
    let server = ScriptedServer::start(vec![Reply::json(201, &wire_pull(12, "publish/issue7"))]);
    let request = NewPullRequest {
        title: "Plugin: demo".to_string(),
        body: "resolve #7".to_string(),
        base: "master".to_string(),
        head: "publish/issue7".to_string(),
    };

    let pull = forge(&server).create_pull_request(&request).unwrap();
    let requests = server.finish();

    assert_eq!(pull.number, 12);
    assert_eq!(pull.node_id, "PR_12");
    assert_eq!(pull.head_ref, "publish/issue7");
    assert!(!pull.merged);
    assert_eq!(
        requests[0].json(),
        json!({"title": "Plugin: demo", "body": "resolve #7", "base": "master", "head": "publish/issue7"})
    );
}

#[test]
fn duplicate_pull_request_is_unprocessable() {
    let server = ScriptedServer::start(vec![Reply::json(
        422,
        &json!({"message": "Validation Failed", "errors": [{"message": "A pull request already exists"}]}),
    )]);
    let request = NewPullRequest {
        title: "Plugin: demo".to_string(),
        body: "resolve #7".to_string(),
        base: "master".to_string(),
        head: "publish/issue7".to_string(),
    };

    let err = forge(&server).create_pull_request(&request).unwrap_err();
    server.finish();

    assert!(err.is_unprocessable());
    assert_eq!(
        err,
        ForgeError::RequestFailed {
            status: 422,
            message: "Validation Failed".to_string(),
        }
    );
}

#[test]
fn pull_requests_by_head_filter_on_owner_and_branch() {
    let server = ScriptedServer::start(vec![Reply::json(200, &json!([wire_pull(12, "publish/issue7")]))]);

    let pulls = forge(&server).list_pull_requests_by_head("owner:publish/issue7").unwrap();
    let requests = server.finish();

    assert_eq!(pulls.len(), 1);
    assert!(requests[0].url.starts_with("/repos/owner/registry/pulls?"));
    assert!(requests[0].url.contains("state=open"));
    assert!(requests[0].url.contains("head=owner%3Apublish%2Fissue7"));
}

#[test]
fn single_pull_request_reports_mergeability_and_merge_state() {
    let mut payload = wire_pull(12, "publish/issue7");
    payload["mergeable"] = json!(false);
    payload["merged"] = json!(true);
    payload["draft"] = json!(true);
    let server = ScriptedServer::start(vec![Reply::json(200, &payload)]);

    let pull = forge(&server).get_pull_request(12).unwrap();
    server.finish();

    assert_eq!(pull.mergeable, Some(false));
    assert!(pull.merged);
    assert!(pull.draft);
}

#[test]
fn listed_pull_requests_infer_merge_from_timestamp() {
    let mut merged = wire_pull(13, "publish/issue8");
    merged["merged_at"] = json!("2024-01-01T00:00:00Z");
    let server = ScriptedServer::start(vec![Reply::json(200, &json!([wire_pull(12, "publish/issue7"), merged]))]);

    let pulls = forge(&server).list_open_pull_requests().unwrap();
    server.finish();

    assert!(!pulls[0].merged);
    assert!(pulls[1].merged);
    assert_eq!(pulls[0].mergeable, None);
}

#[test]
fn labels_title_and_merge_requests() {
    let server = ScriptedServer::start(vec![
        Reply::json(200, &json!([])),
        Reply::json(200, &json!({})),
        Reply::json(200, &json!({"merged": true})),
    ]);
    let forge = forge(&server);

    forge.add_labels(12, &["Plugin".to_string()]).unwrap();
    forge.update_pull_request_title(12, "Plugin: demo (v0.1.0 -> v0.2.0)").unwrap();
    forge.merge_pull_request(12, MergeMethod::Rebase).unwrap();
    let requests = server.finish();

    assert_eq!(requests[0].url, "/repos/owner/registry/issues/12/labels");
    assert_eq!(requests[0].json(), json!({"labels": ["Plugin"]}));
    assert_eq!(requests[1].url, "/repos/owner/registry/pulls/12");
    assert_eq!(requests[1].json(), json!({"title": "Plugin: demo (v0.1.0 -> v0.2.0)"}));
    assert_eq!(requests[2].method, "PUT");
    assert_eq!(requests[2].url, "/repos/owner/registry/pulls/12/merge");
    assert_eq!(requests[2].json(), json!({"merge_method": "rebase"}));
}

#[test]
fn refused_merge_keeps_status() {
    let server = ScriptedServer::start(vec![Reply::json(405, &json!({"message": "Pull Request is not mergeable"}))]);

    let err = forge(&server).merge_pull_request(12, MergeMethod::Rebase).unwrap_err();
    server.finish();

    assert!(matches!(err, ForgeError::RequestFailed { status: 405, .. }));
}

// ============================================================================
// SECTION: GraphQL
// ============================================================================

#[test]
fn draft_transitions_use_graphql_mutations() {
    let server = ScriptedServer::start(vec![
        Reply::json(200, &json!({"data": {"convertPullRequestToDraft": {"clientMutationId": null}}})),
        Reply::json(200, &json!({"data": {"markPullRequestReadyForReview": {"clientMutationId": null}}})),
    ]);
    let forge = forge(&server);

    forge.convert_pull_request_to_draft("PR_12").unwrap();
    forge.mark_pull_request_ready("PR_12").unwrap();
    let requests = server.finish();

    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].url, "/graphql");
    let body = requests[0].json();
    assert!(body["query"].as_str().unwrap().contains("convertPullRequestToDraft"));
    assert_eq!(body["variables"], json!({"id": "PR_12"}));
    assert!(requests[1].json()["query"].as_str().unwrap().contains("markPullRequestReadyForReview"));
}

#[test]
fn graphql_errors_are_reported() {
    let server = ScriptedServer::start(vec![Reply::json(
        200,
        &json!({"data": null, "errors": [{"message": "Could not resolve to a node"}, {"message": "second"}]}),
    )]);

    let err = forge(&server).convert_pull_request_to_draft("PR_missing").unwrap_err();
    server.finish();

    assert_eq!(err, ForgeError::GraphQl("Could not resolve to a node; second".to_string()));
}

#[test]
fn undecodable_payload_is_a_decode_error() {
    let server = ScriptedServer::start(vec![Reply::json(200, &json!({"unexpected": true}))]);

    let err = forge(&server).get_issue(7).unwrap_err();
    server.finish();

    assert!(matches!(err, ForgeError::Decode(_)));
}
