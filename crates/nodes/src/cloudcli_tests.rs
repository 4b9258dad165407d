//! Dispatch tests for `CloudCliNode` against a wiremock Cloud CLI API.
//!
//! Each test mounts the endpoint it expects with `.expect(n)`, so the mock
//! server verifies on drop that exactly that many requests were made.

use client::{ClientConfig, CloudCliClient, Credentials};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::traits::ExecutionContext;
use crate::{CloudCliNode, ExecutableNode, NodeError};

const ENV_ID: &str = "550e8400-e29b-41d4-a716-446655440000";

fn node_for(server: &MockServer) -> CloudCliNode {
    let creds = Credentials::new(&server.uri(), "test-key").expect("valid credentials");
    CloudCliNode::new(CloudCliClient::new(creds, ClientConfig::default()).expect("client"))
}

fn ctx() -> ExecutionContext {
    ExecutionContext {
        execution_id: Uuid::new_v4(),
        item_index: 0,
    }
}

fn env(id: &str, name: &str, subdomain: &str, status: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "subdomain": subdomain,
        "status": status,
        "access_url": format!("https://{subdomain}.cloudcli.ai"),
    })
}

fn by_id(id: &str) -> Value {
    json!({ "mode": "id", "value": id })
}

// ============================================================
// Environment operations
// ============================================================

#[tokio::test]
async fn list_fans_out_one_item_per_environment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/environments"))
        .and(header("X-API-KEY", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "environments": [
                env("a1", "Alpha", "alpha", "running"),
                env("b2", "Beta", "beta", "stopped"),
                env("c3", "Gamma", "gamma", "error"),
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let out = node_for(&server)
        .execute(json!({ "resource": "environment", "operation": "list" }), &ctx())
        .await
        .unwrap();

    assert_eq!(out.len(), 3);
    assert_eq!(out[2], env("c3", "Gamma", "gamma", "error"));
    let received = server.received_requests().await.unwrap();
    assert_eq!(received[0].url.query(), None);
}

#[tokio::test]
async fn list_with_status_filter_and_empty_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/environments"))
        .and(query_param("status", "running"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "environments": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let out = node_for(&server)
        .execute(json!({ "operation": "list", "status": "running" }), &ctx())
        .await
        .unwrap();
    assert!(out.is_empty());
}

#[tokio::test]
async fn list_rejects_unknown_status_before_calling_api() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = node_for(&server)
        .execute(json!({ "operation": "list", "status": "paused" }), &ctx())
        .await
        .unwrap_err();
    assert!(matches!(err, NodeError::InvalidParameter { name, .. } if name == "status"));
}

#[tokio::test]
async fn get_start_stop_relay_responses_unmodified() {
    let server = MockServer::start().await;
    let detail = json!({ "id": ENV_ID, "status": "running", "custom": { "cpu": 4 } });
    Mock::given(method("GET"))
        .and(path(format!("/environments/{ENV_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail.clone()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/environments/{ENV_ID}/start")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "starting" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/environments/{ENV_ID}/stop")))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let node = node_for(&server);
    let get = node
        .execute(json!({ "operation": "get", "environmentId": by_id(ENV_ID) }), &ctx())
        .await
        .unwrap();
    assert_eq!(get, vec![detail]);

    let start = node
        .execute(json!({ "operation": "start", "environmentId": by_id(ENV_ID) }), &ctx())
        .await
        .unwrap();
    assert_eq!(start, vec![json!({ "message": "starting" })]);

    let stop = node
        .execute(json!({ "operation": "stop", "environmentId": by_id(ENV_ID) }), &ctx())
        .await
        .unwrap();
    assert_eq!(stop, vec![json!({})]);
}

#[tokio::test]
async fn list_mode_locator_skips_id_pattern() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/environments/Picked-From-List"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "Picked-From-List" })))
        .expect(1)
        .mount(&server)
        .await;

    let out = node_for(&server)
        .execute(
            json!({
                "operation": "get",
                "environmentId": { "mode": "list", "value": "Picked-From-List" }
            }),
            &ctx(),
        )
        .await
        .unwrap();
    assert_eq!(out[0]["id"], "Picked-From-List");
}

#[tokio::test]
async fn invalid_typed_id_is_rejected_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = node_for(&server)
        .execute(json!({ "operation": "get", "environmentId": by_id("../../admin") }), &ctx())
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid value for parameter 'environmentId': Not a valid environment ID"
    );
}

#[tokio::test]
async fn create_sends_only_truthy_optional_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/environments"))
        .and(body_json(json!({ "name": "X", "subdomain": "y" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(env("n1", "X", "y", "starting")))
        .expect(1)
        .mount(&server)
        .await;

    let out = node_for(&server)
        .execute(
            json!({
                "operation": "create",
                "name": "X",
                "subdomain": "y",
                "githubUrl": "",
            }),
            &ctx(),
        )
        .await
        .unwrap();
    assert_eq!(out, vec![env("n1", "X", "y", "starting")]);
}

#[tokio::test]
async fn create_includes_github_fields_when_given() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/environments"))
        .and(body_json(json!({
            "name": "Backend",
            "subdomain": "backend-1",
            "github_url": "https://github.com/acme/backend",
            "github_token": "ghp_abc",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "n2" })))
        .expect(1)
        .mount(&server)
        .await;

    node_for(&server)
        .execute(
            json!({
                "operation": "create",
                "name": "Backend",
                "subdomain": "backend-1",
                "githubUrl": "https://github.com/acme/backend",
                "githubToken": "ghp_abc",
            }),
            &ctx(),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn create_requires_name() {
    let server = MockServer::start().await;
    let err = node_for(&server)
        .execute(json!({ "operation": "create", "subdomain": "y" }), &ctx())
        .await
        .unwrap_err();
    assert!(matches!(err, NodeError::MissingParameter(name) if name == "name"));
}

#[tokio::test]
async fn delete_always_yields_deleted_true() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("/environments/{ENV_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "bye", "id": ENV_ID })))
        .expect(1)
        .mount(&server)
        .await;

    let out = node_for(&server)
        .execute(json!({ "operation": "delete", "environmentId": by_id(ENV_ID) }), &ctx())
        .await
        .unwrap();
    assert_eq!(out, vec![json!({ "deleted": true })]);
}

#[tokio::test]
async fn delete_ignores_empty_and_text_bodies() {
    for response in [
        ResponseTemplate::new(204),
        ResponseTemplate::new(200).set_body_string("Environment deleted"),
    ] {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(format!("/environments/{ENV_ID}")))
            .respond_with(response)
            .expect(1)
            .mount(&server)
            .await;

        let out = node_for(&server)
            .execute(json!({ "operation": "delete", "environmentId": by_id(ENV_ID) }), &ctx())
            .await
            .unwrap();
        assert_eq!(out, vec![json!({ "deleted": true })]);
    }
}

#[tokio::test]
async fn get_relays_empty_body_as_object_and_text_as_string() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/environments/{ENV_ID}")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/environments/abc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ready"))
        .expect(1)
        .mount(&server)
        .await;

    let node = node_for(&server);
    let out = node
        .execute(json!({ "operation": "get", "environmentId": by_id(ENV_ID) }), &ctx())
        .await
        .unwrap();
    assert_eq!(out, vec![json!({})]);

    let out = node
        .execute(json!({ "operation": "get", "environmentId": by_id("abc-1") }), &ctx())
        .await
        .unwrap();
    assert_eq!(out, vec![json!("ready")]);
}

#[tokio::test]
async fn http_failure_surfaces_body_as_details() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/environments/{ENV_ID}/start")))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({ "error": "Environment is already running" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = node_for(&server)
        .execute(json!({ "operation": "start", "environmentId": by_id(ENV_ID) }), &ctx())
        .await
        .unwrap_err();
    assert_eq!(err.details(), json!({ "error": "Environment is already running" }));
    assert!(err.to_string().contains("409"));
}

// ============================================================
// Agent operations
// ============================================================

#[tokio::test]
async fn agent_execute_posts_minimal_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/agent/execute"))
        .and(body_json(json!({
            "environmentId": ENV_ID,
            "projectName": "backend",
            "message": "Add user authentication with JWT",
            "provider": "claude",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let out = node_for(&server)
        .execute(
            json!({
                "resource": "agent",
                "agentEnvironmentId": by_id(ENV_ID),
                "projectName": "backend",
                "message": "Add user authentication with JWT",
                "additionalOptions": { "createBranch": false, "githubToken": "" },
            }),
            &ctx(),
        )
        .await
        .unwrap();
    assert_eq!(out, vec![json!({ "success": true })]);
}

#[tokio::test]
async fn agent_execute_sends_options_and_derives_project_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/agent/execute"))
        .and(body_json(json!({
            "environmentId": "abc-123",
            "projectName": "backend",
            "message": "Fix the flaky test",
            "provider": "cursor",
            "createBranch": true,
            "createPR": true,
            "githubToken": "ghp_pr",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "pr": 7 })))
        .expect(1)
        .mount(&server)
        .await;

    let out = node_for(&server)
        .execute(
            json!({
                "resource": "agent",
                "operation": "execute",
                "agentEnvironmentId": {
                    "mode": "list",
                    "value": "abc-123",
                    "cachedResultName": "backend (running)"
                },
                "message": "Fix the flaky test",
                "provider": "cursor",
                "additionalOptions": {
                    "createBranch": true,
                    "createPR": true,
                    "githubToken": "ghp_pr"
                },
            }),
            &ctx(),
        )
        .await
        .unwrap();
    assert_eq!(out[0]["pr"], 7);
}

#[tokio::test]
async fn agent_execute_without_project_name_or_label_is_rejected() {
    let server = MockServer::start().await;
    let err = node_for(&server)
        .execute(
            json!({
                "resource": "agent",
                "agentEnvironmentId": by_id("abc"),
                "message": "hi",
            }),
            &ctx(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, NodeError::MissingParameter(name) if name == "projectName"));
}

// ============================================================
// Unknown selections
// ============================================================

#[tokio::test]
async fn unknown_resource_and_operation_fail_per_item() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let node = node_for(&server);
    let err = node
        .execute(json!({ "resource": "database", "operation": "list" }), &ctx())
        .await
        .unwrap_err();
    assert!(matches!(err, NodeError::UnknownResource(r) if r == "database"));

    let err = node
        .execute(json!({ "resource": "environment", "operation": "reboot" }), &ctx())
        .await
        .unwrap_err();
    assert!(matches!(err, NodeError::UnknownOperation(o) if o == "reboot"));
}

// ============================================================
// Environment search
// ============================================================

async fn search_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/environments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "environments": [
                env("0abc", "Payments", "pay", "running"),
                env("1def", "ABCorp Site", "site", "stopped"),
                env("2fed", "Docs", "docs-abc", "starting"),
                env("3aaa", "Blog", "blog", "error"),
            ]
        })))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn search_filters_on_name_id_and_subdomain() {
    let server = search_server().await;
    let results = node_for(&server).search_environments(Some("ABC")).await.unwrap();

    let values: Vec<&str> = results.iter().map(|r| r.value.as_str()).collect();
    assert_eq!(values, vec!["0abc", "1def", "2fed"]);
    assert_eq!(results[1].name, "ABCorp Site (stopped)");
    assert_eq!(results[1].url.as_deref(), Some("https://site.cloudcli.ai"));
}

#[tokio::test]
async fn search_without_filter_returns_everything() {
    let server = search_server().await;
    let node = node_for(&server);
    assert_eq!(node.search_environments(None).await.unwrap().len(), 4);
    assert_eq!(node.search_environments(Some("")).await.unwrap().len(), 4);

    let via_trait = node.list_search("searchEnvironments", Some("blog")).await.unwrap();
    assert_eq!(via_trait.len(), 1);
    assert_eq!(via_trait[0].name, "Blog (error)");
}

#[tokio::test]
async fn search_keeps_records_with_malformed_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/environments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "environments": [
                { "id": "abc-1", "name": null, "subdomain": "pay", "status": "running" },
                { "id": 42, "name": "Numbered", "subdomain": "num" },
            ]
        })))
        .mount(&server)
        .await;

    let node = node_for(&server);
    let results = node.search_environments(Some("pay")).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].value, "abc-1");
    assert_eq!(results[0].name, " (running)");

    let results = node.search_environments(Some("num")).await.unwrap();
    assert_eq!(results[0].value, "42");
    assert_eq!(results[0].name, "Numbered (unknown)");
}

#[tokio::test]
async fn search_propagates_http_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/environments"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = node_for(&server).search_environments(Some("x")).await.unwrap_err();
    assert!(matches!(err, NodeError::Api(_)));

    let err = node_for(&server).list_search("searchRepos", None).await.unwrap_err();
    assert!(matches!(err, NodeError::UnknownSearchMethod(_)));
}
