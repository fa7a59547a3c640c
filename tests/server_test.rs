//! HTTP service tests over a real socket.

mod common;

use keycheck::test_utils::{TestServer, make_test_orchestrator};
use reqwest::StatusCode;
use wiremock::MockServer;

use common::fixtures::*;
use common::logger::TestLogger;

async fn post_validate(server: &TestServer, body: &serde_json::Value) -> (StatusCode, serde_json::Value) {
    let response = reqwest::Client::new()
        .post(server.url("/validate"))
        .json(body)
        .send()
        .await
        .unwrap();
    let status = response.status();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn validate_round_trip_with_header_usage() {
    let log = TestLogger::new("validate_round_trip_with_header_usage");
    let provider = MockServer::start().await;
    mount_openai_probe_with_limits(&provider, TEST_KEY, 1000, 900, "30s").await;
    let server = TestServer::start(make_test_orchestrator(&provider.uri()), 4096).await;

    let (status, body) = post_validate(&server, &validate_body("openai", TEST_KEY)).await;
    log.http_exchange("POST", "/validate", status.as_u16());

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isValid"], true);
    assert_eq!(body["hasRealTimeData"], true);
    assert_eq!(body["usageSource"], "headers");
    assert_eq!(body["tokenUsage"]["used"], 100);
    assert_eq!(body["tokenUsage"]["limit"], 1000);
    assert!(body["tokenUsage"]["resetDate"].is_string());
    keycheck::assert_not_contains!(body.to_string(), TEST_KEY);

    server.shutdown().await;
    log.finish_ok();
}

#[tokio::test]
async fn invalid_key_is_http_200() {
    let provider = MockServer::start().await;
    mount_probe(&provider, "/v1/models", 401).await;
    let server = TestServer::start(make_test_orchestrator(&provider.uri()), 4096).await;

    let (status, body) = post_validate(&server, &validate_body("cohere", TEST_KEY)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isValid"], false);
    assert!(body["error"].as_str().unwrap().contains("unauthorized"));
    assert!(body.get("tokenUsage").is_none());
    server.shutdown().await;
}

#[tokio::test]
async fn input_problems_are_http_400() {
    let provider = MockServer::start().await;
    let server = TestServer::start(make_test_orchestrator(&provider.uri()), 4096).await;

    let (status, body) = post_validate(&server, &validate_body("openai", "   ")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["isValid"], false);
    assert_eq!(body["error"], "Provider and API key are required");

    let (status, body) = post_validate(&server, &validate_body("mistral", TEST_KEY)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("mistral"));

    let (status, _) = post_validate(&server, &serde_json::json!("not an object")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(provider.received_requests().await.unwrap().is_empty());
    server.shutdown().await;
}

#[tokio::test]
async fn oversized_body_is_http_413() {
    let provider = MockServer::start().await;
    let server = TestServer::start(make_test_orchestrator(&provider.uri()), 256).await;

    let big_key = "k".repeat(2048);
    let (status, body) = post_validate(&server, &validate_body("openai", &big_key)).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["isValid"], false);
    server.shutdown().await;
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let server = TestServer::start(make_test_orchestrator("http://127.0.0.1:9"), 4096).await;
    let client = reqwest::Client::new();

    let health = client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    let body: serde_json::Value = health.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    let missing = client.get(server.url("/v2/validate")).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let wrong = client.put(server.url("/validate")).send().await.unwrap();
    assert_eq!(wrong.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(wrong.headers()["allow"], "POST");

    server.shutdown().await;
}

#[tokio::test]
async fn concurrent_requests_are_served() {
    let provider = MockServer::start().await;
    mount_probe(&provider, "/v1/models", 200).await;
    let server = TestServer::start(make_test_orchestrator(&provider.uri()), 4096).await;
    let client = reqwest::Client::new();

    let requests = (0..6).map(|i| {
        let key = if i % 2 == 0 { TEST_KEY } else { OTHER_KEY };
        client
            .post(server.url("/validate"))
            .json(&validate_body("llama", key))
            .send()
    });
    let mut handles = Vec::new();
    for request in requests {
        handles.push(tokio::spawn(request));
    }
    for handle in handles {
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["isValid"], true);
    }

    server.shutdown().await;
}
