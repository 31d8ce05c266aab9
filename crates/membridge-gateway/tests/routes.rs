// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use membridge_gateway::{build_router, AuthConfig, GatewayState};
use membridge_test_utils::TestHarness;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn app(harness: &TestHarness, token: Option<&str>) -> Router {
    build_router(
        GatewayState::new(harness.bridge.clone()),
        AuthConfig {
            bearer_token: token.map(str::to_string),
        },
    )
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn root_reports_status_and_count() {
    let h = TestHarness::new().await.unwrap();
    let app = app(&h, None).await;
    let (status, body) = send(&app, Request::get("/").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "running", "oracle": "mock-oracle", "count": 0}));
}

#[tokio::test]
async fn add_search_update_delete_flow() {
    let h = TestHarness::new().await.unwrap();
    let app = app(&h, None).await;

    let (status, body) = send(
        &app,
        post(
            "/add_memory",
            json!({"content": "Speaks fluent Portuguese", "tags": ["language"], "source": "chatgpt"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = send(
        &app,
        post("/api/search", json!({"user_input": "Speaks fluent Portuguese", "n_results": 3})),
    )
    .await;
    assert_eq!(body["results"][0]["id"], id.as_str());
    assert_eq!(body["results"][0]["metadata"]["source"], "chatgpt");

    let (status, _) = send(
        &app,
        post("/api/update", json!({"memory_id": id, "new_content": "Speaks fluent Spanish"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, post("/api/delete", json!({"memory_id": id}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let (status, body) = send(&app, post("/api/delete", json!({"memory_id": id}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains(&id));
}

#[tokio::test]
async fn validation_errors_are_422() {
    let h = TestHarness::new().await.unwrap();
    let app = app(&h, None).await;
    let (status, body) = send(&app, post("/add_memory", json!({"content": "   "}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("content"));
}

#[tokio::test]
async fn ingest_returns_decision_and_action() {
    let h = TestHarness::builder()
        .with_failing_oracle("quota exceeded")
        .build()
        .await
        .unwrap();
    let app = app(&h, None).await;

    let (status, body) = send(
        &app,
        post(
            "/api/gatekeeper/ingest",
            json!({"text": "Has two kids", "source": "claude", "source_url": "https://claude.example/c/1"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["decision"]["intent"], "SAVE");
    assert_eq!(body["decision"]["tags"], json!(["raw_fallback"]));
    assert_eq!(body["context_provided"], false);
    assert_eq!(body["action_result"]["status"], "saved");
}

#[tokio::test]
async fn bearer_token_guards_everything_but_health() {
    let h = TestHarness::new().await.unwrap();
    let app = app(&h, Some("s3cret")).await;

    let (status, _) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Request::get("/").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let authed = Request::get("/")
        .header("authorization", "Bearer s3cret")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, authed).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn tools_are_listed_and_invocable() {
    let h = TestHarness::new().await.unwrap();
    let app = app(&h, None).await;

    let (_, body) = send(&app, Request::get("/v1/tools").body(Body::empty()).unwrap()).await;
    assert_eq!(body["tools"].as_array().unwrap().len(), 5);

    let (status, body) = send(
        &app,
        post("/v1/tools/save_memory", json!({"content": "Prefers aisle seats"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_error"], false);

    let (status, _) = send(&app, post("/v1/tools/launch_rockets", json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
