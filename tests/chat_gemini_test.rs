// ABOUTME: Integration tests for the chat endpoint against a mocked Gemini upstream
// ABOUTME: Verifies the wire format, persistence of replies, and token usage recording
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Anchor Systems

mod common;
mod helpers;

use anchor_site_server::llm::GeminiProvider;
use anchor_site_server::routes::{self, AppState};
use axum::{extract::State, Json, Router};
use helpers::axum_test::AxumTestRequest;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// Requests captured by the mock upstream
type Captured = Arc<Mutex<Vec<Value>>>;

/// Start a mock Gemini server; returns its base URL and the captured bodies
async fn start_mock_gemini(response: Value) -> (String, Captured) {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let state = (captured.clone(), Arc::new(response));

    async fn handle(
        State((captured, response)): State<(Captured, Arc<Value>)>,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        captured.lock().unwrap().push(body);
        Json(response.as_ref().clone())
    }

    let app = Router::new().fallback(handle).with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (format!("http://{addr}"), captured)
}

/// Build the API router with a Gemini provider aimed at the mock server
async fn create_gemini_app(base_url: &str) -> (axum::Router, anchor_site_server::database::Database)
{
    let database = common::create_test_database().await.unwrap();
    let provider = GeminiProvider::new("test-key").with_base_url(base_url);
    let state = AppState {
        database: database.clone(),
        gemini: Some(Arc::new(provider)),
    };
    (routes::router(state), database)
}

fn gemini_reply_with_usage() -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": "We build custom chatbots."}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {
            "promptTokenCount": 40,
            "candidatesTokenCount": 10,
            "totalTokenCount": 50
        }
    })
}

#[tokio::test]
async fn test_gemini_reply_is_persisted_with_usage() {
    let (base_url, captured) = start_mock_gemini(gemini_reply_with_usage()).await;
    let (app, _db) = create_gemini_app(&base_url).await;

    let response = AxumTestRequest::post("/api/chat")
        .json(&json!({
            "messages": [{"role": "user", "content": "What do you build?"}],
        }))
        .send(app.clone())
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["message"], "We build custom chatbots.");
    let conversation_id = body["conversationId"].as_str().unwrap().to_owned();

    let detail: Value = AxumTestRequest::get(&format!("/api/conversations/{conversation_id}"))
        .send(app)
        .await
        .json();
    let messages = detail["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[1]["metadata"]["model"], "gemini-2.5-flash-lite");

    // Usage row was written from usageMetadata
    assert_eq!(detail["tokenStats"]["request_count"], 1);
    assert_eq!(detail["tokenStats"]["total_prompt_tokens"], 40);
    assert_eq!(detail["tokenStats"]["total_completion_tokens"], 10);
    assert_eq!(detail["tokenStats"]["total_tokens"], 50);

    // The upstream saw exactly one call
    assert_eq!(captured.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_upstream_request_wire_format() {
    let (base_url, captured) = start_mock_gemini(gemini_reply_with_usage()).await;
    let (app, _db) = create_gemini_app(&base_url).await;

    AxumTestRequest::post("/api/chat")
        .json(&json!({
            "messages": [
                {"role": "user", "content": "hi"},
                {"role": "assistant", "content": "Hello!"},
                {"role": "user", "content": "tell me more"},
            ],
        }))
        .send(app)
        .await;

    let bodies = captured.lock().unwrap();
    let wire = &bodies[0];

    // System prompt travels separately from the transcript
    assert!(wire["systemInstruction"]["parts"][0]["text"]
        .as_str()
        .unwrap()
        .contains("Anchor Systems"));

    let contents = wire["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 3);
    assert_eq!(contents[0]["role"], "user");
    assert_eq!(contents[1]["role"], "model");
    assert_eq!(contents[2]["role"], "user");
    assert_eq!(contents[2]["parts"][0]["text"], "tell me more");

    assert_eq!(wire["generationConfig"]["temperature"], 0.7);
    assert_eq!(wire["generationConfig"]["maxOutputTokens"], 500);
}

#[tokio::test]
async fn test_missing_usage_metadata_writes_no_usage_row() {
    let reply = json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": "Hello!"}]},
            "finishReason": "STOP"
        }]
    });
    let (base_url, _captured) = start_mock_gemini(reply).await;
    let (app, _db) = create_gemini_app(&base_url).await;

    let body: Value = AxumTestRequest::post("/api/chat")
        .json(&json!({
            "messages": [{"role": "user", "content": "hi there"}],
        }))
        .send(app.clone())
        .await
        .json();
    let conversation_id = body["conversationId"].as_str().unwrap().to_owned();

    let detail: Value = AxumTestRequest::get(&format!("/api/conversations/{conversation_id}"))
        .send(app)
        .await
        .json();
    assert_eq!(detail["tokenStats"]["request_count"], 0);
    // The assistant reply itself still landed
    assert_eq!(detail["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_upstream_failure_collapses_to_opaque_500() {
    // Upstream returns a body with no candidates, which fails extraction
    let (base_url, _captured) = start_mock_gemini(json!({"candidates": []})).await;
    let (app, _db) = create_gemini_app(&base_url).await;

    let response = AxumTestRequest::post("/api/chat")
        .json(&json!({
            "messages": [{"role": "user", "content": "hi there"}],
        }))
        .send(app.clone())
        .await;

    assert_eq!(response.status(), 500);
    let body: Value = response.json();
    assert_eq!(body["error"], "Failed to process chat request");

    // The visitor's message was persisted before the upstream call
    let feed: Value = AxumTestRequest::get("/api/messages?role=user").send(app).await.json();
    assert_eq!(feed["pagination"]["total"], 1);
}
