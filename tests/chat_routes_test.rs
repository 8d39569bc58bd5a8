// ABOUTME: Integration tests for the chat endpoint in fallback mode
// ABOUTME: Covers validation, canned replies, and conversation persistence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Anchor Systems

mod common;
mod helpers;

use helpers::axum_test::AxumTestRequest;
use serde_json::{json, Value};

#[tokio::test]
async fn test_missing_messages_returns_400() {
    let (app, _db) = common::create_test_app().await.unwrap();

    let response = AxumTestRequest::post("/api/chat")
        .json(&json!({"sessionId": "abc"}))
        .send(app)
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"], "Messages array is required");
}

#[tokio::test]
async fn test_non_array_messages_returns_400() {
    let (app, _db) = common::create_test_app().await.unwrap();

    let response = AxumTestRequest::post("/api/chat")
        .json(&json!({"messages": "not a list"}))
        .send(app)
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"], "Messages array is required");
}

#[tokio::test]
async fn test_empty_messages_returns_400() {
    let (app, _db) = common::create_test_app().await.unwrap();

    let response = AxumTestRequest::post("/api/chat")
        .json(&json!({"messages": []}))
        .send(app)
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"], "Messages array cannot be empty");
}

#[tokio::test]
async fn test_fallback_reply_for_pricing_question() {
    let (app, _db) = common::create_test_app().await.unwrap();

    let response = AxumTestRequest::post("/api/chat")
        .json(&json!({
            "messages": [{"role": "user", "content": "What does a chatbot cost?"}],
        }))
        .send(app)
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    // Pricing keyword outranks the chatbot keyword
    assert!(body["message"].as_str().unwrap().contains("$2,000-$4,000"));
    assert!(body["conversationId"].is_string());
}

#[tokio::test]
async fn test_first_message_creates_conversation_with_transcript() {
    let (app, _db) = common::create_test_app().await.unwrap();

    let response = AxumTestRequest::post("/api/chat")
        .header("user-agent", "integration-test-agent")
        .json(&json!({
            "messages": [{"role": "user", "content": "hello"}],
            "sessionId": "session-1",
        }))
        .send(app.clone())
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    let conversation_id = body["conversationId"].as_str().unwrap().to_owned();

    let detail: Value = AxumTestRequest::get(&format!("/api/conversations/{conversation_id}"))
        .send(app)
        .await
        .json();

    assert_eq!(detail["conversation"]["title"], "hello");
    assert_eq!(detail["conversation"]["session_id"], "session-1");
    assert_eq!(
        detail["conversation"]["metadata"]["user_agent"],
        "integration-test-agent"
    );

    // User message first, fallback assistant reply second
    let messages = detail["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["content"], "hello");
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[1]["metadata"]["fallback"], true);

    // No LLM call was made, so no usage rows
    assert_eq!(detail["tokenStats"]["request_count"], 0);
}

#[tokio::test]
async fn test_follow_up_appends_to_existing_conversation() {
    let (app, _db) = common::create_test_app().await.unwrap();

    let first: Value = AxumTestRequest::post("/api/chat")
        .json(&json!({
            "messages": [{"role": "user", "content": "hello"}],
        }))
        .send(app.clone())
        .await
        .json();
    let conversation_id = first["conversationId"].as_str().unwrap().to_owned();

    let second: Value = AxumTestRequest::post("/api/chat")
        .json(&json!({
            "messages": [
                {"role": "user", "content": "hello"},
                {"role": "assistant", "content": first["message"]},
                {"role": "user", "content": "tell me about rag"},
            ],
            "conversationId": conversation_id,
        }))
        .send(app.clone())
        .await
        .json();

    assert_eq!(second["conversationId"], conversation_id.as_str());
    assert!(second["message"]
        .as_str()
        .unwrap()
        .contains("Retrieval-Augmented Generation"));

    let detail: Value = AxumTestRequest::get(&format!("/api/conversations/{conversation_id}"))
        .send(app)
        .await
        .json();
    // Two exchanges: 2 user messages + 2 assistant replies
    assert_eq!(detail["messages"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_long_first_message_clips_title() {
    let (app, _db) = common::create_test_app().await.unwrap();

    let long_message = "a".repeat(300);
    let body: Value = AxumTestRequest::post("/api/chat")
        .json(&json!({
            "messages": [{"role": "user", "content": long_message}],
        }))
        .send(app.clone())
        .await
        .json();
    let conversation_id = body["conversationId"].as_str().unwrap();

    let detail: Value = AxumTestRequest::get(&format!("/api/conversations/{conversation_id}"))
        .send(app)
        .await
        .json();
    assert_eq!(detail["conversation"]["title"].as_str().unwrap().len(), 100);
}

#[tokio::test]
async fn test_unknown_conversation_id_collapses_to_opaque_500() {
    let (app, _db) = common::create_test_app().await.unwrap();

    // Foreign key violation on message insert; the client sees no detail
    let response = AxumTestRequest::post("/api/chat")
        .json(&json!({
            "messages": [{"role": "user", "content": "hello"}],
            "conversationId": "does-not-exist",
        }))
        .send(app)
        .await;

    assert_eq!(response.status(), 500);
    let body: Value = response.json();
    assert_eq!(body["error"], "Failed to process chat request");
    assert!(body.get("details").is_none());
}
