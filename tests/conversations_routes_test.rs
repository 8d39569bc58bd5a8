// ABOUTME: Integration tests for conversation admin endpoints
// ABOUTME: Covers listing with stats, detail retrieval, and cascading deletion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Anchor Systems

mod common;
mod helpers;

use helpers::axum_test::AxumTestRequest;
use serde_json::{json, Value};

/// Start a fallback-mode conversation and return its ID
async fn start_conversation(app: &axum::Router, content: &str, session: &str) -> String {
    let body: Value = AxumTestRequest::post("/api/chat")
        .json(&json!({
            "messages": [{"role": "user", "content": content}],
            "sessionId": session,
        }))
        .send(app.clone())
        .await
        .json();
    body["conversationId"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn test_unknown_conversation_detail_returns_404() {
    let (app, _db) = common::create_test_app().await.unwrap();

    let response = AxumTestRequest::get("/api/conversations/nope").send(app).await;
    assert_eq!(response.status(), 404);
    let body: Value = response.json();
    assert_eq!(body["error"], "Conversation not found");
}

#[tokio::test]
async fn test_delete_unknown_conversation_returns_404() {
    let (app, _db) = common::create_test_app().await.unwrap();

    let response = AxumTestRequest::delete("/api/conversations/nope").send(app).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_listing_includes_role_counts_and_token_sums() {
    let (app, _db) = common::create_test_app().await.unwrap();
    start_conversation(&app, "hello", "s1").await;

    let body: Value = AxumTestRequest::get("/api/conversations").send(app).await.json();
    let conversations = body["conversations"].as_array().unwrap();
    assert_eq!(conversations.len(), 1);

    let summary = &conversations[0];
    assert_eq!(summary["message_count"], 2);
    assert_eq!(summary["user_message_count"], 1);
    assert_eq!(summary["assistant_message_count"], 1);
    assert_eq!(summary["total_tokens_used"], 0);
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["pagination"]["limit"], 50);
    assert_eq!(body["pagination"]["hasMore"], false);
}

#[tokio::test]
async fn test_session_filter_limits_listing() {
    let (app, _db) = common::create_test_app().await.unwrap();
    start_conversation(&app, "first", "session-a").await;
    start_conversation(&app, "second", "session-b").await;

    let body: Value = AxumTestRequest::get("/api/conversations?sessionId=session-a")
        .send(app)
        .await
        .json();
    let conversations = body["conversations"].as_array().unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0]["session_id"], "session-a");
    assert_eq!(body["pagination"]["total"], 1);
}

#[tokio::test]
async fn test_most_recently_updated_conversation_lists_first() {
    let (app, _db) = common::create_test_app().await.unwrap();
    let first = start_conversation(&app, "first", "s1").await;
    let second = start_conversation(&app, "second", "s1").await;

    // Appending to the first conversation bumps it back to the top
    AxumTestRequest::post("/api/chat")
        .json(&json!({
            "messages": [{"role": "user", "content": "more"}],
            "conversationId": first,
        }))
        .send(app.clone())
        .await;

    let body: Value = AxumTestRequest::get("/api/conversations").send(app).await.json();
    let conversations = body["conversations"].as_array().unwrap();
    assert_eq!(conversations[0]["id"], first.as_str());
    assert_eq!(conversations[1]["id"], second.as_str());
}

#[tokio::test]
async fn test_delete_cascades_to_messages() {
    let (app, _db) = common::create_test_app().await.unwrap();
    let conversation_id = start_conversation(&app, "hello", "s1").await;

    let response = AxumTestRequest::delete(&format!("/api/conversations/{conversation_id}"))
        .send(app.clone())
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["success"], true);

    // Detail is gone
    let detail = AxumTestRequest::get(&format!("/api/conversations/{conversation_id}"))
        .send(app.clone())
        .await;
    assert_eq!(detail.status(), 404);

    // Messages went with it
    let feed: Value = AxumTestRequest::get("/api/messages").send(app).await.json();
    assert_eq!(feed["pagination"]["total"], 0);
}
