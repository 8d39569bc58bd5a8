// ABOUTME: Integration tests for database initialization and migration
// ABOUTME: Covers file creation, migration idempotence, and bad URL handling
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Anchor Systems

mod common;

use anchor_site_server::config::DatabaseConfig;
use anchor_site_server::database::{ChatManager, Database};
use anchor_site_server::llm::MessageRole;
use serde_json::json;
use std::time::Duration;

fn file_config(path: &std::path::Path) -> DatabaseConfig {
    DatabaseConfig {
        url: format!("sqlite:{}", path.display()),
        max_connections: 5,
        min_connections: 0,
        connect_timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn test_creates_database_file_and_survives_reopen() {
    common::init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("anchor.db");
    let config = file_config(&path);

    {
        let database = Database::new(&config).await.unwrap();
        let chat = ChatManager::new(database.pool().clone());
        chat.create_conversation_with_message(
            Some("s1"),
            "persisted",
            &json!({}),
            MessageRole::User,
            "persisted",
            &json!({}),
        )
        .await
        .unwrap();
    }
    assert!(path.exists());

    // Re-running migrations against existing data must be harmless
    let database = Database::new(&config).await.unwrap();
    let chat = ChatManager::new(database.pool().clone());
    assert_eq!(chat.count_conversations(None).await.unwrap(), 1);
}

#[tokio::test]
async fn test_cascade_delete_works_across_pool_connections() {
    common::init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = file_config(&dir.path().join("cascade.db"));
    let database = Database::new(&config).await.unwrap();
    let chat = ChatManager::new(database.pool().clone());

    let (conversation, message) = chat
        .create_conversation_with_message(
            None,
            "doomed",
            &json!({}),
            MessageRole::User,
            "doomed",
            &json!({}),
        )
        .await
        .unwrap();
    chat.record_token_usage(&conversation.id, &message.id, "gemini-2.5-flash-lite", 1, 1, 2, &json!({}))
        .await
        .unwrap();

    assert!(chat.delete_conversation(&conversation.id).await.unwrap());
    assert!(chat.get_messages(&conversation.id).await.unwrap().is_empty());
    let stats = chat.token_stats(&conversation.id).await.unwrap();
    assert_eq!(stats.request_count, 0);
}

#[tokio::test]
async fn test_unreachable_path_is_an_error() {
    common::init_test_logging();
    // SQLite creates missing files but not missing directories
    let config = DatabaseConfig {
        url: "sqlite:/definitely/not/a/real/dir/anchor.db".to_owned(),
        max_connections: 1,
        min_connections: 0,
        connect_timeout: Duration::from_secs(1),
    };
    assert!(Database::new(&config).await.is_err());
}
