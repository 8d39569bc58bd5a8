// ABOUTME: Shared test setup functions for integration tests
// ABOUTME: Provides in-memory database and router construction helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Anchor Systems

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

//! Shared test utilities for `anchor_site_server`
//!
//! Common setup to reduce duplication across integration tests.

use anchor_site_server::config::DatabaseConfig;
use anchor_site_server::database::Database;
use anchor_site_server::routes::{self, AppState};
use anyhow::Result;
use axum::Router;
use std::sync::Once;
use std::time::Duration;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Create a migrated in-memory test database
///
/// A single connection keeps every query on the same in-memory database;
/// `sqlite::memory:` gives each new connection its own empty store.
pub async fn create_test_database() -> Result<Database> {
    init_test_logging();
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_owned(),
        max_connections: 1,
        min_connections: 1,
        connect_timeout: Duration::from_secs(5),
    };
    Ok(Database::new(&config).await?)
}

/// Build the full API router backed by an in-memory database, without a
/// Gemini key (the chat endpoint serves canned replies)
pub async fn create_test_app() -> Result<(Router, Database)> {
    let database = create_test_database().await?;
    let state = AppState::new(database.clone(), None);
    Ok((routes::router(state), database))
}
