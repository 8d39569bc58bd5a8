// ABOUTME: HTTP route handlers for the Anchor site API
// ABOUTME: Owns the shared application state and assembles the axum router
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Anchor Systems

//! # API Routes
//!
//! Each endpoint group lives in its own module and exposes a
//! `Routes::routes(state)` constructor in the same shape:
//!
//! - [`chat`]: the visitor-facing chatbot endpoint
//! - [`contact`]: contact form capture and listing
//! - [`conversations`]: admin conversation browsing and deletion
//! - [`messages`]: admin cross-conversation message feed
//! - [`analytics`]: token usage and cost reporting
//! - [`health`]: liveness probe

pub mod analytics;
pub mod chat;
pub mod contact;
pub mod conversations;
pub mod health;
pub mod messages;

pub use analytics::AnalyticsRoutes;
pub use chat::ChatRoutes;
pub use contact::ContactRoutes;
pub use conversations::ConversationRoutes;
pub use health::HealthRoutes;
pub use messages::MessageRoutes;

use crate::database::Database;
use crate::llm::GeminiProvider;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared state injected into every handler
#[derive(Clone)]
pub struct AppState {
    /// Database pool, created once at startup
    pub database: Database,
    /// Gemini provider; `None` switches the chat endpoint to canned replies
    pub gemini: Option<Arc<GeminiProvider>>,
}

impl AppState {
    /// Build application state from an initialized database and optional
    /// Gemini API key
    #[must_use]
    pub fn new(database: Database, gemini_api_key: Option<String>) -> Self {
        Self {
            database,
            gemini: gemini_api_key.map(|key| Arc::new(GeminiProvider::new(key))),
        }
    }
}

/// Assemble the complete API router
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(ChatRoutes::routes(state.clone()))
        .merge(ContactRoutes::routes(state.clone()))
        .merge(ConversationRoutes::routes(state.clone()))
        .merge(MessageRoutes::routes(state.clone()))
        .merge(AnalyticsRoutes::routes(state))
        .merge(HealthRoutes::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
