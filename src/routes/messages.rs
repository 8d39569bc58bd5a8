// ABOUTME: Admin endpoint for the cross-conversation message feed
// ABOUTME: Supports conversation, role, and content-search filters with pagination
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Anchor Systems

use super::AppState;
use crate::database::{ChatManager, MessageFeedRecord, MessageFilter};
use crate::errors::AppError;
use crate::pagination::Pagination;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for the message feed
#[derive(Debug, Deserialize)]
pub struct ListMessagesQuery {
    /// Restrict to one conversation
    #[serde(rename = "conversationId", default)]
    pub conversation_id: Option<String>,
    /// Restrict to one role (`user` or `assistant`)
    #[serde(default)]
    pub role: Option<String>,
    /// Case-insensitive substring match on message content
    #[serde(default)]
    pub search: Option<String>,
    /// Maximum rows to return
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Rows to skip
    #[serde(default)]
    pub offset: i64,
}

const fn default_limit() -> i64 {
    100
}

/// Paginated message feed
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageListResponse {
    /// Messages, newest first, with conversation context
    pub messages: Vec<MessageFeedRecord>,
    /// Pagination metadata
    pub pagination: Pagination,
}

// ============================================================================
// Message Routes
// ============================================================================

/// Message feed routes handler
pub struct MessageRoutes;

impl MessageRoutes {
    /// Create the message feed route
    pub fn routes(state: AppState) -> Router {
        Router::new()
            .route("/api/messages", get(Self::list))
            .with_state(state)
    }

    /// GET /api/messages
    async fn list(
        State(state): State<AppState>,
        Query(query): Query<ListMessagesQuery>,
    ) -> Result<Json<MessageListResponse>, AppError> {
        let chat = ChatManager::new(state.database.pool().clone());
        let filter = MessageFilter {
            conversation_id: query.conversation_id,
            role: query.role,
            search: query.search,
        };

        let messages = chat.list_messages(&filter, query.limit, query.offset).await?;
        let total = chat.count_messages(&filter).await?;

        Ok(Json(MessageListResponse {
            messages,
            pagination: Pagination::new(total, query.limit, query.offset),
        }))
    }
}
