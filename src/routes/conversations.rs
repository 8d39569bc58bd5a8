// ABOUTME: Admin endpoints for browsing and deleting chat conversations
// ABOUTME: Lists conversations with stats, fetches full transcripts, and cascades deletes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Anchor Systems

use super::AppState;
use crate::database::{ChatManager, ConversationRecord, ConversationSummary, MessageRecord, TokenStats};
use crate::errors::AppError;
use crate::pagination::Pagination;
use axum::{
    extract::{Path, Query, State},
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing conversations
#[derive(Debug, Deserialize)]
pub struct ListConversationsQuery {
    /// Filter to one client session
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,
    /// Maximum rows to return
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Rows to skip
    #[serde(default)]
    pub offset: i64,
}

const fn default_limit() -> i64 {
    50
}

/// Paginated listing of conversations
#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationListResponse {
    /// Conversations with per-role counts and token sums
    pub conversations: Vec<ConversationSummary>,
    /// Pagination metadata
    pub pagination: Pagination,
}

/// Full detail of one conversation
#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationDetailResponse {
    /// The conversation record
    pub conversation: ConversationRecord,
    /// Its messages in chronological order
    pub messages: Vec<MessageRecord>,
    /// Summed token usage
    #[serde(rename = "tokenStats")]
    pub token_stats: TokenStats,
}

/// Acknowledgement of a deletion
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// Always `true` on success
    pub success: bool,
}

// ============================================================================
// Conversation Routes
// ============================================================================

/// Conversation admin routes handler
pub struct ConversationRoutes;

impl ConversationRoutes {
    /// Create the conversation routes
    pub fn routes(state: AppState) -> Router {
        Router::new()
            .route("/api/conversations", get(Self::list))
            .route("/api/conversations/:conversation_id", get(Self::detail))
            .route(
                "/api/conversations/:conversation_id",
                delete(Self::remove),
            )
            .with_state(state)
    }

    /// GET /api/conversations
    async fn list(
        State(state): State<AppState>,
        Query(query): Query<ListConversationsQuery>,
    ) -> Result<Json<ConversationListResponse>, AppError> {
        let chat = ChatManager::new(state.database.pool().clone());
        let conversations = chat
            .list_conversations(query.session_id.as_deref(), query.limit, query.offset)
            .await?;
        let total = chat.count_conversations(query.session_id.as_deref()).await?;

        Ok(Json(ConversationListResponse {
            conversations,
            pagination: Pagination::new(total, query.limit, query.offset),
        }))
    }

    /// GET /api/conversations/:conversation_id
    async fn detail(
        State(state): State<AppState>,
        Path(conversation_id): Path<String>,
    ) -> Result<Json<ConversationDetailResponse>, AppError> {
        let chat = ChatManager::new(state.database.pool().clone());
        let conversation = chat
            .get_conversation(&conversation_id)
            .await?
            .ok_or_else(|| AppError::not_found("Conversation not found"))?;

        let messages = chat.get_messages(&conversation_id).await?;
        let token_stats = chat.token_stats(&conversation_id).await?;

        Ok(Json(ConversationDetailResponse {
            conversation,
            messages,
            token_stats,
        }))
    }

    /// DELETE /api/conversations/:conversation_id
    ///
    /// Messages and token usage rows go with the conversation via cascade.
    async fn remove(
        State(state): State<AppState>,
        Path(conversation_id): Path<String>,
    ) -> Result<Json<DeleteResponse>, AppError> {
        let chat = ChatManager::new(state.database.pool().clone());
        let deleted = chat.delete_conversation(&conversation_id).await?;

        if !deleted {
            return Err(AppError::not_found("Conversation not found"));
        }

        info!(conversation_id = %conversation_id, "Conversation deleted");
        Ok(Json(DeleteResponse { success: true }))
    }
}
