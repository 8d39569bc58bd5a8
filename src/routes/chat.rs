// ABOUTME: Visitor-facing chat endpoint backing the embedded sales chatbot
// ABOUTME: Proxies Gemini when configured, otherwise serves keyword-matched canned replies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Anchor Systems

//! The chat endpoint.
//!
//! Every request persists the visitor's message before anything else, so the
//! transcript survives even if the LLM call fails. All failures past input
//! validation collapse into one opaque 500 so the widget never leaks backend
//! detail to anonymous visitors.

use super::AppState;
use crate::database::ChatManager;
use crate::errors::{AppError, ErrorCode};
use crate::llm::{
    anchor_system_prompt, fallback_response, gemini, ChatMessage, ChatRequest, LlmProvider,
    MessageRole,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

/// Conversation titles are clipped to this many characters of the first
/// message
const TITLE_MAX_CHARS: usize = 100;

/// Title used when the first message is empty
const DEFAULT_TITLE: &str = "New Conversation";

// ============================================================================
// Request/Response Types
// ============================================================================

/// One transcript entry sent by the chat widget
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    /// Sender role
    pub role: MessageRole,
    /// Message text
    pub content: String,
}

/// Body of a chat request
#[derive(Debug, Deserialize)]
pub struct ChatRequestBody {
    /// Full transcript so far, last entry being the new visitor message
    #[serde(default)]
    pub messages: Option<Vec<IncomingMessage>>,
    /// Existing conversation to append to; omitted on the first message
    #[serde(rename = "conversationId", default)]
    pub conversation_id: Option<String>,
    /// Client session token grouping conversations
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,
}

/// Body of a chat response
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponseBody {
    /// Assistant reply text
    pub message: String,
    /// Conversation the exchange was recorded under
    #[serde(rename = "conversationId")]
    pub conversation_id: String,
}

// ============================================================================
// Chat Routes
// ============================================================================

/// Chat routes handler
pub struct ChatRoutes;

impl ChatRoutes {
    /// Create the chat route
    pub fn routes(state: AppState) -> Router {
        Router::new()
            .route("/api/chat", post(Self::chat))
            .with_state(state)
    }

    /// POST /api/chat
    async fn chat(
        State(state): State<AppState>,
        headers: HeaderMap,
        body: Result<Json<ChatRequestBody>, JsonRejection>,
    ) -> Result<Json<ChatResponseBody>, AppError> {
        // A body that fails to deserialize (wrong type for `messages`,
        // malformed JSON) gets the same 400 as a missing messages array
        let Json(body) =
            body.map_err(|_| AppError::invalid_input("Messages array is required"))?;
        let messages = body
            .messages
            .ok_or_else(|| AppError::invalid_input("Messages array is required"))?;
        if messages.is_empty() {
            return Err(AppError::invalid_input("Messages array cannot be empty"));
        }

        Self::process(&state, &headers, &messages, body.conversation_id, body.session_id)
            .await
            .map(Json)
            .map_err(collapse_error)
    }

    /// Persist the visitor message and produce a reply
    async fn process(
        state: &AppState,
        headers: &HeaderMap,
        messages: &[IncomingMessage],
        conversation_id: Option<String>,
        session_id: Option<String>,
    ) -> Result<ChatResponseBody, AppError> {
        let chat = ChatManager::new(state.database.pool().clone());
        // Validation guarantees at least one message
        let last = &messages[messages.len() - 1];

        let conversation_id = if let Some(id) = conversation_id {
            chat.add_message(&id, last.role, &last.content, &json!({}))
                .await?;
            id
        } else {
            let title = derive_title(&last.content);
            let metadata = json!({
                "user_agent": headers
                    .get("user-agent")
                    .and_then(|v| v.to_str().ok()),
            });
            let (conversation, _) = chat
                .create_conversation_with_message(
                    session_id.as_deref(),
                    &title,
                    &metadata,
                    last.role,
                    &last.content,
                    &json!({}),
                )
                .await?;
            conversation.id
        };

        let Some(gemini) = state.gemini.as_ref() else {
            let reply = fallback_response(&last.content);
            chat.add_message(
                &conversation_id,
                MessageRole::Assistant,
                reply,
                &json!({"fallback": true}),
            )
            .await?;
            info!(conversation_id = %conversation_id, "Served fallback chat response");
            return Ok(ChatResponseBody {
                message: reply.to_owned(),
                conversation_id,
            });
        };

        let request = ChatRequest::new(build_llm_messages(messages))
            .with_model(gemini::DEFAULT_MODEL)
            .with_temperature(0.7)
            .with_max_tokens(500);

        let response = gemini.complete(&request).await?;

        let assistant_message = chat
            .add_message(
                &conversation_id,
                MessageRole::Assistant,
                &response.content,
                &json!({"model": response.model}),
            )
            .await?;

        // Usage rows are only written when Gemini reported counts
        if let Some(usage) = response.usage {
            let raw = response.usage_raw.unwrap_or_else(|| json!({}));
            chat.record_token_usage(
                &conversation_id,
                &assistant_message.id,
                &response.model,
                i64::from(usage.prompt_tokens),
                i64::from(usage.completion_tokens),
                i64::from(usage.total_tokens),
                &raw,
            )
            .await?;
        }

        info!(conversation_id = %conversation_id, "Served Gemini chat response");
        Ok(ChatResponseBody {
            message: response.content,
            conversation_id,
        })
    }
}

/// Build the LLM transcript: system prompt first, then the widget's messages
fn build_llm_messages(messages: &[IncomingMessage]) -> Vec<ChatMessage> {
    let mut out = Vec::with_capacity(messages.len() + 1);
    out.push(ChatMessage::system(anchor_system_prompt()));
    for message in messages {
        out.push(ChatMessage::new(message.role, &message.content));
    }
    out
}

/// Clip the first message into a conversation title
fn derive_title(content: &str) -> String {
    if content.is_empty() {
        return DEFAULT_TITLE.to_owned();
    }
    content.chars().take(TITLE_MAX_CHARS).collect()
}

/// Hide everything except validation failures behind one opaque message
fn collapse_error(error: AppError) -> AppError {
    match error.code {
        ErrorCode::InvalidInput | ErrorCode::MissingRequiredField | ErrorCode::InvalidFormat => {
            error
        }
        _ => {
            error!(error = %error, "Chat request failed");
            AppError::internal("Failed to process chat request")
        }
    }
}
