// ABOUTME: Database operations for chatbot conversations, messages, and token usage
// ABOUTME: Handles conversation lifecycle, message feeds, and per-conversation stats
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Anchor Systems

use crate::errors::{AppError, AppResult};
use crate::llm::MessageRole;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

// ============================================================================
// Database Record Types
// ============================================================================

/// Database representation of a chat conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    /// Unique conversation ID
    pub id: String,
    /// Client-supplied session token grouping conversations across reloads
    pub session_id: Option<String>,
    /// Optional user identifier
    pub user_id: Option<String>,
    /// Conversation title (derived from the first user message, truncated)
    pub title: String,
    /// Free-form metadata (e.g. client user-agent)
    pub metadata: serde_json::Value,
    /// When the conversation was created (ISO 8601)
    pub created_at: String,
    /// When the conversation was last updated (ISO 8601)
    pub updated_at: String,
}

/// Database representation of a chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Unique message ID
    pub id: String,
    /// Conversation ID this message belongs to
    pub conversation_id: String,
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Message content
    pub content: String,
    /// Free-form metadata (e.g. `{"fallback": true}` or `{"model": name}`)
    pub metadata: serde_json::Value,
    /// When the message was created (ISO 8601)
    pub created_at: String,
}

/// Summary of a conversation for the admin listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// Conversation ID
    pub id: String,
    /// Session token if the client supplied one
    pub session_id: Option<String>,
    /// Optional user identifier
    pub user_id: Option<String>,
    /// Conversation title
    pub title: String,
    /// When the conversation was created
    pub created_at: String,
    /// When the conversation was last updated
    pub updated_at: String,
    /// Number of messages in the conversation
    pub message_count: i64,
    /// Number of user messages
    pub user_message_count: i64,
    /// Number of assistant messages
    pub assistant_message_count: i64,
    /// Total tokens consumed across all LLM calls
    pub total_tokens_used: i64,
}

/// A message joined with its conversation context, for the admin feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageFeedRecord {
    /// Message ID
    pub id: String,
    /// Owning conversation ID
    pub conversation_id: String,
    /// Role of the sender
    pub role: String,
    /// Message content
    pub content: String,
    /// Message metadata
    pub metadata: serde_json::Value,
    /// When the message was created
    pub created_at: String,
    /// Title of the owning conversation
    pub conversation_title: String,
    /// Session token of the owning conversation
    pub session_id: Option<String>,
}

/// Summed token usage for one conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenStats {
    /// Number of LLM calls recorded
    pub request_count: i64,
    /// Summed prompt tokens
    pub total_prompt_tokens: i64,
    /// Summed completion tokens
    pub total_completion_tokens: i64,
    /// Summed total tokens
    pub total_tokens: i64,
}

/// Filters for the cross-conversation message feed
#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    /// Restrict to one conversation
    pub conversation_id: Option<String>,
    /// Restrict to one role
    pub role: Option<String>,
    /// Case-insensitive substring match on content
    pub search: Option<String>,
}

// ============================================================================
// Chat Manager
// ============================================================================

/// Chat database operations manager
pub struct ChatManager {
    pool: SqlitePool,
}

impl ChatManager {
    /// Create a new chat manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ========================================================================
    // Conversation Operations
    // ========================================================================

    /// Create a conversation and its first message atomically
    ///
    /// Both inserts run inside one transaction so a crash cannot leave an
    /// orphaned conversation with no messages.
    ///
    /// # Errors
    ///
    /// Returns an error if either insert fails
    pub async fn create_conversation_with_message(
        &self,
        session_id: Option<&str>,
        title: &str,
        metadata: &serde_json::Value,
        role: MessageRole,
        content: &str,
        message_metadata: &serde_json::Value,
    ) -> AppResult<(ConversationRecord, MessageRecord)> {
        let conversation_id = Uuid::new_v4().to_string();
        let message_id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();
        let metadata_text = metadata.to_string();
        let message_metadata_text = message_metadata.to_string();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO conversations (id, session_id, user_id, title, metadata, created_at, updated_at)
            VALUES ($1, $2, NULL, $3, $4, $5, $5)
            ",
        )
        .bind(&conversation_id)
        .bind(session_id)
        .bind(title)
        .bind(&metadata_text)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to create conversation: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO messages (id, conversation_id, role, content, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(&message_id)
        .bind(&conversation_id)
        .bind(role.as_str())
        .bind(content)
        .bind(&message_metadata_text)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert first message: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit conversation: {e}")))?;

        let conversation = ConversationRecord {
            id: conversation_id.clone(),
            session_id: session_id.map(ToOwned::to_owned),
            user_id: None,
            title: title.to_owned(),
            metadata: metadata.clone(),
            created_at: now.clone(),
            updated_at: now.clone(),
        };
        let message = MessageRecord {
            id: message_id,
            conversation_id,
            role: role.as_str().to_owned(),
            content: content.to_owned(),
            metadata: message_metadata.clone(),
            created_at: now,
        };

        Ok((conversation, message))
    }

    /// Get a conversation by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get_conversation(
        &self,
        conversation_id: &str,
    ) -> AppResult<Option<ConversationRecord>> {
        let row = sqlx::query(
            r"
            SELECT id, session_id, user_id, title, metadata, created_at, updated_at
            FROM conversations
            WHERE id = $1
            ",
        )
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get conversation: {e}")))?;

        Ok(row.map(|r| ConversationRecord {
            id: r.get("id"),
            session_id: r.get("session_id"),
            user_id: r.get("user_id"),
            title: r.get("title"),
            metadata: parse_metadata(r.get("metadata")),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }))
    }

    /// List conversations with per-role message counts and token sums
    ///
    /// Ordered by last update descending; optionally filtered by session.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_conversations(
        &self,
        session_id: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<ConversationSummary>> {
        let mut sql = String::from(
            r"
            SELECT
                c.id,
                c.session_id,
                c.user_id,
                c.title,
                c.created_at,
                c.updated_at,
                (SELECT COUNT(*) FROM messages m WHERE m.conversation_id = c.id) AS message_count,
                (SELECT COUNT(*) FROM messages m
                 WHERE m.conversation_id = c.id AND m.role = 'user') AS user_message_count,
                (SELECT COUNT(*) FROM messages m
                 WHERE m.conversation_id = c.id AND m.role = 'assistant') AS assistant_message_count,
                (SELECT COALESCE(SUM(tu.total_tokens), 0) FROM token_usage tu
                 WHERE tu.conversation_id = c.id) AS total_tokens_used
            FROM conversations c
            ",
        );

        if session_id.is_some() {
            sql.push_str(" WHERE c.session_id = $1 ORDER BY c.updated_at DESC LIMIT $2 OFFSET $3");
        } else {
            sql.push_str(" ORDER BY c.updated_at DESC LIMIT $1 OFFSET $2");
        }

        let mut query = sqlx::query(&sql);
        if let Some(session) = session_id {
            query = query.bind(session);
        }
        let rows = query
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list conversations: {e}")))?;

        let summaries = rows
            .into_iter()
            .map(|r| ConversationSummary {
                id: r.get("id"),
                session_id: r.get("session_id"),
                user_id: r.get("user_id"),
                title: r.get("title"),
                created_at: r.get("created_at"),
                updated_at: r.get("updated_at"),
                message_count: r.get("message_count"),
                user_message_count: r.get("user_message_count"),
                assistant_message_count: r.get("assistant_message_count"),
                total_tokens_used: r.get("total_tokens_used"),
            })
            .collect();

        Ok(summaries)
    }

    /// Count conversations, optionally filtered by session
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn count_conversations(&self, session_id: Option<&str>) -> AppResult<i64> {
        let row = if let Some(session) = session_id {
            sqlx::query("SELECT COUNT(*) as total FROM conversations WHERE session_id = $1")
                .bind(session)
                .fetch_one(&self.pool)
                .await
        } else {
            sqlx::query("SELECT COUNT(*) as total FROM conversations")
                .fetch_one(&self.pool)
                .await
        }
        .map_err(|e| AppError::database(format!("Failed to count conversations: {e}")))?;

        Ok(row.get("total"))
    }

    /// Delete a conversation and all its messages and usage rows (cascade)
    ///
    /// Returns `false` if no conversation with that ID existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn delete_conversation(&self, conversation_id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM conversations WHERE id = $1")
            .bind(conversation_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete conversation: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    // ========================================================================
    // Message Operations
    // ========================================================================

    /// Add a message to an existing conversation
    ///
    /// Also bumps the conversation's `updated_at` timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn add_message(
        &self,
        conversation_id: &str,
        role: MessageRole,
        content: &str,
        metadata: &serde_json::Value,
    ) -> AppResult<MessageRecord> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();
        let role_str = role.as_str();
        let metadata_text = metadata.to_string();

        sqlx::query(
            r"
            INSERT INTO messages (id, conversation_id, role, content, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(&id)
        .bind(conversation_id)
        .bind(role_str)
        .bind(content)
        .bind(&metadata_text)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to add message: {e}")))?;

        sqlx::query("UPDATE conversations SET updated_at = $1 WHERE id = $2")
            .bind(&now)
            .bind(conversation_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::database(format!("Failed to update conversation timestamp: {e}"))
            })?;

        Ok(MessageRecord {
            id,
            conversation_id: conversation_id.to_owned(),
            role: role_str.to_owned(),
            content: content.to_owned(),
            metadata: metadata.clone(),
            created_at: now,
        })
    }

    /// Get all messages for a conversation in chronological order
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get_messages(&self, conversation_id: &str) -> AppResult<Vec<MessageRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, conversation_id, role, content, metadata, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC
            ",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get messages: {e}")))?;

        let messages = rows
            .into_iter()
            .map(|r| MessageRecord {
                id: r.get("id"),
                conversation_id: r.get("conversation_id"),
                role: r.get("role"),
                content: r.get("content"),
                metadata: parse_metadata(r.get("metadata")),
                created_at: r.get("created_at"),
            })
            .collect();

        Ok(messages)
    }

    /// List recent messages across conversations, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_messages(
        &self,
        filter: &MessageFilter,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<MessageFeedRecord>> {
        let mut sql = String::from(
            r"
            SELECT
                m.id,
                m.conversation_id,
                m.role,
                m.content,
                m.metadata,
                m.created_at,
                c.title AS conversation_title,
                c.session_id
            FROM messages m
            JOIN conversations c ON m.conversation_id = c.id
            WHERE 1=1
            ",
        );
        let mut index = 1;
        append_message_filters(&mut sql, filter, &mut index);
        sql.push_str(&format!(
            " ORDER BY m.created_at DESC LIMIT ${} OFFSET ${}",
            index,
            index + 1
        ));

        let mut query = sqlx::query(&sql);
        query = bind_message_filters(query, filter);
        let rows = query
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list messages: {e}")))?;

        let messages = rows
            .into_iter()
            .map(|r| MessageFeedRecord {
                id: r.get("id"),
                conversation_id: r.get("conversation_id"),
                role: r.get("role"),
                content: r.get("content"),
                metadata: parse_metadata(r.get("metadata")),
                created_at: r.get("created_at"),
                conversation_title: r.get("conversation_title"),
                session_id: r.get("session_id"),
            })
            .collect();

        Ok(messages)
    }

    /// Count messages matching the feed filter
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn count_messages(&self, filter: &MessageFilter) -> AppResult<i64> {
        let mut sql = String::from("SELECT COUNT(*) as total FROM messages m WHERE 1=1");
        let mut index = 1;
        append_message_filters(&mut sql, filter, &mut index);

        let mut query = sqlx::query(&sql);
        query = bind_message_filters(query, filter);
        let row = query
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count messages: {e}")))?;

        Ok(row.get("total"))
    }

    // ========================================================================
    // Token Usage Operations
    // ========================================================================

    /// Record token usage for an assistant message produced by an LLM call
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn record_token_usage(
        &self,
        conversation_id: &str,
        message_id: &str,
        model: &str,
        prompt_tokens: i64,
        completion_tokens: i64,
        total_tokens: i64,
        metadata: &serde_json::Value,
    ) -> AppResult<()> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r"
            INSERT INTO token_usage
                (id, conversation_id, message_id, model, prompt_tokens, completion_tokens, total_tokens, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(&id)
        .bind(conversation_id)
        .bind(message_id)
        .bind(model)
        .bind(prompt_tokens)
        .bind(completion_tokens)
        .bind(total_tokens)
        .bind(metadata.to_string())
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to record token usage: {e}")))?;

        Ok(())
    }

    /// Summed token usage for one conversation
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn token_stats(&self, conversation_id: &str) -> AppResult<TokenStats> {
        let row = sqlx::query(
            r"
            SELECT
                COUNT(*) as request_count,
                COALESCE(SUM(prompt_tokens), 0) as total_prompt_tokens,
                COALESCE(SUM(completion_tokens), 0) as total_completion_tokens,
                COALESCE(SUM(total_tokens), 0) as total_tokens
            FROM token_usage
            WHERE conversation_id = $1
            ",
        )
        .bind(conversation_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get token stats: {e}")))?;

        Ok(TokenStats {
            request_count: row.get("request_count"),
            total_prompt_tokens: row.get("total_prompt_tokens"),
            total_completion_tokens: row.get("total_completion_tokens"),
            total_tokens: row.get("total_tokens"),
        })
    }
}

/// Append `AND` clauses for the message feed filter, advancing the
/// placeholder index for each bound value
fn append_message_filters(sql: &mut String, filter: &MessageFilter, index: &mut usize) {
    if filter.conversation_id.is_some() {
        sql.push_str(&format!(" AND m.conversation_id = ${index}"));
        *index += 1;
    }
    if filter.role.is_some() {
        sql.push_str(&format!(" AND m.role = ${index}"));
        *index += 1;
    }
    if filter.search.is_some() {
        // SQLite LIKE is case-insensitive for ASCII only; lower() both sides
        sql.push_str(&format!(" AND lower(m.content) LIKE lower(${index})"));
        *index += 1;
    }
}

/// Bind filter values in the same order `append_message_filters` emitted them
fn bind_message_filters<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    filter: &'q MessageFilter,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    if let Some(ref conversation_id) = filter.conversation_id {
        query = query.bind(conversation_id);
    }
    if let Some(ref role) = filter.role {
        query = query.bind(role);
    }
    if let Some(ref search) = filter.search {
        query = query.bind(format!("%{search}%"));
    }
    query
}

/// Parse stored metadata text, falling back to an empty object
fn parse_metadata(text: String) -> serde_json::Value {
    serde_json::from_str(&text).unwrap_or_else(|_| serde_json::json!({}))
}
