// ABOUTME: Token usage analytics queries for the admin dashboard
// ABOUTME: Aggregates usage by model, over time, and per conversation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Anchor Systems

use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

/// Date and model filters shared by all analytics queries
#[derive(Debug, Clone, Default)]
pub struct AnalyticsFilter {
    /// Only include usage at or after this timestamp (ISO 8601)
    pub start_date: Option<String>,
    /// Only include usage at or before this timestamp (ISO 8601)
    pub end_date: Option<String>,
    /// Only include usage for this model
    pub model: Option<String>,
}

/// Granularity for the time-series aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeGrouping {
    /// One bucket per calendar day
    Day,
    /// One bucket per week of the year
    Week,
    /// One bucket per calendar month
    Month,
}

impl TimeGrouping {
    /// Parse from a query parameter, defaulting to daily buckets
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("week") => Self::Week,
            Some("month") => Self::Month,
            _ => Self::Day,
        }
    }

    /// The `strftime` pattern producing this grouping's period label
    const fn strftime_format(self) -> &'static str {
        match self {
            Self::Day => "%Y-%m-%d",
            Self::Week => "%Y-%W",
            Self::Month => "%Y-%m",
        }
    }
}

/// Aggregate usage for one model over the filtered window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelUsageSummary {
    /// Model name
    pub model: String,
    /// Distinct conversations that used this model
    pub total_conversations: i64,
    /// Number of LLM calls
    pub total_requests: i64,
    /// Summed prompt tokens
    pub total_prompt_tokens: i64,
    /// Summed completion tokens
    pub total_completion_tokens: i64,
    /// Summed total tokens
    pub total_tokens: i64,
    /// Mean total tokens per call
    pub avg_tokens_per_request: f64,
}

/// Usage within one time bucket for one model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsagePeriod {
    /// Bucket label, e.g. `2025-08-25` for daily grouping
    pub period: String,
    /// Model name
    pub model: String,
    /// Distinct conversations in the bucket
    pub conversation_count: i64,
    /// Number of LLM calls in the bucket
    pub request_count: i64,
    /// Summed prompt tokens
    pub prompt_tokens: i64,
    /// Summed completion tokens
    pub completion_tokens: i64,
    /// Summed total tokens
    pub total_tokens: i64,
}

/// One of the heaviest conversations by token consumption
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopConversation {
    /// Conversation ID
    pub id: String,
    /// Conversation title
    pub title: String,
    /// When the conversation started
    pub created_at: String,
    /// Summed total tokens
    pub total_tokens: i64,
    /// Summed prompt tokens
    pub prompt_tokens: i64,
    /// Summed completion tokens
    pub completion_tokens: i64,
    /// Number of LLM calls
    pub request_count: i64,
}

/// Analytics database operations manager
pub struct AnalyticsManager {
    pool: SqlitePool,
}

impl AnalyticsManager {
    /// Create a new analytics manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Per-model usage totals over the filtered window
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn overall_usage(
        &self,
        filter: &AnalyticsFilter,
    ) -> AppResult<Vec<ModelUsageSummary>> {
        let mut sql = String::from(
            r"
            SELECT
                model,
                COUNT(DISTINCT conversation_id) as total_conversations,
                COUNT(*) as total_requests,
                COALESCE(SUM(prompt_tokens), 0) as total_prompt_tokens,
                COALESCE(SUM(completion_tokens), 0) as total_completion_tokens,
                COALESCE(SUM(total_tokens), 0) as total_tokens,
                COALESCE(AVG(total_tokens), 0.0) as avg_tokens_per_request
            FROM token_usage
            WHERE 1=1
            ",
        );
        let mut index = 1;
        append_usage_filters(&mut sql, filter, true, &mut index);
        sql.push_str(" GROUP BY model");

        let rows = bind_usage_filters(sqlx::query(&sql), filter, true)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to compute overall usage: {e}")))?;

        let summaries = rows
            .into_iter()
            .map(|r| ModelUsageSummary {
                model: r.get("model"),
                total_conversations: r.get("total_conversations"),
                total_requests: r.get("total_requests"),
                total_prompt_tokens: r.get("total_prompt_tokens"),
                total_completion_tokens: r.get("total_completion_tokens"),
                total_tokens: r.get("total_tokens"),
                avg_tokens_per_request: r.get("avg_tokens_per_request"),
            })
            .collect();

        Ok(summaries)
    }

    /// Usage bucketed by time period and model, newest bucket first
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn time_series(
        &self,
        filter: &AnalyticsFilter,
        grouping: TimeGrouping,
    ) -> AppResult<Vec<UsagePeriod>> {
        let mut sql = format!(
            r"
            SELECT
                strftime('{}', created_at) as period,
                model,
                COUNT(DISTINCT conversation_id) as conversation_count,
                COUNT(*) as request_count,
                COALESCE(SUM(prompt_tokens), 0) as prompt_tokens,
                COALESCE(SUM(completion_tokens), 0) as completion_tokens,
                COALESCE(SUM(total_tokens), 0) as total_tokens
            FROM token_usage
            WHERE 1=1
            ",
            grouping.strftime_format()
        );
        let mut index = 1;
        append_usage_filters(&mut sql, filter, true, &mut index);
        sql.push_str(" GROUP BY period, model ORDER BY period DESC, model");

        let rows = bind_usage_filters(sqlx::query(&sql), filter, true)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to compute usage time series: {e}")))?;

        let periods = rows
            .into_iter()
            .map(|r| UsagePeriod {
                period: r.get("period"),
                model: r.get("model"),
                conversation_count: r.get("conversation_count"),
                request_count: r.get("request_count"),
                prompt_tokens: r.get("prompt_tokens"),
                completion_tokens: r.get("completion_tokens"),
                total_tokens: r.get("total_tokens"),
            })
            .collect();

        Ok(periods)
    }

    /// Ten heaviest conversations by total token usage
    ///
    /// The model filter does not apply here; a conversation's cost is the sum
    /// over every model it touched.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn top_conversations(
        &self,
        filter: &AnalyticsFilter,
    ) -> AppResult<Vec<TopConversation>> {
        let mut sql = String::from(
            r"
            SELECT
                c.id,
                c.title,
                c.created_at,
                COALESCE(SUM(tu.total_tokens), 0) as total_tokens,
                COALESCE(SUM(tu.prompt_tokens), 0) as prompt_tokens,
                COALESCE(SUM(tu.completion_tokens), 0) as completion_tokens,
                COUNT(tu.id) as request_count
            FROM token_usage tu
            JOIN conversations c ON tu.conversation_id = c.id
            WHERE 1=1
            ",
        );
        let mut index = 1;
        append_usage_filters_with_prefix(&mut sql, filter, false, "tu.", &mut index);
        sql.push_str(
            " GROUP BY c.id, c.title, c.created_at ORDER BY total_tokens DESC LIMIT 10",
        );

        let rows = bind_usage_filters(sqlx::query(&sql), filter, false)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to compute top conversations: {e}")))?;

        let conversations = rows
            .into_iter()
            .map(|r| TopConversation {
                id: r.get("id"),
                title: r.get("title"),
                created_at: r.get("created_at"),
                total_tokens: r.get("total_tokens"),
                prompt_tokens: r.get("prompt_tokens"),
                completion_tokens: r.get("completion_tokens"),
                request_count: r.get("request_count"),
            })
            .collect();

        Ok(conversations)
    }
}

/// Append `AND` clauses for the usage filters against bare column names
fn append_usage_filters(
    sql: &mut String,
    filter: &AnalyticsFilter,
    include_model: bool,
    index: &mut usize,
) {
    append_usage_filters_with_prefix(sql, filter, include_model, "", index);
}

/// Append `AND` clauses, qualifying columns with a table alias when the
/// query joins conversations (both tables carry `created_at`)
fn append_usage_filters_with_prefix(
    sql: &mut String,
    filter: &AnalyticsFilter,
    include_model: bool,
    prefix: &str,
    index: &mut usize,
) {
    if filter.start_date.is_some() {
        sql.push_str(&format!(" AND {prefix}created_at >= ${index}"));
        *index += 1;
    }
    if filter.end_date.is_some() {
        sql.push_str(&format!(" AND {prefix}created_at <= ${index}"));
        *index += 1;
    }
    if include_model && filter.model.is_some() {
        sql.push_str(&format!(" AND {prefix}model = ${index}"));
        *index += 1;
    }
}

/// Bind values in the order `append_usage_filters` emitted them
fn bind_usage_filters<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    filter: &'q AnalyticsFilter,
    include_model: bool,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    if let Some(ref start) = filter.start_date {
        query = query.bind(start);
    }
    if let Some(ref end) = filter.end_date {
        query = query.bind(end);
    }
    if include_model {
        if let Some(ref model) = filter.model {
            query = query.bind(model);
        }
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouping_defaults_to_day() {
        assert_eq!(TimeGrouping::parse(None), TimeGrouping::Day);
        assert_eq!(TimeGrouping::parse(Some("hour")), TimeGrouping::Day);
        assert_eq!(TimeGrouping::parse(Some("week")), TimeGrouping::Week);
        assert_eq!(TimeGrouping::parse(Some("month")), TimeGrouping::Month);
    }

    #[test]
    fn test_strftime_formats() {
        assert_eq!(TimeGrouping::Day.strftime_format(), "%Y-%m-%d");
        assert_eq!(TimeGrouping::Week.strftime_format(), "%Y-%W");
        assert_eq!(TimeGrouping::Month.strftime_format(), "%Y-%m");
    }
}
