// ABOUTME: Token usage analytics endpoint with estimated cost reporting
// ABOUTME: Aggregates usage by model, time period, and conversation for the admin dashboard
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Anchor Systems

use super::AppState;
use crate::database::{
    AnalyticsFilter, AnalyticsManager, ModelUsageSummary, TimeGrouping, TopConversation,
    UsagePeriod,
};
use crate::errors::AppError;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-token pricing in USD for a model
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ModelPricing {
    /// USD per input token
    pub input: f64,
    /// USD per output token
    pub output: f64,
}

/// Known model pricing: $0.50 per 1M input tokens, $1.50 per 1M output
/// tokens for the default chat model. Unknown models are priced at zero
/// rather than guessed.
const PRICING: &[(&str, ModelPricing)] = &[(
    "gemini-2.5-flash-lite",
    ModelPricing {
        input: 0.000_000_5,
        output: 0.000_001_5,
    },
)];

/// Look up pricing for a model
fn pricing_for(model: &str) -> ModelPricing {
    PRICING
        .iter()
        .find(|(name, _)| *name == model)
        .map_or(
            ModelPricing {
                input: 0.0,
                output: 0.0,
            },
            |(_, p)| *p,
        )
}

/// Estimated spend for a prompt/completion token split
#[allow(clippy::cast_precision_loss)]
fn estimate_cost(pricing: ModelPricing, prompt_tokens: i64, completion_tokens: i64) -> f64 {
    prompt_tokens as f64 * pricing.input + completion_tokens as f64 * pricing.output
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for the analytics endpoint
#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    /// Time-series bucket size: `day`, `week`, or `month`
    #[serde(rename = "groupBy", default)]
    pub group_by: Option<String>,
    /// Only include usage at or after this timestamp
    #[serde(rename = "startDate", default)]
    pub start_date: Option<String>,
    /// Only include usage at or before this timestamp
    #[serde(rename = "endDate", default)]
    pub end_date: Option<String>,
    /// Only include usage for this model
    #[serde(default)]
    pub model: Option<String>,
}

/// Per-model summary extended with estimated spend
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelUsageWithCost {
    /// Usage totals
    #[serde(flatten)]
    pub usage: ModelUsageSummary,
    /// Estimated spend in `currency`
    pub estimated_cost: f64,
    /// Currency of the estimate
    pub currency: String,
}

/// Complete analytics payload
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyticsResponse {
    /// Per-model totals with cost estimates
    pub overall: Vec<ModelUsageWithCost>,
    /// Usage bucketed over time
    #[serde(rename = "timeSeries")]
    pub time_series: Vec<UsagePeriod>,
    /// Ten heaviest conversations
    #[serde(rename = "topConversations")]
    pub top_conversations: Vec<TopConversation>,
    /// The pricing table the estimates were computed from
    #[serde(rename = "modelPricing")]
    pub model_pricing: BTreeMap<String, ModelPricing>,
}

// ============================================================================
// Analytics Routes
// ============================================================================

/// Analytics routes handler
pub struct AnalyticsRoutes;

impl AnalyticsRoutes {
    /// Create the analytics route
    pub fn routes(state: AppState) -> Router {
        Router::new()
            .route("/api/analytics/token-usage", get(Self::token_usage))
            .with_state(state)
    }

    /// GET /api/analytics/token-usage
    async fn token_usage(
        State(state): State<AppState>,
        Query(query): Query<AnalyticsQuery>,
    ) -> Result<Json<AnalyticsResponse>, AppError> {
        let analytics = AnalyticsManager::new(state.database.pool().clone());
        let grouping = TimeGrouping::parse(query.group_by.as_deref());
        let filter = AnalyticsFilter {
            start_date: query.start_date,
            end_date: query.end_date,
            model: query.model,
        };

        let overall = analytics
            .overall_usage(&filter)
            .await?
            .into_iter()
            .map(|usage| {
                let pricing = pricing_for(&usage.model);
                let estimated_cost = estimate_cost(
                    pricing,
                    usage.total_prompt_tokens,
                    usage.total_completion_tokens,
                );
                ModelUsageWithCost {
                    usage,
                    estimated_cost,
                    currency: "USD".to_owned(),
                }
            })
            .collect();

        let time_series = analytics.time_series(&filter, grouping).await?;
        let top_conversations = analytics.top_conversations(&filter).await?;

        let model_pricing = PRICING
            .iter()
            .map(|(name, p)| ((*name).to_owned(), *p))
            .collect();

        Ok(Json(AnalyticsResponse {
            overall,
            time_series,
            top_conversations,
            model_pricing,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_for_a_million_tokens_each_way() {
        let pricing = pricing_for("gemini-2.5-flash-lite");
        let cost = estimate_cost(pricing, 1_000_000, 1_000_000);
        // $0.50 input + $1.50 output
        assert!((cost - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_model_costs_nothing() {
        let pricing = pricing_for("some-future-model");
        assert_eq!(estimate_cost(pricing, 5000, 5000), 0.0);
    }

    #[test]
    fn test_zero_usage_costs_nothing() {
        let pricing = pricing_for("gemini-2.5-flash-lite");
        assert_eq!(estimate_cost(pricing, 0, 0), 0.0);
    }
}
