// ABOUTME: Contact form endpoints for lead capture and admin review
// ABOUTME: Validates submissions, stores them, and lists them with pagination
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Anchor Systems

use super::AppState;
use crate::database::{ContactManager, ContactSubmission, NewContactSubmission};
use crate::errors::{AppError, ErrorResponse};
use crate::pagination::Pagination;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::info;

/// Lightweight email shape check: something@something.something with no
/// whitespace. Deliverability is not verified.
const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(EMAIL_PATTERN).unwrap_or_else(|_| unreachable!()))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body of a contact form submission
#[derive(Debug, Deserialize)]
pub struct ContactRequestBody {
    /// Submitter name
    #[serde(default)]
    pub name: Option<String>,
    /// Submitter email
    #[serde(default)]
    pub email: Option<String>,
    /// Company name
    #[serde(default)]
    pub company: Option<String>,
    /// Phone number
    #[serde(default)]
    pub phone: Option<String>,
    /// Message body
    #[serde(default)]
    pub message: Option<String>,
    /// Which service line the lead asked about
    #[serde(rename = "serviceInterest", default)]
    pub service_interest: Option<String>,
}

/// Acknowledgement for a stored submission
#[derive(Debug, Serialize, Deserialize)]
pub struct ContactResponseBody {
    /// Always `true` on success
    pub success: bool,
    /// Confirmation message
    pub message: String,
    /// Assigned submission ID
    pub id: i64,
    /// When the submission was stored
    pub timestamp: String,
}

/// Paginated listing of submissions
#[derive(Debug, Serialize, Deserialize)]
pub struct ContactListResponse {
    /// Submissions, newest first
    pub submissions: Vec<ContactSubmission>,
    /// Pagination metadata
    pub pagination: Pagination,
}

/// Query parameters for listing submissions
#[derive(Debug, Deserialize)]
pub struct ListContactsQuery {
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

// ============================================================================
// Contact Routes
// ============================================================================

/// Contact form routes handler
pub struct ContactRoutes;

impl ContactRoutes {
    /// Create the contact routes
    pub fn routes(state: AppState) -> Router {
        Router::new()
            .route("/api/contact", post(Self::submit))
            .route("/api/contact", get(Self::list))
            .with_state(state)
    }

    /// POST /api/contact
    async fn submit(
        State(state): State<AppState>,
        Json(body): Json<ContactRequestBody>,
    ) -> Response {
        let (name, email, message) = match (
            non_empty(body.name.as_deref()),
            non_empty(body.email.as_deref()),
            non_empty(body.message.as_deref()),
        ) {
            (Some(name), Some(email), Some(message)) => (name, email, message),
            _ => {
                return AppError::invalid_input("Name, email, and message are required")
                    .into_response();
            }
        };

        if !email_regex().is_match(email) {
            return AppError::invalid_input("Invalid email format").into_response();
        }

        let contacts = ContactManager::new(state.database.pool().clone());
        let submission = NewContactSubmission {
            name,
            email,
            company: non_empty(body.company.as_deref()),
            phone: non_empty(body.phone.as_deref()),
            message,
            service_interest: non_empty(body.service_interest.as_deref()),
        };

        match contacts.insert_submission(&submission).await {
            Ok((id, timestamp)) => {
                info!(id, "Contact form submission stored");
                (
                    StatusCode::CREATED,
                    Json(ContactResponseBody {
                        success: true,
                        message: "Contact form submitted successfully".to_owned(),
                        id,
                        timestamp,
                    }),
                )
                    .into_response()
            }
            // Unlike the chat endpoint, this one surfaces failure detail
            Err(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::with_details(
                    "Failed to submit contact form",
                    e.message,
                )),
            )
                .into_response(),
        }
    }

    /// GET /api/contact
    async fn list(
        State(state): State<AppState>,
        Query(query): Query<ListContactsQuery>,
    ) -> Result<Json<ContactListResponse>, AppError> {
        let contacts = ContactManager::new(state.database.pool().clone());
        let submissions = contacts.list_submissions(query.limit, query.offset).await?;
        let total = contacts.count_submissions().await?;

        Ok(Json(ContactListResponse {
            submissions,
            pagination: Pagination::new(total, query.limit, query.offset),
        }))
    }
}

/// Treat missing and empty strings the same way the form does
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
