// ABOUTME: Database operations for contact form submissions
// ABOUTME: Inserts new leads and lists them for the admin view
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Anchor Systems

use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

/// A stored contact form submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactSubmission {
    /// Auto-incrementing row ID
    pub id: i64,
    /// Submitter name
    pub name: String,
    /// Submitter email
    pub email: String,
    /// Company name, if provided
    pub company: Option<String>,
    /// Phone number, if provided
    pub phone: Option<String>,
    /// Free-form message body
    pub message: String,
    /// Which service line the lead asked about
    pub service_interest: Option<String>,
    /// When the submission was received (ISO 8601)
    pub created_at: String,
}

/// Fields accepted from the contact form
#[derive(Debug, Clone)]
pub struct NewContactSubmission<'a> {
    /// Submitter name
    pub name: &'a str,
    /// Submitter email
    pub email: &'a str,
    /// Company name
    pub company: Option<&'a str>,
    /// Phone number
    pub phone: Option<&'a str>,
    /// Message body
    pub message: &'a str,
    /// Service line of interest
    pub service_interest: Option<&'a str>,
}

/// Contact submission database operations manager
pub struct ContactManager {
    pool: SqlitePool,
}

impl ContactManager {
    /// Create a new contact manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a submission, returning its assigned ID and timestamp
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn insert_submission(
        &self,
        submission: &NewContactSubmission<'_>,
    ) -> AppResult<(i64, String)> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            r"
            INSERT INTO contact_submissions
                (name, email, company, phone, message, service_interest, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(submission.name)
        .bind(submission.email)
        .bind(submission.company)
        .bind(submission.phone)
        .bind(submission.message)
        .bind(submission.service_interest)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert contact submission: {e}")))?;

        Ok((result.last_insert_rowid(), now))
    }

    /// List submissions, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_submissions(
        &self,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<ContactSubmission>> {
        let rows = sqlx::query(
            r"
            SELECT id, name, email, company, phone, message, service_interest, created_at
            FROM contact_submissions
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list contact submissions: {e}")))?;

        let submissions = rows
            .into_iter()
            .map(|r| ContactSubmission {
                id: r.get("id"),
                name: r.get("name"),
                email: r.get("email"),
                company: r.get("company"),
                phone: r.get("phone"),
                message: r.get("message"),
                service_interest: r.get("service_interest"),
                created_at: r.get("created_at"),
            })
            .collect();

        Ok(submissions)
    }

    /// Count all submissions
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn count_submissions(&self) -> AppResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) as total FROM contact_submissions")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count contact submissions: {e}")))?;

        Ok(row.get("total"))
    }
}
