// ABOUTME: Liveness probe endpoint for deployment health checks
// ABOUTME: Reports service name and version without touching the database
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Anchor Systems

use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};

/// Health probe payload
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `ok` when the process is serving requests
    pub status: String,
    /// Service identifier
    pub service: String,
    /// Crate version
    pub version: String,
}

/// Health routes handler
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the health route
    pub fn routes() -> Router {
        Router::new().route("/api/health", get(Self::health))
    }

    /// GET /api/health
    async fn health() -> Json<HealthResponse> {
        Json(HealthResponse {
            status: "ok".to_owned(),
            service: env!("CARGO_PKG_NAME").to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
        })
    }
}
