// ABOUTME: Integration test for the health probe endpoint
// ABOUTME: Verifies the liveness payload shape
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Anchor Systems

mod common;
mod helpers;

use helpers::axum_test::AxumTestRequest;
use serde_json::Value;

#[tokio::test]
async fn test_health_reports_ok() {
    let (app, _db) = common::create_test_app().await.unwrap();

    let response = AxumTestRequest::get("/api/health").send(app).await;
    assert_eq!(response.status(), 200);

    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "anchor_site_server");
    assert!(body["version"].is_string());
}
