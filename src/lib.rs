// ABOUTME: Main library entry point for the Anchor Systems site API
// ABOUTME: Exposes the chat, contact, and analytics modules plus shared infrastructure
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Anchor Systems

#![deny(unsafe_code)]

//! # Anchor Site Server
//!
//! HTTP JSON API backing the Anchor Systems marketing site: the embedded
//! sales chatbot, the contact form, and the internal admin dashboard's
//! read/analytics endpoints.
//!
//! ## Features
//!
//! - **Chat endpoint**: persists conversation transcripts and resolves
//!   replies from Google Gemini, or from a keyword-matched canned-response
//!   table when no API key is configured
//! - **Contact capture**: validated lead-generation form submissions
//! - **Admin reads**: paginated conversation/message listings and
//!   token-usage analytics with estimated cost rollups
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use anchor_site_server::config::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Anchor site server configured for port {}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Environment-driven server configuration
pub mod config;

/// Database access layer (connection pool, chat, contacts, analytics)
pub mod database;

/// Unified error handling (error codes, `AppError`, HTTP responses)
pub mod errors;

/// LLM provider integration and the canned-response fallback
pub mod llm;

/// Logging configuration and tracing bootstrap
pub mod logging;

/// Offset-based pagination metadata shared by the listing endpoints
pub mod pagination;

/// HTTP route handlers and router assembly
pub mod routes;
