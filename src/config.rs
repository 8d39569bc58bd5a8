// ABOUTME: Environment-driven configuration for the Anchor site server
// ABOUTME: Collects HTTP, database pool, and Gemini credential settings at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Anchor Systems

//! Server configuration loaded from environment variables.
//!
//! `GEMINI_API_KEY` is the sole feature switch between the live LLM path and
//! the canned-response fallback: when it is absent the chat endpoint never
//! makes an outbound call.

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;
use tracing::{info, warn};

/// Default HTTP port for the API server
const DEFAULT_HTTP_PORT: u16 = 8081;

/// Database connection pool settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database URL, e.g. `sqlite:./data/anchor.db` or `sqlite::memory:`
    pub url: String,
    /// Upper bound on pooled connections
    pub max_connections: u32,
    /// Lower bound on pooled connections kept warm
    pub min_connections: u32,
    /// How long to wait for a connection before failing the request
    pub connect_timeout: Duration,
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port for the HTTP API
    pub http_port: u16,
    /// Database pool configuration
    pub database: DatabaseConfig,
    /// Gemini API key; `None` enables the fallback responder
    pub gemini_api_key: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is unset or a numeric variable
    /// fails to parse.
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        // Load .env file if it exists
        if let Err(e) = dotenvy::dotenv() {
            warn!("No .env file found or failed to load: {}", e);
        }

        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is not set")?;

        let config = Self {
            http_port: env_var_or("HTTP_PORT", &DEFAULT_HTTP_PORT.to_string())?
                .parse()
                .context("Invalid HTTP_PORT value")?,
            database: DatabaseConfig {
                url: database_url,
                max_connections: env_var_or("DATABASE_MAX_CONNECTIONS", "10")?
                    .parse()
                    .context("Invalid DATABASE_MAX_CONNECTIONS value")?,
                min_connections: env_var_or("DATABASE_MIN_CONNECTIONS", "0")?
                    .parse()
                    .context("Invalid DATABASE_MIN_CONNECTIONS value")?,
                connect_timeout: Duration::from_secs(
                    env_var_or("DATABASE_CONNECT_TIMEOUT_SECS", "15")?
                        .parse()
                        .context("Invalid DATABASE_CONNECT_TIMEOUT_SECS value")?,
                ),
            },
            gemini_api_key: env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
        };

        Ok(config)
    }

    /// Human-readable configuration summary for startup logging
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Anchor Site Server Configuration:\n\
             - HTTP Port: {}\n\
             - Database: {}\n\
             - Pool: {}..={} connections, {}s connect timeout\n\
             - Chat backend: {}",
            self.http_port,
            self.database.url,
            self.database.min_connections,
            self.database.max_connections,
            self.database.connect_timeout.as_secs(),
            if self.gemini_api_key.is_some() {
                "Gemini"
            } else {
                "fallback responses (no GEMINI_API_KEY)"
            }
        )
    }
}

fn env_var_or(key: &str, default: &str) -> Result<String> {
    Ok(env::var(key).unwrap_or_else(|_| default.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_or_returns_default() {
        assert_eq!(
            env_var_or("ANCHOR_TEST_UNSET_VARIABLE", "fallback").unwrap(),
            "fallback"
        );
    }

    #[test]
    fn test_summary_reports_fallback_mode() {
        let config = ServerConfig {
            http_port: 8081,
            database: DatabaseConfig {
                url: "sqlite::memory:".into(),
                max_connections: 10,
                min_connections: 0,
                connect_timeout: Duration::from_secs(15),
            },
            gemini_api_key: None,
        };
        assert!(config.summary().contains("fallback responses"));
    }
}
