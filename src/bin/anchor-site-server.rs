// ABOUTME: Main server binary for the Anchor Systems marketing site API
// ABOUTME: Wires configuration, database, and routes into a running HTTP server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Anchor Systems

//! # Anchor Site API Server Binary
//!
//! Starts the HTTP API backing the marketing site: the embedded sales
//! chatbot, contact form capture, and the admin analytics endpoints.

use anchor_site_server::{
    config::ServerConfig,
    database::Database,
    logging,
    routes::{self, AppState},
};
use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use tracing::info;

#[derive(Parser)]
#[command(name = "anchor-site-server")]
#[command(about = "Anchor Systems site API - sales chatbot and contact form backend")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    info!("Starting Anchor Site API server");
    info!("{}", config.summary());

    let database = Database::new(&config.database)
        .await
        .context("Failed to initialize database")?;

    let state = AppState::new(database, config.gemini_api_key.clone());
    let app = routes::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Resolve when the process receives SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
