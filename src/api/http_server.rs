// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::embed::embed_handler;
use super::handlers::{health_handler, root_handler};
use crate::config::MAX_REQUEST_BODY_BYTES;
use crate::embeddings::ModelHolder;

/// Shared state handed to every handler
#[derive(Clone, Debug)]
pub struct AppState {
    pub model: Arc<ModelHolder>,
}

impl AppState {
    pub fn new(model: Arc<ModelHolder>) -> Self {
        Self { model }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        // Service metadata
        .route("/", get(root_handler))
        // Health check
        .route("/health", get(health_handler))
        // Embedding endpoint
        .route("/embed", post(embed_handler))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Binds `addr` and serves until `shutdown` resolves.
pub async fn start_server<F>(addr: &str, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("API server listening on {}", listener.local_addr()?);

    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server error")?;

    info!("API server stopped");
    Ok(())
}
