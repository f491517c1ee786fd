// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Parser;
use embedding_service::{
    api::{start_server, AppState},
    embeddings::ModelHolder,
    version, ServiceConfig,
};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServiceConfig::parse();
    info!("Starting {}", version::get_version_string());

    // The model stays in memory for the life of the process
    let model = Arc::new(ModelHolder::new(config.embedding_model_config()));
    if let Err(e) = model.load().await {
        error!("Cannot serve without an embedding model, shutting down");
        return Err(e);
    }

    info!("  Health:  GET  http://{}/health", config.listen_addr());
    info!("  Embed:   POST http://{}/embed", config.listen_addr());

    start_server(&config.listen_addr(), AppState::new(model), shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
