// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod config;
pub mod embeddings;
pub mod version;

pub use api::{create_app, start_server, AppState};
pub use config::ServiceConfig;
pub use embeddings::{EmbeddingModelConfig, ModelHolder, TextEmbedder};
