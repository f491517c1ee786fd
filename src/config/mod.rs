// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Service configuration
//!
//! Settings are read once at process start from command-line flags, falling
//! back to environment variables (a `.env` file is loaded first by `main`).

use crate::embeddings::EmbeddingModelConfig;
use clap::Parser;
use std::path::PathBuf;

/// Default embedding model: all-MiniLM-L6-v2 (384 dimensions, fast, good quality)
pub const DEFAULT_MODEL_NAME: &str = "all-MiniLM-L6-v2";

/// Output dimension of the default model
pub const DEFAULT_DIMENSIONS: usize = 384;

/// Maximum number of texts accepted by a single POST /embed request
pub const MAX_TEXTS_PER_REQUEST: usize = 100;

/// Maximum sequence length in tokens; longer inputs are truncated
pub const MAX_SEQUENCE_LENGTH: usize = 256;

/// Maximum POST /embed body size. Texts are not length-limited, so this sits
/// well above axum's 2 MB default to admit a full batch of long documents.
pub const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Embedding service settings
#[derive(Parser, Debug, Clone)]
#[command(name = "embedding-service")]
#[command(version)]
#[command(about = "Sentence embedding HTTP service", long_about = None)]
pub struct ServiceConfig {
    /// Interface to listen on
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8001)]
    pub port: u16,

    /// Name of the pretrained sentence-transformers model
    #[arg(long, env = "EMBEDDING_MODEL", default_value = DEFAULT_MODEL_NAME)]
    pub model_name: String,

    /// Directory holding model.onnx and tokenizer.json
    #[arg(
        long,
        env = "EMBEDDING_MODEL_DIR",
        default_value = "./models/all-MiniLM-L6-v2-onnx"
    )]
    pub model_dir: PathBuf,

    /// Expected embedding dimension; loading fails on mismatch
    #[arg(long, env = "EMBEDDING_DIMENSIONS", default_value_t = DEFAULT_DIMENSIONS)]
    pub dimensions: usize,

    /// ONNX Runtime intra-op thread count
    #[arg(long, env = "EMBEDDING_INTRA_THREADS", default_value_t = 4)]
    pub intra_threads: usize,

    /// Never fetch model files from the Hugging Face Hub
    #[arg(
        long,
        env = "EMBEDDING_OFFLINE",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub offline: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8001,
            model_name: DEFAULT_MODEL_NAME.to_string(),
            model_dir: PathBuf::from("./models/all-MiniLM-L6-v2-onnx"),
            dimensions: DEFAULT_DIMENSIONS,
            intra_threads: 4,
            offline: false,
        }
    }
}

impl ServiceConfig {
    /// Address string suitable for `TcpListener::bind`
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Model loading settings derived from this configuration
    pub fn embedding_model_config(&self) -> EmbeddingModelConfig {
        EmbeddingModelConfig {
            name: self.model_name.clone(),
            model_dir: self.model_dir.clone(),
            dimensions: self.dimensions,
            intra_threads: self.intra_threads,
            offline: self.offline,
        }
    }
}
