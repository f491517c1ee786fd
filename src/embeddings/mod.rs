// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Sentence embedding backend
//!
//! - `onnx_model`: all-MiniLM-L6-v2 on ONNX Runtime with mean pooling
//! - `download`: resolves model files locally or from the Hugging Face Hub
//! - `model_holder`: the process-wide, load-once handle used by the HTTP layer
//! - `normalize`: L2 normalization of output vectors

pub mod download;
pub mod model_holder;
pub mod normalize;
pub mod onnx_model;

pub use download::{ensure_model_files, ModelFiles};
pub use model_holder::ModelHolder;
pub use normalize::{l2_norm, l2_normalize};
pub use onnx_model::OnnxEmbeddingModel;

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Configuration for loading an embedding model
#[derive(Debug, Clone)]
pub struct EmbeddingModelConfig {
    /// Model name (e.g., "all-MiniLM-L6-v2")
    pub name: String,
    /// Directory expected to hold model.onnx and tokenizer.json
    pub model_dir: PathBuf,
    /// Expected embedding dimensions
    pub dimensions: usize,
    /// ONNX Runtime intra-op threads
    pub intra_threads: usize,
    /// Skip the Hugging Face Hub when local files are missing
    pub offline: bool,
}

/// Batch text-to-vector inference.
///
/// Implementations return one raw (unnormalized) vector per input text, in
/// input order. Normalization is applied by [`ModelHolder::encode`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Name reported in responses
    fn model_name(&self) -> String;

    /// Length of every vector this embedder produces
    fn dimension(&self) -> usize;

    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;
}
