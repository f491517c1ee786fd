// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Process-wide embedding model handle
//!
//! The holder is created empty, loaded once at startup, and shared read-only
//! with every request through `Arc<ModelHolder>`. Until a model is installed
//! `is_ready()` is false and the HTTP layer answers 503.

use crate::embeddings::download::ensure_model_files;
use crate::embeddings::normalize::l2_normalize;
use crate::embeddings::{EmbeddingModelConfig, OnnxEmbeddingModel, TextEmbedder};
use anyhow::{anyhow, bail, Context, Result};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{error, info};

pub struct ModelHolder {
    config: EmbeddingModelConfig,
    embedder: OnceCell<Arc<dyn TextEmbedder>>,
}

impl std::fmt::Debug for ModelHolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHolder")
            .field("model_name", &self.config.name)
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}

impl ModelHolder {
    /// Creates an empty holder; nothing is loaded yet
    pub fn new(config: EmbeddingModelConfig) -> Self {
        Self {
            config,
            embedder: OnceCell::new(),
        }
    }

    /// Resolves the model files and loads the ONNX model.
    ///
    /// Called once at startup. The service cannot serve without a model, so
    /// callers treat an error here as fatal.
    pub async fn load(&self) -> Result<()> {
        info!("Loading model: {}", self.config.name);

        let result = self.load_onnx_model().await;
        match result {
            Ok(model) => {
                self.install(Arc::new(model))?;
                info!("Model loaded successfully");
                Ok(())
            }
            Err(e) => {
                error!("Failed to load model {}: {:#}", self.config.name, e);
                Err(e)
            }
        }
    }

    async fn load_onnx_model(&self) -> Result<OnnxEmbeddingModel> {
        let files = ensure_model_files(&self.config).await?;

        let name = self.config.name.clone();
        let intra_threads = self.config.intra_threads;
        let model = tokio::task::spawn_blocking(move || {
            OnnxEmbeddingModel::new(name, files.model_path, files.tokenizer_path, intra_threads)
        })
        .await
        .context("Model loading task panicked")??;

        if model.dimension() != self.config.dimensions {
            bail!(
                "Model {} dimension mismatch: expected {}, got {}",
                self.config.name,
                self.config.dimensions,
                model.dimension()
            );
        }

        Ok(model)
    }

    /// Installs an already constructed embedder. The handle is set at most once.
    pub fn install(&self, embedder: Arc<dyn TextEmbedder>) -> Result<()> {
        self.embedder
            .set(embedder)
            .map_err(|_| anyhow!("Embedding model {} is already loaded", self.config.name))
    }

    /// Whether the model has finished loading
    pub fn is_ready(&self) -> bool {
        self.embedder.initialized()
    }

    /// Name of the loaded model, or the configured name while loading
    pub fn model_name(&self) -> String {
        match self.embedder.get() {
            Some(embedder) => embedder.model_name(),
            None => self.config.name.clone(),
        }
    }

    /// Vector length of the loaded model, or the configured expectation
    pub fn dimensions(&self) -> usize {
        match self.embedder.get() {
            Some(embedder) => embedder.dimension(),
            None => self.config.dimensions,
        }
    }

    /// Embeds `texts`, one vector per text in input order, L2-normalized
    /// when `normalize` is set. Inference errors are returned unchanged.
    pub async fn encode(&self, texts: Vec<String>, normalize: bool) -> Result<Vec<Vec<f32>>> {
        let embedder = self
            .embedder
            .get()
            .ok_or_else(|| anyhow!("Model not loaded"))?;

        let expected = texts.len();
        let mut vectors = embedder.embed_batch(texts).await?;

        if vectors.len() != expected {
            bail!(
                "Model returned {} embeddings for {} texts",
                vectors.len(),
                expected
            );
        }
        if let Some(first) = vectors.first() {
            let width = first.len();
            if let Some(index) = vectors.iter().position(|v| v.len() != width) {
                bail!(
                    "Embedding {} has {} dimensions, expected {}",
                    index,
                    vectors[index].len(),
                    width
                );
            }
        }

        if normalize {
            for vector in &mut vectors {
                l2_normalize(vector);
            }
        }

        Ok(vectors)
    }
}
