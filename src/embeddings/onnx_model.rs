// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX Embedding Model Wrapper
//!
//! Runs a sentence-transformers ONNX export (all-MiniLM-L6-v2 by default)
//! through ONNX Runtime on the CPU execution provider.
//!
//! Features:
//! - ONNX model and tokenizer loading from disk
//! - BERT tokenization with truncation to 256 tokens
//! - Batch inference with per-batch padding
//! - Mean pooling over token embeddings, weighted by the attention mask
//! - Output dimension discovered and validated at load time

use crate::config::MAX_SEQUENCE_LENGTH;
use crate::embeddings::TextEmbedder;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use ndarray::{Array2, ArrayViewD, Axis};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

/// ONNX-based sentence embedding model
///
/// The model emits token-level embeddings `[batch, seq_len, hidden]`; sentence
/// vectors are produced by mean pooling. Vectors are returned unnormalized.
///
/// # Thread Safety
/// All fields are wrapped in Arc for cheap cloning. ONNX Runtime needs
/// exclusive access to the session for each run, so runs are serialized by
/// the session mutex.
#[derive(Clone)]
pub struct OnnxEmbeddingModel {
    session: Arc<Mutex<Session>>,

    tokenizer: Arc<Tokenizer>,

    /// Model name (e.g., "all-MiniLM-L6-v2")
    model_name: String,

    /// Output dimension (384 for all-MiniLM-L6-v2)
    dimension: usize,
}

impl std::fmt::Debug for OnnxEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingModel")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl OnnxEmbeddingModel {
    /// Loads the ONNX model and tokenizer from disk.
    ///
    /// This is blocking work; async callers should run it on the blocking
    /// thread pool.
    ///
    /// # Errors
    /// Returns error if:
    /// - Model or tokenizer file not found or invalid
    /// - ONNX Runtime initialization fails
    /// - The probe inference does not yield `[batch, seq_len, hidden]` output
    ///
    /// # Example
    /// ```ignore
    /// let model = OnnxEmbeddingModel::new(
    ///     "all-MiniLM-L6-v2",
    ///     "./models/all-MiniLM-L6-v2-onnx/model.onnx",
    ///     "./models/all-MiniLM-L6-v2-onnx/tokenizer.json",
    ///     4,
    /// )?;
    /// ```
    pub fn new<P: AsRef<Path>>(
        model_name: impl Into<String>,
        model_path: P,
        tokenizer_path: P,
        intra_threads: usize,
    ) -> Result<Self> {
        let model_name = model_name.into();
        let model_path = model_path.as_ref();
        let tokenizer_path = tokenizer_path.as_ref();

        if !model_path.exists() {
            bail!("ONNX model file not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            bail!("Tokenizer file not found: {}", tokenizer_path.display());
        }

        info!(
            "Initializing ONNX embedding model {} from {}",
            model_name,
            model_path.display()
        );

        let mut session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("Failed to configure tokenizer truncation: {}", e))?;

        // A sample inference discovers the hidden size and checks the output layout
        let sample = run_batch(&mut session, &tokenizer, &["validation test".to_string()])
            .context("Model validation inference failed")?;
        let dimension = sample.first().map(Vec::len).unwrap_or(0);
        if dimension == 0 {
            bail!("Model produced an empty embedding during validation");
        }

        info!(
            "ONNX embedding model {} loaded ({} dimensions)",
            model_name, dimension
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            model_name,
            dimension,
        })
    }

    /// Generates raw embeddings for a batch of texts on the calling thread.
    pub fn embed_batch_blocking(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("ONNX session lock poisoned"))?;
        let embeddings = run_batch(&mut session, &self.tokenizer, texts)?;

        for (i, embedding) in embeddings.iter().enumerate() {
            if embedding.len() != self.dimension {
                bail!(
                    "Unexpected embedding dimension at index {}: {} (expected {})",
                    i,
                    embedding.len(),
                    self.dimension
                );
            }
        }

        Ok(embeddings)
    }
}

#[async_trait]
impl TextEmbedder for OnnxEmbeddingModel {
    fn model_name(&self) -> String {
        self.model_name.clone()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let model = self.clone();
        tokio::task::spawn_blocking(move || model.embed_batch_blocking(&texts))
            .await
            .context("Embedding task panicked")?
    }
}

/// Tokenizes, pads to the longest sequence, runs the session and mean-pools.
fn run_batch(
    session: &mut Session,
    tokenizer: &Tokenizer,
    texts: &[String],
) -> Result<Vec<Vec<f32>>> {
    let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let encodings = tokenizer
        .encode_batch(inputs, true)
        .map_err(|e| anyhow!("Tokenization failed: {}", e))?;

    let batch_size = encodings.len();
    let max_len = encodings
        .iter()
        .map(|enc| enc.get_ids().len())
        .max()
        .unwrap_or(0);

    let mut input_ids = Vec::with_capacity(batch_size * max_len);
    let mut attention_mask = Vec::with_capacity(batch_size * max_len);
    let mut token_type_ids = Vec::with_capacity(batch_size * max_len);

    for encoding in &encodings {
        let ids = encoding.get_ids();
        let padding = max_len - ids.len();

        input_ids.extend(ids.iter().map(|&id| i64::from(id)));
        attention_mask.extend(encoding.get_attention_mask().iter().map(|&m| i64::from(m)));
        token_type_ids.extend(encoding.get_type_ids().iter().map(|&t| i64::from(t)));

        input_ids.extend(std::iter::repeat(0i64).take(padding));
        attention_mask.extend(std::iter::repeat(0i64).take(padding));
        token_type_ids.extend(std::iter::repeat(0i64).take(padding));
    }

    // Keep a copy of the mask for pooling; the tensor takes ownership
    let pooling_mask = attention_mask.clone();

    let input_ids_array = Array2::from_shape_vec((batch_size, max_len), input_ids)
        .context("Failed to create input_ids array")?;
    let attention_mask_array = Array2::from_shape_vec((batch_size, max_len), attention_mask)
        .context("Failed to create attention_mask array")?;
    let token_type_ids_array = Array2::from_shape_vec((batch_size, max_len), token_type_ids)
        .context("Failed to create token_type_ids array")?;

    debug!("Running ONNX inference on batch of {} ({} tokens max)", batch_size, max_len);

    let outputs = session.run(ort::inputs![
        "input_ids" => Value::from_array(input_ids_array)?,
        "attention_mask" => Value::from_array(attention_mask_array)?,
        "token_type_ids" => Value::from_array(token_type_ids_array)?
    ])?;

    // Output names differ between exports; the token embeddings come first
    let output = outputs[0]
        .try_extract_array::<f32>()
        .context("Failed to extract output tensor")?;

    let shape = output.shape();
    if shape.len() != 3 || shape[0] != batch_size {
        bail!(
            "Model outputs unexpected dimensions: {:?} (expected [{}, seq_len, hidden])",
            shape,
            batch_size
        );
    }

    let embeddings = pooling_mask
        .chunks(max_len.max(1))
        .take(batch_size)
        .enumerate()
        .map(|(row, mask)| mean_pool(output.index_axis(Axis(0), row), mask))
        .collect();

    Ok(embeddings)
}

/// Averages token embeddings `[seq_len, hidden]`, counting only tokens whose
/// mask value is non-zero.
fn mean_pool(token_embeddings: ArrayViewD<'_, f32>, mask: &[i64]) -> Vec<f32> {
    let hidden = token_embeddings.shape().last().copied().unwrap_or(0);
    let mut pooled = vec![0.0f32; hidden];
    let mut mask_sum = 0.0f32;

    for (token, &mask_value) in token_embeddings.outer_iter().zip(mask) {
        let weight = mask_value as f32;
        mask_sum += weight;
        for (acc, value) in pooled.iter_mut().zip(token.iter()) {
            *acc += value * weight;
        }
    }

    for value in &mut pooled {
        *value /= mask_sum.max(1e-9);
    }

    pooled
}
