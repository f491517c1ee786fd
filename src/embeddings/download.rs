// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Model file resolution
//!
//! Uses `<model_dir>/model.onnx` and `<model_dir>/tokenizer.json` when both
//! exist. Otherwise fetches the ONNX export and tokenizer from the Hugging
//! Face Hub (`sentence-transformers/<name>`) into the hub cache and returns
//! the cached paths.

use crate::embeddings::EmbeddingModelConfig;
use anyhow::{bail, Context, Result};
use hf_hub::api::tokio::Api;
use std::path::{Path, PathBuf};
use tracing::info;

pub const MODEL_FILE: &str = "model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Path of the ONNX export inside a sentence-transformers hub repository
const HUB_MODEL_FILE: &str = "onnx/model.onnx";

/// Organization used for bare model names
const HUB_ORGANIZATION: &str = "sentence-transformers";

/// Resolved on-disk locations of the model and tokenizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFiles {
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
}

/// Returns the model files in `dir` if both are present
pub fn local_model_files(dir: &Path) -> Option<ModelFiles> {
    let model_path = dir.join(MODEL_FILE);
    let tokenizer_path = dir.join(TOKENIZER_FILE);

    if model_path.is_file() && tokenizer_path.is_file() {
        Some(ModelFiles {
            model_path,
            tokenizer_path,
        })
    } else {
        None
    }
}

/// Hub repository for a model name. Names that already carry an
/// organization ("org/model") are used unchanged.
pub fn hub_repo_id(model_name: &str) -> String {
    if model_name.contains('/') {
        model_name.to_string()
    } else {
        format!("{}/{}", HUB_ORGANIZATION, model_name)
    }
}

/// Resolves model files, downloading them unless `config.offline` is set
pub async fn ensure_model_files(config: &EmbeddingModelConfig) -> Result<ModelFiles> {
    if let Some(files) = local_model_files(&config.model_dir) {
        info!("Using local model files in {}", config.model_dir.display());
        return Ok(files);
    }

    if config.offline {
        bail!(
            "Model files not found in {} (expected {} and {}) and offline mode is enabled",
            config.model_dir.display(),
            MODEL_FILE,
            TOKENIZER_FILE
        );
    }

    let repo_id = hub_repo_id(&config.name);
    info!("Fetching {} from the Hugging Face Hub", repo_id);

    let api = Api::new().context("Failed to initialize Hugging Face Hub client")?;
    let repo = api.model(repo_id.clone());

    let model_path = repo
        .get(HUB_MODEL_FILE)
        .await
        .with_context(|| format!("Failed to download {} from {}", HUB_MODEL_FILE, repo_id))?;
    let tokenizer_path = repo
        .get(TOKENIZER_FILE)
        .await
        .with_context(|| format!("Failed to download {} from {}", TOKENIZER_FILE, repo_id))?;

    info!("Model files cached at {}", model_path.display());

    Ok(ModelFiles {
        model_path,
        tokenizer_path,
    })
}
