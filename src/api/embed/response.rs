// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! EmbeddingResponse type for POST /embed

use serde::{Deserialize, Serialize};

/// Response body for POST /embed
///
/// # Example
/// ```json
/// {
///   "embeddings": [[0.1, 0.2, ...], [0.3, 0.4, ...]],
///   "model": "all-MiniLM-L6-v2",
///   "dimensions": 384
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingResponse {
    /// One vector per input text, in input order
    pub embeddings: Vec<Vec<f32>>,

    /// Model used for embedding
    pub model: String,

    /// Length of each vector (0 when there are none)
    pub dimensions: usize,
}

impl EmbeddingResponse {
    pub fn new(embeddings: Vec<Vec<f32>>, model: impl Into<String>) -> Self {
        let dimensions = embeddings.first().map(Vec::len).unwrap_or(0);

        Self {
            embeddings,
            model: model.into(),
            dimensions,
        }
    }
}
