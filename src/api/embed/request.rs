// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! EmbeddingRequest type for POST /embed

use crate::api::ApiError;
use crate::config::MAX_TEXTS_PER_REQUEST;
use serde::{Deserialize, Serialize};

/// Request body for POST /embed
///
/// # Example
/// ```json
/// {
///   "texts": ["Hello world", "Another text"],
///   "normalize": true
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingRequest {
    /// Text strings to embed (1-100 items)
    pub texts: Vec<String>,

    /// Scale each vector to unit L2 length (recommended for similarity)
    #[serde(default = "default_normalize")]
    pub normalize: bool,
}

fn default_normalize() -> bool {
    true
}

impl EmbeddingRequest {
    /// Checks the batch size: 1 to `MAX_TEXTS_PER_REQUEST` texts.
    ///
    /// Individual texts are not inspected; empty strings are valid input.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.texts.is_empty() {
            return Err(ApiError::InvalidRequest("No texts provided".to_string()));
        }

        if self.texts.len() > MAX_TEXTS_PER_REQUEST {
            return Err(ApiError::InvalidRequest(format!(
                "Maximum {} texts per request",
                MAX_TEXTS_PER_REQUEST
            )));
        }

        Ok(())
    }
}
