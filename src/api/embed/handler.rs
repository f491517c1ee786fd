// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /embed HTTP handler

use crate::api::embed::{EmbeddingRequest, EmbeddingResponse};
use crate::api::http_server::AppState;
use crate::api::ApiError;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::{error, info};

/// POST /embed handler
///
/// Validation order:
/// 1. Body must parse as an `EmbeddingRequest` (422); oversized or
///    non-JSON bodies keep the extractor's status (413, 415)
/// 2. Model must be loaded (503)
/// 3. 1-100 texts (400)
///
/// Any encoding failure is returned as 500 with the error message.
pub async fn embed_handler(
    State(state): State<AppState>,
    payload: Result<Json<EmbeddingRequest>, JsonRejection>,
) -> Result<Json<EmbeddingResponse>, ApiError> {
    let Json(request) = payload.map_err(rejection_error)?;

    if !state.model.is_ready() {
        return Err(ApiError::ServiceUnavailable("Model not loaded".to_string()));
    }

    request.validate()?;

    match state.model.encode(request.texts, request.normalize).await {
        Ok(embeddings) => {
            info!("Generated {} embeddings", embeddings.len());
            Ok(Json(EmbeddingResponse::new(
                embeddings,
                state.model.model_name(),
            )))
        }
        Err(e) => {
            error!("Error generating embeddings: {:#}", e);
            Err(ApiError::InternalError(e.to_string()))
        }
    }
}

fn rejection_error(rejection: JsonRejection) -> ApiError {
    match rejection {
        JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
            ApiError::UnprocessableBody(rejection.body_text())
        }
        other => ApiError::RequestRejected {
            status: other.status(),
            detail: other.body_text(),
        },
    }
}
