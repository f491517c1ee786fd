// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use crate::api::http_server::AppState;
use crate::version;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
    pub model_loaded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointList {
    pub health: String,
    pub embed: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    pub model: String,
    pub dimensions: usize,
    pub endpoints: EndpointList,
}

/// GET /health
///
/// The process answering is healthy; readiness is reported in `model_loaded`.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        model: state.model.model_name(),
        model_loaded: state.model.is_ready(),
    })
}

/// GET /
pub async fn root_handler(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: version::SERVICE_NAME.to_string(),
        version: version::VERSION.to_string(),
        model: state.model.model_name(),
        dimensions: state.model.dimensions(),
        endpoints: EndpointList {
            health: "/health".to_string(),
            embed: "/embed (POST)".to_string(),
        },
    })
}
