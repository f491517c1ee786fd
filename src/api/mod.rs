// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod embed;
pub mod errors;
pub mod handlers;
pub mod http_server;

pub use embed::{embed_handler, EmbeddingRequest, EmbeddingResponse};
pub use errors::{ApiError, ErrorResponse};
pub use handlers::{EndpointList, HealthResponse, ServiceInfo};
pub use http_server::{create_app, start_server, AppState};
