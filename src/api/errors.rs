// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON body returned for every failed request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub detail: String,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unprocessable body: {0}")]
    UnprocessableBody(String),

    /// Body refused before it could be parsed (too large, wrong content type)
    #[error("Request rejected ({status}): {detail}")]
    RequestRejected { status: StatusCode, detail: String },

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApiError {
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::ServiceUnavailable(_) => "service_unavailable",
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::UnprocessableBody(_) => "unprocessable_body",
            ApiError::RequestRejected { status, .. } => match *status {
                StatusCode::PAYLOAD_TOO_LARGE => "payload_too_large",
                StatusCode::UNSUPPORTED_MEDIA_TYPE => "unsupported_media_type",
                _ => "request_rejected",
            },
            ApiError::InternalError(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UnprocessableBody(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::RequestRejected { status, .. } => *status,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        let detail = match self {
            ApiError::ServiceUnavailable(msg)
            | ApiError::InvalidRequest(msg)
            | ApiError::UnprocessableBody(msg)
            | ApiError::InternalError(msg)
            | ApiError::RequestRejected { detail: msg, .. } => msg.clone(),
        };

        ErrorResponse {
            error_type: self.error_type().to_string(),
            detail,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_response())).into_response()
    }
}
