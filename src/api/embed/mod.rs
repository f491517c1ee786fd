// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding API Module
//!
//! This module provides the POST /embed endpoint for turning a batch of
//! texts into sentence embeddings.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::embed_handler;
pub use request::EmbeddingRequest;
pub use response::EmbeddingResponse;
