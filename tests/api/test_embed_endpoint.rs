// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /embed tests, driven through the full router with stub embedders.
//!
//! Covers:
//! - Order-preserving, one-vector-per-text responses for 1..=100 texts
//! - Batch bounds (empty, 101) and 503 before the model loads
//! - Normalization on by default, off on request
//! - Inference failures and malformed bodies
//! - Request bodies past axum's 2 MB default, and the configured body limit

use super::support::{
    app_with, app_without_model, embed_request, l2_norm, send, texts, FailingEmbedder,
    HashEmbedder, STUB_DIMENSION, STUB_MODEL,
};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use embedding_service::config::MAX_REQUEST_BODY_BYTES;
use serde_json::json;

#[tokio::test]
async fn test_embed_preserves_count_and_order() {
    for count in [1usize, 7, 100] {
        let input = texts(count);
        let (status, body) = send(
            app_with(HashEmbedder),
            embed_request(&json!({ "texts": input, "normalize": false })),
        )
        .await;

        assert_eq!(status, StatusCode::OK, "batch of {} should succeed", count);
        let embeddings = body["embeddings"].as_array().unwrap();
        assert_eq!(embeddings.len(), count);

        for (text, embedding) in input.iter().zip(embeddings) {
            let expected = HashEmbedder::vector_for(text);
            let actual: Vec<f32> = embedding
                .as_array()
                .unwrap()
                .iter()
                .map(|v| v.as_f64().unwrap() as f32)
                .collect();
            assert_eq!(actual.len(), expected.len());
            for (a, e) in actual.iter().zip(&expected) {
                assert!((a - e).abs() < 1e-5, "embedding for {:?} out of order", text);
            }
        }
    }
}

#[tokio::test]
async fn test_embed_vectors_share_dimension() {
    let (status, body) = send(
        app_with(HashEmbedder),
        embed_request(&json!({ "texts": ["short", "a considerably longer sentence", ""] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model"], STUB_MODEL);
    assert_eq!(body["dimensions"], STUB_DIMENSION);
    for embedding in body["embeddings"].as_array().unwrap() {
        assert_eq!(embedding.as_array().unwrap().len(), STUB_DIMENSION);
    }
}

#[tokio::test]
async fn test_embed_normalizes_by_default() {
    let (status, body) = send(
        app_with(HashEmbedder),
        embed_request(&json!({ "texts": ["alpha", "beta", "gamma"] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    for embedding in body["embeddings"].as_array().unwrap() {
        let norm = l2_norm(embedding);
        assert!((norm - 1.0).abs() < 1e-4, "norm was {}", norm);
    }
}

#[tokio::test]
async fn test_embed_normalize_false_returns_raw_vectors() {
    let (status, body) = send(
        app_with(HashEmbedder),
        embed_request(&json!({ "texts": ["alpha"], "normalize": false })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let norm = l2_norm(&body["embeddings"][0]);
    assert!((norm - 1.0).abs() > 0.1, "raw vector should not be unit length");
}

#[tokio::test]
async fn test_embed_empty_batch_is_bad_request() {
    let (status, body) = send(
        app_with(HashEmbedder),
        embed_request(&json!({ "texts": [] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "invalid_request");
    assert_eq!(body["detail"], "No texts provided");
}

#[tokio::test]
async fn test_embed_oversized_batch_is_bad_request() {
    let (status, body) = send(
        app_with(HashEmbedder),
        embed_request(&json!({ "texts": texts(101) })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Maximum 100 texts per request");
}

#[tokio::test]
async fn test_embed_before_model_load_is_unavailable() {
    let (status, body) = send(
        app_without_model(),
        embed_request(&json!({ "texts": ["hello"] })),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error_type"], "service_unavailable");
    assert_eq!(body["detail"], "Model not loaded");
}

#[tokio::test]
async fn test_embed_inference_failure_is_internal_error() {
    let (status, body) = send(
        app_with(FailingEmbedder),
        embed_request(&json!({ "texts": ["hello"] })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_type"], "internal_error");
    assert_eq!(body["detail"], "inference backend crashed");
}

#[tokio::test]
async fn test_embed_malformed_json_is_unprocessable() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/embed")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"texts\": [\"unterminated"))
        .unwrap();

    let (status, body) = send(app_with(HashEmbedder), request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_type"], "unprocessable_body");
}

#[tokio::test]
async fn test_embed_accepts_full_batch_of_long_texts() {
    // 100 texts of ~25 KB each: about 2.5 MB of JSON
    let long_texts: Vec<String> = (0..100)
        .map(|i| format!("document {} {}", i, "word ".repeat(5000)))
        .collect();

    let (status, body) = send(
        app_with(HashEmbedder),
        embed_request(&json!({ "texts": long_texts })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let embeddings = body["embeddings"].as_array().unwrap();
    assert_eq!(embeddings.len(), 100);
    assert_eq!(body["dimensions"], STUB_DIMENSION);
}

#[tokio::test]
async fn test_embed_body_over_limit_is_payload_too_large() {
    let oversized = "x".repeat(MAX_REQUEST_BODY_BYTES);

    let (status, body) = send(
        app_with(HashEmbedder),
        embed_request(&json!({ "texts": [oversized] })),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error_type"], "payload_too_large");
}

#[tokio::test]
async fn test_embed_without_json_content_type_is_unsupported() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/embed")
        .body(Body::from(json!({ "texts": ["hello"] }).to_string()))
        .unwrap();

    let (status, body) = send(app_with(HashEmbedder), request).await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["error_type"], "unsupported_media_type");
}

#[tokio::test]
async fn test_embed_wrong_field_type_is_unprocessable() {
    let (status, _) = send(
        app_with(HashEmbedder),
        embed_request(&json!({ "texts": "not a list" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_embed_concurrent_requests_are_isolated() {
    let app = app_with(HashEmbedder);

    let mut handles = Vec::new();
    for i in 0..16 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            let text = format!("concurrent request {}", i);
            let (status, body) = send(
                app,
                embed_request(&json!({ "texts": [text.clone()], "normalize": false })),
            )
            .await;
            (text, status, body)
        }));
    }

    for handle in handles {
        let (text, status, body) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        let first = body["embeddings"][0][0].as_f64().unwrap() as f32;
        assert!((first - HashEmbedder::vector_for(&text)[0]).abs() < 1e-5);
    }
}
