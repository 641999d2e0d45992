// ABOUTME: Request tracing helpers for correlation and structured logging
// ABOUTME: Creates one span per HTTP request carrying method, path, and request ID
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors

use axum::http::{HeaderName, Request};
use tracing::Span;

/// Header carrying the per-request correlation ID
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Create the span recorded around each HTTP request
///
/// The request ID is set by the request-id layer before this runs.
pub fn create_request_span<B>(request: &Request<B>) -> Span {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http.request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
    )
}
