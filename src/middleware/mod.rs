// ABOUTME: HTTP middleware for request tracing and bearer token authentication
// ABOUTME: Provides request spans with correlation IDs and the verified-claims extractor
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors

pub mod auth;
pub mod tracing;

// Authentication
pub use auth::{current_claims, CurrentClaims};

// Request tracing
pub use tracing::{create_request_span, REQUEST_ID_HEADER};
