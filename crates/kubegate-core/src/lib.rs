// ABOUTME: Foundation crate for kubegate with shared error types, claim models, and constants
// ABOUTME: HTTP response mapping is behind the optional `http-response` feature
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors

#![deny(unsafe_code)]

//! # kubegate core
//!
//! Types shared by every layer of the token service:
//!
//! - [`errors`]: the `AppError` taxonomy and its HTTP mapping
//! - [`models`]: namespace grants and signed token claims
//! - [`constants`]: issuer name, kubeconfig constants, fixed client messages

/// Application constants and configuration defaults
pub mod constants;

/// Unified error handling with per-request and startup-fatal error codes
pub mod errors;

/// Namespace grants and token claims
pub mod models;
