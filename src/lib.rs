// ABOUTME: Main library entry point for the kubegate token server
// ABOUTME: Exchanges directory credentials for signed, namespace-scoped cluster tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors

#![deny(unsafe_code)]

//! # kubegate
//!
//! A small HTTP service that authenticates users against a directory and
//! hands back short-lived HS512 tokens describing which Kubernetes
//! namespaces they may use, either raw or wrapped in a kubeconfig.
//!
//! ## Architecture
//!
//! - **Directory**: validates credentials and resolves group membership
//! - **Authorization**: turns `<namespace>_<role>` groups into grants
//! - **Auth**: signs and verifies tokens with a single process-wide key
//! - **Kubeconfig**: renders a token into a client configuration
//! - **Routes**: `/token`, `/config`, `/verify`, `/whoami`, `/health`
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use kubegate::config::environment::ServerConfig;
//! use kubegate::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("kubegate configured: {}", config.summary());
//!     Ok(())
//! }
//! ```

// ── Public API ──────────────────────────────────────────────────────────
// These modules are used by the server binary (src/bin/) and integration tests (tests/).

/// Token issuance and verification
pub mod auth;

/// Group to namespace grant mapping
pub mod authorization;

/// Environment-driven configuration
pub mod config;

/// Dependency injection contexts
pub mod context;

/// Directory authentication abstraction and static backend
pub mod directory;

/// Process-wide signing key
pub mod key_management;

/// Kubeconfig rendering
pub mod kubeconfig;

/// Production logging and structured output
pub mod logging;

/// HTTP middleware for request tracing and bearer authentication
pub mod middleware;

/// `HTTP` routes grouped by domain
pub mod routes;

/// Router assembly and serving
pub mod server;

/// Issuance orchestration services
pub mod services;

/// Header parsing helpers
pub mod utils;

// Foundation types live in kubegate-core
pub use kubegate_core::{constants, errors, models};
