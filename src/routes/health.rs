// ABOUTME: Liveness and readiness endpoints for orchestrator checks
// ABOUTME: Readiness reports the signing key, token lifetime, and directory backend loaded at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors

//! Health check routes
//!
//! `/health` answers as soon as the listener is up. `/ready` describes what
//! the server loaded at startup so operators can confirm which key and which
//! directory a replica is serving with, without ever exposing the key itself.

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::constants::service_names;
use crate::context::ServerContext;

/// Liveness response
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

/// Directory section of the readiness response
#[derive(Debug, Serialize)]
pub struct DirectoryReadiness {
    pub backend: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<usize>,
    pub timeout_secs: u64,
}

/// Readiness response
#[derive(Debug, Serialize)]
pub struct ReadinessReport {
    pub status: &'static str,
    /// SHA-256 fingerprint of the HS512 secret
    pub key_fingerprint: String,
    pub token_lifetime_secs: u64,
    pub directory: DirectoryReadiness,
    pub api_server: String,
    pub timestamp: String,
}

/// Health routes
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create all health check routes
    pub fn routes(context: ServerContext) -> Router {
        Router::new()
            .route("/health", get(Self::handle_health))
            .route("/ready", get(Self::handle_ready))
            .with_state(context)
    }

    /// Handle GET /health
    async fn handle_health() -> Json<HealthStatus> {
        Json(HealthStatus {
            status: "healthy",
            service: service_names::KUBEGATE_SERVER,
            version: env!("CARGO_PKG_VERSION"),
            timestamp: Utc::now().to_rfc3339(),
        })
    }

    /// Handle GET /ready
    async fn handle_ready(State(context): State<ServerContext>) -> Json<ReadinessReport> {
        Json(Self::readiness(&context))
    }

    fn readiness(context: &ServerContext) -> ReadinessReport {
        let auth_manager = context.auth().auth_manager();
        let issuance = context.auth().issuance();
        let directory = issuance.directory();

        ReadinessReport {
            status: "ready",
            key_fingerprint: auth_manager.key_fingerprint().to_owned(),
            token_lifetime_secs: auth_manager.token_lifetime().as_secs(),
            directory: DirectoryReadiness {
                backend: directory.backend(),
                users: directory.user_count(),
                timeout_secs: issuance.directory_timeout().as_secs(),
            },
            api_server: context.config().cluster.api_server_url.clone(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}
