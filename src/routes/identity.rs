// ABOUTME: Identity route returning the verified claims of the caller's bearer token
// ABOUTME: Reference protected endpoint built on the `CurrentClaims` extractor
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors

use axum::{routing::get, Json, Router};

use crate::context::ServerContext;
use crate::middleware::CurrentClaims;
use crate::models::Claims;

/// Identity routes
pub struct IdentityRoutes;

impl IdentityRoutes {
    /// Create all identity routes
    pub fn routes(context: ServerContext) -> Router {
        Router::new()
            .route("/whoami", get(Self::handle_whoami))
            .with_state(context)
    }

    /// Handle GET /whoami
    async fn handle_whoami(CurrentClaims(claims): CurrentClaims) -> Json<Claims> {
        Json(claims)
    }
}
