// ABOUTME: Authentication context for dependency injection of token services
// ABOUTME: Holds the token manager and the issuance service shared by every request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors

use std::sync::Arc;

use crate::auth::AuthManager;
use crate::services::TokenIssuanceService;

/// Authentication context containing token-related dependencies
///
/// # Dependencies
/// - `auth_manager`: token signing and verification
/// - `issuance`: credentials to token orchestration
#[derive(Clone)]
pub struct AuthContext {
    auth_manager: Arc<AuthManager>,
    issuance: Arc<TokenIssuanceService>,
}

impl AuthContext {
    /// Create new authentication context
    #[must_use]
    pub const fn new(auth_manager: Arc<AuthManager>, issuance: Arc<TokenIssuanceService>) -> Self {
        Self {
            auth_manager,
            issuance,
        }
    }

    /// Get auth manager for token operations
    #[must_use]
    pub const fn auth_manager(&self) -> &Arc<AuthManager> {
        &self.auth_manager
    }

    /// Get the issuance service for Basic credential flows
    #[must_use]
    pub const fn issuance(&self) -> &Arc<TokenIssuanceService> {
        &self.issuance
    }
}
