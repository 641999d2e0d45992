// ABOUTME: Composed server context handed to every route as axum state
// ABOUTME: Built once at startup from configuration, signing key, directory, and mapper
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors

use std::sync::Arc;

use super::AuthContext;
use crate::auth::AuthManager;
use crate::authorization::AuthorizationMapper;
use crate::config::ServerConfig;
use crate::directory::DirectoryAuthenticator;
use crate::key_management::SigningKey;
use crate::services::TokenIssuanceService;

/// Composed server context containing all focused contexts
///
/// Every field is immutable after construction; cloning only bumps
/// reference counts.
#[derive(Clone)]
pub struct ServerContext {
    auth: AuthContext,
    config: Arc<ServerConfig>,
}

impl ServerContext {
    /// Create new server context from focused contexts
    #[must_use]
    pub const fn new(auth: AuthContext, config: Arc<ServerConfig>) -> Self {
        Self { auth, config }
    }

    /// Wire the token services from their collaborators
    #[must_use]
    pub fn build(
        config: Arc<ServerConfig>,
        signing_key: Arc<SigningKey>,
        directory: Arc<dyn DirectoryAuthenticator>,
        mapper: Arc<dyn AuthorizationMapper>,
    ) -> Self {
        let auth_manager = Arc::new(AuthManager::new(
            signing_key,
            config.auth.token_lifetime,
            mapper,
        ));
        let issuance = Arc::new(TokenIssuanceService::new(
            directory,
            Arc::clone(&auth_manager),
            config.auth.directory_timeout,
        ));

        Self::new(AuthContext::new(auth_manager, issuance), config)
    }

    /// Get authentication context
    #[must_use]
    pub const fn auth(&self) -> &AuthContext {
        &self.auth
    }

    /// Get server configuration
    #[must_use]
    pub const fn config(&self) -> &Arc<ServerConfig> {
        &self.config
    }
}
