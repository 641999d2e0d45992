// ABOUTME: Orchestrates credential authentication, group resolution, and token signing
// ABOUTME: Bounds the whole directory phase with a timeout so a stalled directory cannot hang requests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument};

use crate::auth::AuthManager;
use crate::directory::{DirectoryAuthenticator, DirectoryIdentity};
use crate::errors::{AppError, AppResult};
use crate::utils::auth::Credentials;

/// Outcome of the directory phase
struct DirectoryAnswer {
    identity: DirectoryIdentity,
    groups: Vec<String>,
    is_admin: bool,
}

/// Issues tokens for HTTP Basic credentials
pub struct TokenIssuanceService {
    directory: Arc<dyn DirectoryAuthenticator>,
    auth_manager: Arc<AuthManager>,
    directory_timeout: Duration,
}

impl TokenIssuanceService {
    #[must_use]
    pub fn new(
        directory: Arc<dyn DirectoryAuthenticator>,
        auth_manager: Arc<AuthManager>,
        directory_timeout: Duration,
    ) -> Self {
        Self {
            directory,
            auth_manager,
            directory_timeout,
        }
    }

    /// Directory queried for every issuance
    #[must_use]
    pub fn directory(&self) -> &dyn DirectoryAuthenticator {
        self.directory.as_ref()
    }

    #[must_use]
    pub const fn directory_timeout(&self) -> Duration {
        self.directory_timeout
    }

    /// Authenticate the credentials and sign a token for the identity
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `AuthenticationFailed` if the directory rejects the credentials
    /// - `DirectoryUnavailable` if the directory does not answer in time
    /// - `SigningUnavailable` if the token cannot be signed
    #[instrument(skip_all, fields(user = %credentials.username))]
    pub async fn issue_for_credentials(&self, credentials: &Credentials) -> AppResult<String> {
        let answer = tokio::time::timeout(self.directory_timeout, self.query_directory(credentials))
            .await
            .map_err(|_| {
                AppError::directory_unavailable(format!(
                    "directory did not answer within {:?}",
                    self.directory_timeout
                ))
            })??;

        let token = self.auth_manager.generate_token(
            &answer.identity.username,
            &answer.groups,
            answer.is_admin,
        )?;

        info!(
            dn = %answer.identity.distinguished_name,
            groups = answer.groups.len(),
            admin = answer.is_admin,
            "Token issued"
        );
        Ok(token)
    }

    async fn query_directory(&self, credentials: &Credentials) -> AppResult<DirectoryAnswer> {
        let identity = self
            .directory
            .authenticate(&credentials.username, &credentials.password)
            .await?;
        let groups = self.directory.resolve_groups(&identity).await?;
        let is_admin = self.directory.is_admin(&identity).await;

        Ok(DirectoryAnswer {
            identity,
            groups,
            is_admin,
        })
    }
}
