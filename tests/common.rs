// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides quiet logging, fixed keys, stub directory and mapper, and context builders
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `kubegate`
//!
//! This module provides common test setup functions to reduce duplication
//! across integration tests.

use std::collections::HashMap;
use std::sync::{Arc, Once};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use kubegate::{
    auth::AuthManager,
    authorization::{AuthorizationMapper, GroupNamingMapper},
    config::environment::ServerConfig,
    context::ServerContext,
    directory::{DirectoryAuthenticator, DirectoryIdentity},
    errors::{AppError, AppResult},
    key_management::SigningKey,
    models::{AuthorizationGrant, NamespaceRole},
};

static INIT_LOGGER: Once = Once::new();

/// Secret shared by every test that needs a deterministic key
pub const TEST_SECRET: &[u8] = b"kubegate-test-secret-kubegate-test-secret-kubegate-test-secret-64";

/// PEM bundle accepted by the CA validation
pub const TEST_CA_PEM: &str =
    "-----BEGIN CERTIFICATE-----\nMIIBdGVzdC1jZXJ0aWZpY2F0ZQ==\n-----END CERTIFICATE-----\n";

pub const TEST_API_SERVER: &str = "https://host:6443";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        // Check for TEST_LOG environment variable to control test logging level
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN, // Default to WARN for quiet tests
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

pub fn test_signing_key() -> Arc<SigningKey> {
    Arc::new(SigningKey::from_bytes(TEST_SECRET).unwrap())
}

pub fn test_ca_data() -> String {
    STANDARD.encode(TEST_CA_PEM)
}

/// `Authorization` header value for Basic credentials
pub fn basic_header(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

/// Mapper with a fixed group to grant table
pub struct StubMapper {
    table: HashMap<String, AuthorizationGrant>,
}

impl StubMapper {
    pub fn new(entries: &[(&str, &str, NamespaceRole)]) -> Self {
        Self {
            table: entries
                .iter()
                .map(|(group, ns, role)| ((*group).to_owned(), AuthorizationGrant::new(*ns, *role)))
                .collect(),
        }
    }

    /// Mapper used by the `alice` scenario: `grp-ns-dev` grants write on `ns-dev`
    pub fn scenario() -> Self {
        Self::new(&[("grp-ns-dev", "ns-dev", NamespaceRole::Write)])
    }
}

impl AuthorizationMapper for StubMapper {
    fn map_groups(&self, groups: &[String]) -> Vec<AuthorizationGrant> {
        groups
            .iter()
            .filter_map(|group| self.table.get(group).cloned())
            .collect()
    }
}

#[derive(Clone)]
struct StubUser {
    password: String,
    groups: Vec<String>,
    is_admin: bool,
}

/// In-memory directory with plain-text passwords and an optional delay
#[derive(Clone, Default)]
pub struct StubDirectory {
    users: HashMap<String, StubUser>,
    delay: Option<Duration>,
}

impl StubDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_user(mut self, username: &str, password: &str, groups: &[&str], is_admin: bool) -> Self {
        self.users.insert(
            username.to_owned(),
            StubUser {
                password: password.to_owned(),
                groups: groups.iter().map(|g| (*g).to_owned()).collect(),
                is_admin,
            },
        );
        self
    }

    /// Delay every bind by `delay`, to simulate an unresponsive directory
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Directory used by the `alice` scenario
    pub fn scenario() -> Self {
        Self::new()
            .with_user("alice", "wonderland", &["grp-ns-dev", "grp-admin"], true)
            .with_user("bob", "builder", &["grp-ns-dev"], false)
    }
}

#[async_trait]
impl DirectoryAuthenticator for StubDirectory {
    async fn authenticate(&self, username: &str, password: &str) -> AppResult<DirectoryIdentity> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.users.get(username) {
            Some(user) if user.password == password => Ok(DirectoryIdentity {
                username: username.to_owned(),
                distinguished_name: format!("uid={username},ou=stub"),
            }),
            _ => Err(AppError::authentication_failed(format!("bind failed for {username}"))),
        }
    }

    async fn resolve_groups(&self, identity: &DirectoryIdentity) -> AppResult<Vec<String>> {
        self.users
            .get(&identity.username)
            .map(|user| user.groups.clone())
            .ok_or_else(|| AppError::authentication_failed("identity vanished"))
    }

    async fn is_admin(&self, identity: &DirectoryIdentity) -> bool {
        self.users
            .get(&identity.username)
            .is_some_and(|user| user.is_admin)
    }
}

/// Configuration built from an in-memory variable map
pub fn test_config(token_lifetime: &str, directory_timeout_secs: u64) -> ServerConfig {
    let timeout = directory_timeout_secs.to_string();
    let ca_data = test_ca_data();
    let vars: HashMap<&str, &str> = HashMap::from([
        ("API_SERVER_URL", TEST_API_SERVER),
        ("KUBE_CA_DATA", ca_data.as_str()),
        ("TOKEN_LIFETIME", token_lifetime),
        ("DIRECTORY_TIMEOUT_SECS", timeout.as_str()),
        ("SIGNING_KEY_PATH", "/unused/in/tests"),
    ]);

    ServerConfig::from_lookup(|key| vars.get(key).map(|v| (*v).to_owned())).unwrap()
}

/// Auth manager with the test key and the given mapper
pub fn test_auth_manager(lifetime: Duration, mapper: Arc<dyn AuthorizationMapper>) -> AuthManager {
    AuthManager::new(test_signing_key(), lifetime, mapper)
}

/// Auth manager with the test key and the group naming mapper
pub fn naming_auth_manager(lifetime: Duration) -> AuthManager {
    test_auth_manager(
        lifetime,
        Arc::new(GroupNamingMapper::new(["kube-system", "default"]).unwrap()),
    )
}

/// Full server context over the given directory and mapper
pub fn test_context(
    directory: StubDirectory,
    mapper: Arc<dyn AuthorizationMapper>,
    token_lifetime: &str,
    directory_timeout_secs: u64,
) -> ServerContext {
    init_test_logging();
    ServerContext::build(
        Arc::new(test_config(token_lifetime, directory_timeout_secs)),
        test_signing_key(),
        Arc::new(directory),
        mapper,
    )
}

/// Server context for the `alice`/`bob` scenarios
pub fn scenario_context() -> ServerContext {
    test_context(
        StubDirectory::scenario(),
        Arc::new(StubMapper::scenario()),
        "4h",
        5,
    )
}
