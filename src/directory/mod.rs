// ABOUTME: Directory service abstraction used to authenticate users and resolve group membership
// ABOUTME: Token issuance depends only on this trait, never on a concrete directory backend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors

//! # Directory Authentication
//!
//! The issuance flow asks a [`DirectoryAuthenticator`] three questions, in
//! order: are these credentials valid, which groups does the identity belong
//! to, and is the identity an administrator. Any failure is final; the caller
//! never retries.

/// LDAP directory using search-then-bind
pub mod ldap_directory;
/// Static, file-backed directory with bcrypt password hashes
pub mod static_directory;

use async_trait::async_trait;

use crate::errors::AppResult;

pub use ldap_directory::LdapDirectory;
pub use static_directory::StaticDirectory;

/// Identity confirmed by a successful directory bind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryIdentity {
    /// Username as presented by the client
    pub username: String,
    /// Distinguished name of the directory entry
    pub distinguished_name: String,
}

/// Authenticates users against a directory service
#[async_trait]
pub trait DirectoryAuthenticator: Send + Sync {
    /// Validate a username/password pair
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailed` for unknown users or wrong passwords
    async fn authenticate(&self, username: &str, password: &str) -> AppResult<DirectoryIdentity>;

    /// Groups the identity belongs to, in directory order
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailed` if the identity vanished since the bind
    async fn resolve_groups(&self, identity: &DirectoryIdentity) -> AppResult<Vec<String>>;

    /// Whether the identity holds administrative access
    async fn is_admin(&self, identity: &DirectoryIdentity) -> bool;

    /// Short backend name reported by `/ready`
    fn backend(&self) -> &'static str {
        "custom"
    }

    /// Number of known users, when the backend can count them cheaply
    fn user_count(&self) -> Option<usize> {
        None
    }
}
