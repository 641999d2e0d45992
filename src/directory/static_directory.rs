// ABOUTME: File-backed directory listing users, bcrypt password hashes, and group memberships
// ABOUTME: Verifies passwords on the blocking pool so bcrypt never stalls the async runtime
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use rand::RngCore;
use serde::Deserialize;
use tracing::{info, warn};

use super::{DirectoryAuthenticator, DirectoryIdentity};
use crate::errors::{AppError, AppResult};

/// Cheapest cost bcrypt accepts; used when no stored hash is parseable
const MIN_BCRYPT_COST: u32 = 4;

/// On-disk layout of the users file
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DirectoryFile {
    #[serde(default)]
    admin_groups: Vec<String>,
    #[serde(default)]
    users: Vec<UserEntry>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct UserEntry {
    username: String,
    password_hash: String,
    #[serde(default)]
    groups: Vec<String>,
}

impl fmt::Debug for UserEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserEntry")
            .field("username", &self.username)
            .field("password_hash", &"[REDACTED]")
            .field("groups", &self.groups)
            .finish()
    }
}

struct StaticUser {
    password_hash: String,
    groups: Vec<String>,
}

/// Directory loaded once from a YAML users file
///
/// ```yaml
/// admin_groups: [cluster-admins]
/// users:
///   - username: alice
///     password_hash: "$2b$12$..."
///     groups: [payments-dev_write, cluster-admins]
/// ```
pub struct StaticDirectory {
    users: HashMap<String, StaticUser>,
    admin_groups: HashSet<String>,
    /// Hash checked for unknown users, at the highest cost in the file
    decoy_hash: String,
}

impl StaticDirectory {
    /// Load the directory from a YAML file
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationInvalid` if the file cannot be read or parsed
    pub fn load(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::config_invalid(format!("cannot read directory file {}", path.display()))
                .with_source(e)
        })?;

        let directory = Self::from_yaml_str(&contents)?;
        info!(
            path = %path.display(),
            users = directory.users.len(),
            admin_groups = directory.admin_groups.len(),
            "Static directory loaded"
        );
        Ok(directory)
    }

    /// Parse a directory from YAML text
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationInvalid` on malformed YAML, empty usernames or
    /// duplicate usernames
    pub fn from_yaml_str(yaml: &str) -> AppResult<Self> {
        let file: DirectoryFile = serde_yaml::from_str(yaml).map_err(|e| {
            AppError::config_invalid("directory file is not valid YAML").with_source(e)
        })?;

        let mut users = HashMap::with_capacity(file.users.len());
        for entry in file.users {
            if entry.username.trim().is_empty() {
                return Err(AppError::config_invalid("directory entry has an empty username"));
            }
            if entry.password_hash.is_empty() {
                return Err(AppError::config_invalid(format!(
                    "directory user {} has no password hash",
                    entry.username
                )));
            }

            let user = StaticUser {
                password_hash: entry.password_hash,
                groups: entry.groups,
            };
            if users.insert(entry.username.clone(), user).is_some() {
                return Err(AppError::config_invalid(format!(
                    "directory user {} is listed twice",
                    entry.username
                )));
            }
        }

        let decoy_hash = decoy_hash(users.values().map(|user| user.password_hash.as_str()))?;

        Ok(Self {
            users,
            admin_groups: file.admin_groups.into_iter().collect(),
            decoy_hash,
        })
    }

    /// Number of users in the directory
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    fn distinguished_name(username: &str) -> String {
        format!("uid={username},ou=static")
    }
}

impl fmt::Debug for StaticDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticDirectory")
            .field("users", &self.users.len())
            .field("admin_groups", &self.admin_groups)
            .finish_non_exhaustive()
    }
}

/// Hash a random secret at the highest cost found in `hashes`
///
/// Unknown users are checked against this hash so that they take as long to
/// reject as a wrong password.
fn decoy_hash<'a>(hashes: impl Iterator<Item = &'a str>) -> AppResult<String> {
    let cost = hashes
        .filter_map(|hash| hash.parse::<bcrypt::HashParts>().ok())
        .map(|parts| parts.get_cost())
        .max()
        .unwrap_or(MIN_BCRYPT_COST);

    let mut secret = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut secret);

    bcrypt::hash(hex::encode(secret), cost).map_err(|e| {
        AppError::config_invalid(format!("cannot prepare directory at bcrypt cost {cost}"))
            .with_source(e)
    })
}

/// Verify password against hash using bcrypt with `spawn_blocking`
async fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let password = password.to_owned();
    let hash = hash.to_owned();

    let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(&password, &hash))
        .await
        .map_err(|e| AppError::internal("password verification task failed").with_source(e))?;

    match outcome {
        Ok(matched) => Ok(matched),
        Err(e) => {
            warn!(error = %e, "Stored password hash could not be checked");
            Ok(false)
        }
    }
}

#[async_trait]
impl DirectoryAuthenticator for StaticDirectory {
    async fn authenticate(&self, username: &str, password: &str) -> AppResult<DirectoryIdentity> {
        let Some(user) = self.users.get(username) else {
            verify_password(password, &self.decoy_hash).await?;
            return Err(AppError::authentication_failed(format!(
                "unknown user {username}"
            )));
        };

        if !verify_password(password, &user.password_hash).await? {
            return Err(AppError::authentication_failed(format!(
                "wrong password for {username}"
            )));
        }

        Ok(DirectoryIdentity {
            username: username.to_owned(),
            distinguished_name: Self::distinguished_name(username),
        })
    }

    async fn resolve_groups(&self, identity: &DirectoryIdentity) -> AppResult<Vec<String>> {
        self.users
            .get(&identity.username)
            .map(|user| user.groups.clone())
            .ok_or_else(|| {
                AppError::authentication_failed(format!(
                    "user {} is no longer in the directory",
                    identity.username
                ))
            })
    }

    async fn is_admin(&self, identity: &DirectoryIdentity) -> bool {
        self.users.get(&identity.username).is_some_and(|user| {
            user.groups
                .iter()
                .any(|group| self.admin_groups.contains(group))
        })
    }

    fn backend(&self) -> &'static str {
        "static"
    }

    fn user_count(&self) -> Option<usize> {
        Some(self.users.len())
    }
}
