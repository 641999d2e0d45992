// ABOUTME: Renders issued tokens into a single-cluster kubeconfig document
// ABOUTME: Pure construction plus YAML serialization; nothing is cached between requests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors

use serde::{Deserialize, Serialize};

use crate::constants::kubeconfig::{API_VERSION, CLUSTER_NAME, KIND};
use crate::errors::{AppError, AppResult};

/// Client access configuration for one cluster, one context, and one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KubeConfig {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub clusters: Vec<NamedCluster>,
    pub contexts: Vec<NamedContext>,
    #[serde(rename = "current-context")]
    pub current_context: String,
    pub users: Vec<NamedUser>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: ClusterEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterEntry {
    pub server: String,
    /// Base64-encoded PEM bundle
    #[serde(rename = "certificate-authority-data")]
    pub certificate_authority_data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedContext {
    pub name: String,
    pub context: ContextEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub cluster: String,
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedUser {
    pub name: String,
    pub user: UserEntry,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    pub token: String,
}

impl std::fmt::Debug for UserEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserEntry")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl KubeConfig {
    /// Build the kubeconfig for `username` holding `token`
    #[must_use]
    pub fn render(username: &str, token: &str, cluster_endpoint: &str, ca_data: &str) -> Self {
        let context_name = format!("{CLUSTER_NAME}-{username}");

        Self {
            api_version: API_VERSION.to_owned(),
            kind: KIND.to_owned(),
            clusters: vec![NamedCluster {
                name: CLUSTER_NAME.to_owned(),
                cluster: ClusterEntry {
                    server: cluster_endpoint.to_owned(),
                    certificate_authority_data: ca_data.to_owned(),
                },
            }],
            contexts: vec![NamedContext {
                name: context_name.clone(),
                context: ContextEntry {
                    cluster: CLUSTER_NAME.to_owned(),
                    user: username.to_owned(),
                },
            }],
            current_context: context_name,
            users: vec![NamedUser {
                name: username.to_owned(),
                user: UserEntry {
                    token: token.to_owned(),
                },
            }],
        }
    }

    /// Serialize as a YAML document
    ///
    /// # Errors
    ///
    /// Returns `SerializationError` if YAML encoding fails
    pub fn to_yaml(&self) -> AppResult<String> {
        serde_yaml::to_string(self)
            .map_err(|e| AppError::serialization("kubeconfig YAML encoding failed").with_source(e))
    }
}
