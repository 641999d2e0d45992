// ABOUTME: Domain models for namespace authorization grants and signed token claims
// ABOUTME: Defines the JSON shape embedded in every issued token
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role an identity holds inside a namespace
///
/// Ordered from weakest to strongest so that duplicate grants can be
/// collapsed with `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamespaceRole {
    Read,
    Write,
    Admin,
}

impl NamespaceRole {
    /// Parse a role name, case-insensitively
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "read" => Some(Self::Read),
            "write" => Some(Self::Write),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for NamespaceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One namespace an identity may act on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthorizationGrant {
    pub namespace: String,
    pub role: NamespaceRole,
}

impl AuthorizationGrant {
    pub fn new(namespace: impl Into<String>, role: NamespaceRole) -> Self {
        Self {
            namespace: namespace.into(),
            role,
        }
    }
}

impl fmt::Display for AuthorizationGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.role)
    }
}

/// Claims carried by every issued token
///
/// Claims are signed, not encrypted: any holder of the token can read them.
/// `expires_at` is always `issued_at` plus the configured token lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Namespace grants, in mapper order
    #[serde(rename = "auths")]
    pub authorizations: Vec<AuthorizationGrant>,
    /// Directory username
    #[serde(rename = "user")]
    pub subject: String,
    /// Whether the directory reported administrative membership
    #[serde(rename = "adminAccess")]
    pub is_admin: bool,
    #[serde(rename = "iss")]
    pub issuer: String,
    /// Issued at, seconds since the Unix epoch
    #[serde(rename = "iat")]
    pub issued_at: i64,
    /// Expiration, seconds since the Unix epoch
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claims() -> Claims {
        Claims {
            authorizations: vec![
                AuthorizationGrant::new("ns-dev", NamespaceRole::Write),
                AuthorizationGrant::new("ns-prd", NamespaceRole::Read),
            ],
            subject: "alice".into(),
            is_admin: true,
            issuer: "kubegate-server".into(),
            issued_at: 1_700_000_000,
            expires_at: 1_700_014_400,
        }
    }

    #[test]
    fn test_claims_use_wire_names() {
        let json = serde_json::to_value(sample_claims()).unwrap();
        assert_eq!(json["user"], "alice");
        assert_eq!(json["adminAccess"], true);
        assert_eq!(json["iss"], "kubegate-server");
        assert_eq!(json["exp"], 1_700_014_400);
        assert_eq!(json["auths"][0]["namespace"], "ns-dev");
        assert_eq!(json["auths"][0]["role"], "write");
    }

    #[test]
    fn test_claims_preserve_grant_order() {
        let claims = sample_claims();
        let json = serde_json::to_string(&claims).unwrap();
        let parsed: Claims = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, claims);
    }

    #[test]
    fn test_role_ordering_and_parse() {
        assert!(NamespaceRole::Admin > NamespaceRole::Write);
        assert!(NamespaceRole::Write > NamespaceRole::Read);
        assert_eq!(NamespaceRole::parse("ADMIN"), Some(NamespaceRole::Admin));
        assert_eq!(NamespaceRole::parse("owner"), None);
    }
}
