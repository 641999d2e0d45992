// ABOUTME: Maps directory group memberships to ordered per-namespace authorization grants
// ABOUTME: Provides the mapper trait and the `<namespace>_<role>` group naming convention
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors

//! # Group to Namespace Mapping
//!
//! Directory groups named `<namespace>_<role>` become namespace grants:
//!
//! | Group                | Grant                   |
//! |----------------------|-------------------------|
//! | `payments-dev_write` | `payments-dev` / write  |
//! | `Billing_ADMIN`      | `billing` / admin       |
//! | `kube-system_admin`  | skipped (reserved)      |
//! | `developers`         | skipped (no role)       |

use std::collections::{HashMap, HashSet};

use regex::Regex;
use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::models::{AuthorizationGrant, NamespaceRole};

/// Longest namespace name Kubernetes accepts (DNS-1123 label)
const MAX_NAMESPACE_LEN: usize = 63;

const GROUP_PATTERN: &str =
    r"^(?P<namespace>[a-z0-9]([-a-z0-9]*[a-z0-9])?)_(?P<role>admin|write|read)$";

/// Converts group identifiers into namespace grants
///
/// Implementations must be pure: the same groups always yield the same grants
/// in the same order.
pub trait AuthorizationMapper: Send + Sync {
    /// Grants for `groups`; groups that grant nothing are dropped
    fn map_groups(&self, groups: &[String]) -> Vec<AuthorizationGrant>;
}

/// Mapper implementing the `<namespace>_<role>` group naming convention
#[derive(Debug, Clone)]
pub struct GroupNamingMapper {
    pattern: Regex,
    reserved: HashSet<String>,
}

impl GroupNamingMapper {
    /// Create a mapper that never grants any of `reserved_namespaces`
    ///
    /// # Errors
    ///
    /// Returns `InternalError` if the group pattern fails to compile
    pub fn new<I, S>(reserved_namespaces: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pattern = Regex::new(GROUP_PATTERN).map_err(|e| {
            AppError::internal("group naming pattern failed to compile").with_source(e)
        })?;

        Ok(Self {
            pattern,
            reserved: reserved_namespaces
                .into_iter()
                .map(|ns| ns.into().to_ascii_lowercase())
                .collect(),
        })
    }

    fn parse_group(&self, group: &str) -> Option<AuthorizationGrant> {
        let normalized = group.trim().to_ascii_lowercase();
        let captures = self.pattern.captures(&normalized)?;

        let namespace = captures.name("namespace")?.as_str();
        if namespace.len() > MAX_NAMESPACE_LEN || self.reserved.contains(namespace) {
            return None;
        }

        let role = NamespaceRole::parse(captures.name("role")?.as_str())?;
        Some(AuthorizationGrant::new(namespace, role))
    }
}

impl AuthorizationMapper for GroupNamingMapper {
    fn map_groups(&self, groups: &[String]) -> Vec<AuthorizationGrant> {
        let mut grants: Vec<AuthorizationGrant> = Vec::with_capacity(groups.len());
        let mut positions: HashMap<String, usize> = HashMap::new();

        for group in groups {
            let Some(grant) = self.parse_group(group) else {
                debug!(group = %group, "Group does not map to a namespace grant");
                continue;
            };

            if let Some(&index) = positions.get(&grant.namespace) {
                if grant.role > grants[index].role {
                    grants[index].role = grant.role;
                }
            } else {
                positions.insert(grant.namespace.clone(), grants.len());
                grants.push(grant);
            }
        }

        grants
    }
}
