// ABOUTME: LDAP-backed directory: service-account search, user bind, and group membership lookup
// ABOUTME: Opens a fresh connection per question so no directory state outlives a request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors

//! # LDAP Directory
//!
//! Authentication is a search-then-bind:
//!
//! 1. bind as the service account (`LDAP_BINDDN`)
//! 2. search `LDAP_USERBASE` with `LDAP_USERFILTER` for exactly one entry
//! 3. re-bind as that entry with the caller's password
//!
//! Groups are the `cn` of every entry under `LDAP_GROUPBASE` whose `member`
//! is the user DN. Connection and search failures are `DirectoryUnavailable`;
//! a rejected user bind is `AuthenticationFailed`.

use std::time::Duration;

use async_trait::async_trait;
use ldap3::{
    ldap_escape, Ldap, LdapConnAsync, LdapConnSettings, LdapResult, Scope, SearchEntry,
    SearchResult,
};
use tracing::{debug, warn};

use super::{DirectoryAuthenticator, DirectoryIdentity};
use crate::config::LdapConfig;
use crate::errors::{AppError, AppResult};

/// Attribute list meaning "no attributes" (RFC 4511 section 4.5.1.8)
const NO_ATTRIBUTES: &str = "1.1";

const GROUP_NAME_ATTRIBUTE: &str = "cn";

/// Directory served by an LDAP server
pub struct LdapDirectory {
    config: LdapConfig,
    connect_timeout: Duration,
}

impl LdapDirectory {
    #[must_use]
    pub const fn new(config: LdapConfig, connect_timeout: Duration) -> Self {
        Self {
            config,
            connect_timeout,
        }
    }

    async fn connect(&self) -> AppResult<Ldap> {
        let url = self.config.url();
        let settings = LdapConnSettings::new()
            .set_conn_timeout(self.connect_timeout)
            .set_starttls(self.config.start_tls)
            .set_no_tls_verify(self.config.skip_tls_verification);

        let (conn, ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|e| {
                AppError::directory_unavailable(format!("cannot connect to {url}")).with_source(e)
            })?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection terminated");
            }
        });
        Ok(ldap)
    }

    /// Connection bound as the service account
    async fn service_connection(&self) -> AppResult<Ldap> {
        let mut ldap = self.connect().await?;
        ldap.simple_bind(&self.config.bind_dn, &self.config.bind_password)
            .await
            .and_then(LdapResult::success)
            .map_err(|e| {
                AppError::directory_unavailable(format!(
                    "service account bind as {} failed",
                    self.config.bind_dn
                ))
                .with_source(e)
            })?;
        Ok(ldap)
    }

    async fn search(
        ldap: &mut Ldap,
        base: &str,
        filter: &str,
        attributes: Vec<&str>,
    ) -> AppResult<Vec<SearchEntry>> {
        let (entries, _) = ldap
            .search(base, Scope::Subtree, filter, attributes)
            .await
            .and_then(SearchResult::success)
            .map_err(|e| {
                AppError::directory_unavailable(format!("search under {base} failed"))
                    .with_source(e)
            })?;

        Ok(entries.into_iter().map(SearchEntry::construct).collect())
    }

    /// Find the single entry matching `username`, then bind as it
    async fn bind_user(&self, ldap: &mut Ldap, username: &str, password: &str) -> AppResult<String> {
        let filter = fill_filter(&self.config.user_filter, username);
        let entries =
            Self::search(ldap, &self.config.user_base, &filter, vec![NO_ATTRIBUTES]).await?;

        let dn = match entries.as_slice() {
            [entry] => entry.dn.clone(),
            [] => {
                return Err(AppError::authentication_failed(format!(
                    "unknown user {username}"
                )))
            }
            many => {
                return Err(AppError::authentication_failed(format!(
                    "{filter} matches {} entries",
                    many.len()
                )))
            }
        };

        let outcome = ldap.simple_bind(&dn, password).await.map_err(|e| {
            AppError::directory_unavailable(format!("bind as {dn} did not complete")).with_source(e)
        })?;
        outcome.success().map_err(|e| {
            AppError::authentication_failed(format!("bind rejected for {dn}")).with_source(e)
        })?;

        Ok(dn)
    }

    async fn is_admin_member(&self, identity: &DirectoryIdentity) -> AppResult<bool> {
        if let Some(base) = &self.config.admin_user_base {
            if dn_is_under(&identity.distinguished_name, base) {
                return Ok(true);
            }
        }

        let Some(base) = &self.config.admin_group_base else {
            return Ok(false);
        };

        let mut ldap = self.service_connection().await?;
        let filter = fill_filter(&self.config.group_filter, &identity.distinguished_name);
        let entries = Self::search(&mut ldap, base, &filter, vec![NO_ATTRIBUTES]).await;
        close(ldap).await;

        Ok(!entries?.is_empty())
    }
}

#[async_trait]
impl DirectoryAuthenticator for LdapDirectory {
    async fn authenticate(&self, username: &str, password: &str) -> AppResult<DirectoryIdentity> {
        // An empty password is an unauthenticated bind, which servers accept
        if password.is_empty() {
            return Err(AppError::authentication_failed(format!(
                "empty password for {username}"
            )));
        }

        let mut ldap = self.service_connection().await?;
        let bound = self.bind_user(&mut ldap, username, password).await;
        close(ldap).await;

        Ok(DirectoryIdentity {
            username: username.to_owned(),
            distinguished_name: bound?,
        })
    }

    async fn resolve_groups(&self, identity: &DirectoryIdentity) -> AppResult<Vec<String>> {
        let mut ldap = self.service_connection().await?;
        let filter = fill_filter(&self.config.group_filter, &identity.distinguished_name);
        let entries = Self::search(
            &mut ldap,
            &self.config.group_base,
            &filter,
            vec![GROUP_NAME_ATTRIBUTE],
        )
        .await;
        close(ldap).await;

        Ok(entries?.iter().filter_map(group_name).collect())
    }

    async fn is_admin(&self, identity: &DirectoryIdentity) -> bool {
        match self.is_admin_member(identity).await {
            Ok(is_admin) => is_admin,
            Err(e) => {
                warn!(
                    dn = %identity.distinguished_name,
                    error = %e,
                    "Admin lookup failed; treating as non-admin"
                );
                false
            }
        }
    }

    fn backend(&self) -> &'static str {
        "ldap"
    }
}

async fn close(mut ldap: Ldap) {
    if let Err(e) = ldap.unbind().await {
        debug!(error = %e, "LDAP unbind failed");
    }
}

/// Substitute the escaped `value` for every `%s` in `template`
fn fill_filter(template: &str, value: &str) -> String {
    template.replace("%s", &ldap_escape(value))
}

/// Whether `dn` equals `base` or sits below it, ignoring case and spacing after commas
fn dn_is_under(dn: &str, base: &str) -> bool {
    let normalize = |value: &str| {
        value
            .split(',')
            .map(|rdn| rdn.trim().to_ascii_lowercase())
            .collect::<Vec<_>>()
    };

    let dn = normalize(dn);
    let base = normalize(base);
    dn.len() >= base.len() && dn[dn.len() - base.len()..] == base[..]
}

/// Group name from the `cn` attribute, else the first RDN value
fn group_name(entry: &SearchEntry) -> Option<String> {
    entry
        .attrs
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(GROUP_NAME_ATTRIBUTE))
        .and_then(|(_, values)| values.first().cloned())
        .or_else(|| {
            let rdn = entry.dn.split(',').next()?;
            let (_, value) = rdn.split_once('=')?;
            Some(value.trim().to_owned())
        })
}
