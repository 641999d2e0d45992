// ABOUTME: Application constants shared by issuance, verification, and kubeconfig rendering
// ABOUTME: Groups service names, wire-format prefixes, client messages, and config defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors

/// Service identifiers
pub mod service_names {
    /// Issuer claim embedded in every token
    pub const TOKEN_ISSUER: &str = "kubegate-server";
    /// Service name used in logs and health responses
    pub const KUBEGATE_SERVER: &str = "kubegate-server";
}

/// Authorization header schemes
pub mod auth_schemes {
    /// HTTP Basic scheme prefix, case-sensitive
    pub const BASIC_PREFIX: &str = "Basic ";
    /// Bearer scheme prefix, case-sensitive
    pub const BEARER_PREFIX: &str = "Bearer ";
}

/// Kubeconfig document constants
pub mod kubeconfig {
    pub const API_VERSION: &str = "v1";
    pub const KIND: &str = "Config";
    /// Name of the single cluster entry
    pub const CLUSTER_NAME: &str = "kubernetes";
    pub const CONTENT_TYPE: &str = "text/x-yaml; charset=utf-8";
}

/// Fixed client-facing messages
///
/// Per-request failures never tell the caller which check failed.
pub mod messages {
    pub const INVALID_CREDENTIALS: &str = "Basic Auth: Invalid credentials";
    pub const INVALID_TOKEN: &str = "Invalid or expired token";
    pub const INTERNAL_ERROR: &str = "Internal server error";
}

/// Configuration defaults
pub mod defaults {
    pub const HTTP_PORT: u16 = 8000;
    pub const TOKEN_LIFETIME: &str = "4h";
    pub const SIGNING_KEY_PATH: &str = "/var/run/secrets/certs/tls.key";
    pub const KUBE_CA_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";
    pub const DIRECTORY_USERS_FILE: &str = "/etc/kubegate/users.yaml";
    pub const DIRECTORY_TIMEOUT_SECS: u64 = 10;
    pub const DIRECTORY_BACKEND: &str = "static";
    pub const LDAP_PORT: u16 = 389;
    /// Port that implies LDAPS when `LDAP_USE_SSL` is unset
    pub const LDAPS_PORT: u16 = 636;
    /// `%s` is replaced by the escaped username
    pub const LDAP_USER_FILTER: &str = "(cn=%s)";
    /// `%s` is replaced by the escaped user DN
    pub const LDAP_GROUP_FILTER: &str = "(member=%s)";
    pub const RESERVED_NAMESPACES: &[&str] =
        &["kube-system", "kube-public", "kube-node-lease", "default"];
    /// HS512 keys shorter than the digest size weaken the MAC
    pub const MIN_RECOMMENDED_KEY_BYTES: usize = 64;
}

/// Environment variable names read by the configuration loader
pub mod env_vars {
    pub const HTTP_PORT: &str = "HTTP_PORT";
    pub const API_SERVER_URL: &str = "API_SERVER_URL";
    pub const KUBERNETES_SERVICE_HOST: &str = "KUBERNETES_SERVICE_HOST";
    pub const KUBERNETES_SERVICE_PORT: &str = "KUBERNETES_SERVICE_PORT";
    pub const KUBE_CA_DATA: &str = "KUBE_CA_DATA";
    pub const KUBE_CA_PATH: &str = "KUBE_CA_PATH";
    pub const SIGNING_KEY_PATH: &str = "SIGNING_KEY_PATH";
    pub const TOKEN_LIFETIME: &str = "TOKEN_LIFETIME";
    pub const DIRECTORY_USERS_FILE: &str = "DIRECTORY_USERS_FILE";
    pub const DIRECTORY_TIMEOUT_SECS: &str = "DIRECTORY_TIMEOUT_SECS";
    pub const RESERVED_NAMESPACES: &str = "RESERVED_NAMESPACES";
    /// `static` or `ldap`
    pub const DIRECTORY_BACKEND: &str = "DIRECTORY_BACKEND";
    pub const LDAP_SERVER: &str = "LDAP_SERVER";
    pub const LDAP_PORT: &str = "LDAP_PORT";
    pub const LDAP_USE_SSL: &str = "LDAP_USE_SSL";
    pub const LDAP_START_TLS: &str = "LDAP_START_TLS";
    pub const LDAP_SKIP_TLS_VERIFICATION: &str = "LDAP_SKIP_TLS_VERIFICATION";
    pub const LDAP_BINDDN: &str = "LDAP_BINDDN";
    pub const LDAP_PASSWD: &str = "LDAP_PASSWD";
    pub const LDAP_USERBASE: &str = "LDAP_USERBASE";
    pub const LDAP_GROUPBASE: &str = "LDAP_GROUPBASE";
    pub const LDAP_ADMIN_USERBASE: &str = "LDAP_ADMIN_USERBASE";
    pub const LDAP_ADMIN_GROUPBASE: &str = "LDAP_ADMIN_GROUPBASE";
    pub const LDAP_USERFILTER: &str = "LDAP_USERFILTER";
}
