// ABOUTME: Environment configuration for the token server, loaded once at startup
// ABOUTME: Parses ports, cluster endpoint, CA bundle, key path, lifetimes, and directory settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors

//! Environment-based configuration management for production deployment
//!
//! Every value is read through a lookup function so tests can supply a map
//! instead of mutating the process environment. Any problem is reported as
//! `ConfigurationInvalid` and stops the server before it binds.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::info;
use url::Url;

use crate::constants::{defaults, env_vars};
use crate::errors::{AppError, AppResult};

/// Marker every accepted CA bundle must contain
const PEM_CERTIFICATE_MARKER: &str = "-----BEGIN CERTIFICATE-----";

/// Shortest token lifetime accepted
const MIN_TOKEN_LIFETIME: Duration = Duration::from_secs(1);

/// Top-level server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    pub cluster: ClusterConfig,
    pub auth: AuthConfig,
    pub directory: DirectoryConfig,
    pub authorization: AuthorizationConfig,
}

/// Cluster details embedded in rendered kubeconfigs
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// API server endpoint, `http(s)://host[:port]`
    pub api_server_url: String,
    /// Base64-encoded PEM CA bundle
    pub ca_data: String,
}

/// Token signing settings
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub signing_key_path: PathBuf,
    pub token_lifetime: Duration,
    /// Upper bound on the whole directory phase of one issuance
    pub directory_timeout: Duration,
}

/// Directory backend answering issuance requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryBackend {
    /// YAML users file with bcrypt hashes
    Static,
    /// LDAP server, bound with a service account
    Ldap,
}

impl DirectoryBackend {
    fn parse(raw: &str) -> AppResult<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "static" => Ok(Self::Static),
            "ldap" => Ok(Self::Ldap),
            _ => Err(AppError::config_invalid(format!(
                "{} must be `static` or `ldap`, got {raw:?}",
                env_vars::DIRECTORY_BACKEND
            ))),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Ldap => "ldap",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub backend: DirectoryBackend,
    /// Users file read by the static backend
    pub users_file: PathBuf,
    /// Present exactly when `backend` is `Ldap`
    pub ldap: Option<LdapConfig>,
}

/// LDAP connection and search settings
#[derive(Clone, PartialEq, Eq)]
pub struct LdapConfig {
    pub host: String,
    pub port: u16,
    /// Connect with `ldaps://`
    pub use_ssl: bool,
    /// Upgrade a plain connection with StartTLS
    pub start_tls: bool,
    pub skip_tls_verification: bool,
    /// Service account used for searches
    pub bind_dn: String,
    pub bind_password: String,
    pub user_base: String,
    pub group_base: String,
    /// Users under this base are administrators
    pub admin_user_base: Option<String>,
    /// Members of any group under this base are administrators
    pub admin_group_base: Option<String>,
    /// User search filter, `%s` is the escaped username
    pub user_filter: String,
    /// Group search filter, `%s` is the escaped user DN
    pub group_filter: String,
}

impl LdapConfig {
    fn from_lookup<F>(lookup: &F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };
        let required = |key: &str| {
            optional(key).ok_or_else(|| {
                AppError::config_invalid(format!("{key} is required by the LDAP directory"))
            })
        };

        let host = required(env_vars::LDAP_SERVER)?;
        if host.contains('/') || host.contains(char::is_whitespace) {
            return Err(AppError::config_invalid(format!(
                "{} must be a host name, not a URL: {host}",
                env_vars::LDAP_SERVER
            )));
        }

        let port = optional(env_vars::LDAP_PORT)
            .as_deref()
            .map_or(Ok(defaults::LDAP_PORT), |raw| {
                parse_port(env_vars::LDAP_PORT, raw)
            })?;
        let use_ssl = optional(env_vars::LDAP_USE_SSL)
            .as_deref()
            .map_or(Ok(port == defaults::LDAPS_PORT), |raw| {
                parse_bool(env_vars::LDAP_USE_SSL, raw)
            })?;
        let start_tls = optional(env_vars::LDAP_START_TLS)
            .as_deref()
            .map_or(Ok(false), |raw| parse_bool(env_vars::LDAP_START_TLS, raw))?;
        if use_ssl && start_tls {
            return Err(AppError::config_invalid(format!(
                "{} and {} cannot both be enabled",
                env_vars::LDAP_USE_SSL,
                env_vars::LDAP_START_TLS
            )));
        }
        let skip_tls_verification = optional(env_vars::LDAP_SKIP_TLS_VERIFICATION)
            .as_deref()
            .map_or(Ok(false), |raw| {
                parse_bool(env_vars::LDAP_SKIP_TLS_VERIFICATION, raw)
            })?;

        let user_filter = optional(env_vars::LDAP_USERFILTER)
            .unwrap_or_else(|| defaults::LDAP_USER_FILTER.to_owned());
        if !user_filter.contains("%s") {
            return Err(AppError::config_invalid(format!(
                "{} must contain the %s username placeholder",
                env_vars::LDAP_USERFILTER
            )));
        }

        // Passwords keep their surrounding whitespace
        let bind_password = lookup(env_vars::LDAP_PASSWD)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                AppError::config_invalid(format!(
                    "{} is required by the LDAP directory",
                    env_vars::LDAP_PASSWD
                ))
            })?;

        Ok(Self {
            host,
            port,
            use_ssl,
            start_tls,
            skip_tls_verification,
            bind_dn: required(env_vars::LDAP_BINDDN)?,
            bind_password,
            user_base: required(env_vars::LDAP_USERBASE)?,
            group_base: required(env_vars::LDAP_GROUPBASE)?,
            admin_user_base: optional(env_vars::LDAP_ADMIN_USERBASE),
            admin_group_base: optional(env_vars::LDAP_ADMIN_GROUPBASE),
            user_filter,
            group_filter: defaults::LDAP_GROUP_FILTER.to_owned(),
        })
    }

    /// Connection URL, `ldaps://` when SSL is enabled
    #[must_use]
    pub fn url(&self) -> String {
        let scheme = if self.use_ssl { "ldaps" } else { "ldap" };
        if self.host.contains(':') {
            format!("{scheme}://[{}]:{}", self.host, self.port)
        } else {
            format!("{scheme}://{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Debug for LdapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LdapConfig")
            .field("url", &self.url())
            .field("start_tls", &self.start_tls)
            .field("skip_tls_verification", &self.skip_tls_verification)
            .field("bind_dn", &self.bind_dn)
            .field("bind_password", &"[REDACTED]")
            .field("user_base", &self.user_base)
            .field("group_base", &self.group_base)
            .field("admin_user_base", &self.admin_user_base)
            .field("admin_group_base", &self.admin_group_base)
            .field("user_filter", &self.user_filter)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct AuthorizationConfig {
    /// Namespaces never granted through group names
    pub reserved_namespaces: Vec<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationInvalid` if any variable is missing or malformed
    pub fn from_env() -> AppResult<Self> {
        info!("Loading configuration from environment variables");
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationInvalid` if any variable is missing or malformed
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_owned())
        };

        let http_port = parse_port(env_vars::HTTP_PORT, &var_or(
            env_vars::HTTP_PORT,
            &defaults::HTTP_PORT.to_string(),
        ))?;

        let cluster = ClusterConfig {
            api_server_url: resolve_api_server_url(&lookup)?,
            ca_data: resolve_ca_data(&lookup, &var_or(env_vars::KUBE_CA_PATH, defaults::KUBE_CA_PATH))?,
        };

        let token_lifetime = parse_duration(&var_or(
            env_vars::TOKEN_LIFETIME,
            defaults::TOKEN_LIFETIME,
        ))?;
        if token_lifetime < MIN_TOKEN_LIFETIME {
            return Err(AppError::config_invalid(format!(
                "{} must be at least one second",
                env_vars::TOKEN_LIFETIME
            )));
        }
        // Claims carry whole seconds, so `exp - iat` must equal the lifetime exactly
        if token_lifetime.subsec_nanos() != 0 {
            return Err(AppError::config_invalid(format!(
                "{} must be a whole number of seconds",
                env_vars::TOKEN_LIFETIME
            )));
        }

        let timeout_secs: u64 = var_or(
            env_vars::DIRECTORY_TIMEOUT_SECS,
            &defaults::DIRECTORY_TIMEOUT_SECS.to_string(),
        )
        .parse()
        .map_err(|e| {
            AppError::config_invalid(format!(
                "{} is not a whole number of seconds",
                env_vars::DIRECTORY_TIMEOUT_SECS
            ))
            .with_source(e)
        })?;
        if timeout_secs == 0 {
            return Err(AppError::config_invalid(format!(
                "{} must be greater than zero",
                env_vars::DIRECTORY_TIMEOUT_SECS
            )));
        }

        let auth = AuthConfig {
            signing_key_path: PathBuf::from(var_or(
                env_vars::SIGNING_KEY_PATH,
                defaults::SIGNING_KEY_PATH,
            )),
            token_lifetime,
            directory_timeout: Duration::from_secs(timeout_secs),
        };

        let backend = DirectoryBackend::parse(&var_or(
            env_vars::DIRECTORY_BACKEND,
            defaults::DIRECTORY_BACKEND,
        ))?;
        let directory = DirectoryConfig {
            backend,
            users_file: PathBuf::from(var_or(
                env_vars::DIRECTORY_USERS_FILE,
                defaults::DIRECTORY_USERS_FILE,
            )),
            ldap: match backend {
                DirectoryBackend::Static => None,
                DirectoryBackend::Ldap => Some(LdapConfig::from_lookup(&lookup)?),
            },
        };

        let authorization = AuthorizationConfig {
            reserved_namespaces: lookup(env_vars::RESERVED_NAMESPACES).map_or_else(
                || {
                    defaults::RESERVED_NAMESPACES
                        .iter()
                        .map(|ns| (*ns).to_owned())
                        .collect()
                },
                |raw| parse_list(&raw),
            ),
        };

        Ok(Self {
            http_port,
            cluster,
            auth,
            directory,
            authorization,
        })
    }

    /// One-line description of the configuration, free of secrets
    #[must_use]
    pub fn summary(&self) -> String {
        let directory = match &self.directory.ldap {
            Some(ldap) => format!("ldap={} user_base={}", ldap.url(), ldap.user_base),
            None => format!("users_file={}", self.directory.users_file.display()),
        };
        format!(
            "http_port={} api_server={} token_lifetime={}s directory_timeout={}s \
             signing_key={} directory={} {directory} reserved_namespaces={}",
            self.http_port,
            self.cluster.api_server_url,
            self.auth.token_lifetime.as_secs(),
            self.auth.directory_timeout.as_secs(),
            self.auth.signing_key_path.display(),
            self.directory.backend.as_str(),
            self.authorization.reserved_namespaces.join(","),
        )
    }
}

fn parse_port(key: &str, raw: &str) -> AppResult<u16> {
    let port: u16 = raw.parse().map_err(|e| {
        AppError::config_invalid(format!("{key} is not a valid port: {raw}")).with_source(e)
    })?;
    if port == 0 {
        return Err(AppError::config_invalid(format!("{key} must not be zero")));
    }
    Ok(port)
}

/// Parse a boolean the way Go's `strconv.ParseBool` does
fn parse_bool(key: &str, raw: &str) -> AppResult<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(AppError::config_invalid(format!(
            "{key} must be a boolean, got {raw:?}"
        ))),
    }
}

/// Explicit URL first, then the in-cluster service address
fn resolve_api_server_url<F>(lookup: &F) -> AppResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

    let candidate = if let Some(explicit) = non_empty(env_vars::API_SERVER_URL) {
        explicit
    } else {
        match (
            non_empty(env_vars::KUBERNETES_SERVICE_HOST),
            non_empty(env_vars::KUBERNETES_SERVICE_PORT),
        ) {
            (Some(host), Some(port)) if host.contains(':') => format!("https://[{host}]:{port}"),
            (Some(host), Some(port)) => format!("https://{host}:{port}"),
            _ => {
                return Err(AppError::config_invalid(format!(
                    "{} is not set and no in-cluster service address is available",
                    env_vars::API_SERVER_URL
                )))
            }
        }
    };

    validate_api_server_url(&candidate)?;
    Ok(candidate.trim_end_matches('/').to_owned())
}

/// Check that `candidate` is an absolute http(s) URL with a host
///
/// # Errors
///
/// Returns `ConfigurationInvalid` otherwise
pub fn validate_api_server_url(candidate: &str) -> AppResult<()> {
    let url = Url::parse(candidate).map_err(|e| {
        AppError::config_invalid(format!("API server URL is not a valid URL: {candidate}"))
            .with_source(e)
    })?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(AppError::config_invalid(format!(
            "API server URL must be http(s) with a host: {candidate}"
        )));
    }
    Ok(())
}

/// Inline base64 data wins over the CA file
fn resolve_ca_data<F>(lookup: &F, ca_path: &str) -> AppResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(inline) = lookup(env_vars::KUBE_CA_DATA)
        .map(|v| v.split_whitespace().collect::<String>())
        .filter(|v| !v.is_empty())
    {
        validate_ca_data(&inline)?;
        return Ok(inline);
    }

    let pem = std::fs::read(ca_path).map_err(|e| {
        AppError::config_invalid(format!("cannot read CA bundle {ca_path}")).with_source(e)
    })?;
    let encoded = STANDARD.encode(pem);
    validate_ca_data(&encoded)?;
    Ok(encoded)
}

/// Check that `encoded` is base64 of a PEM certificate bundle
///
/// # Errors
///
/// Returns `ConfigurationInvalid` if the data is not base64 or holds no
/// certificate block
pub fn validate_ca_data(encoded: &str) -> AppResult<()> {
    let decoded = STANDARD.decode(encoded).map_err(|e| {
        AppError::config_invalid("CA data is not valid base64").with_source(e)
    })?;

    let text = String::from_utf8_lossy(&decoded);
    if !text.contains(PEM_CERTIFICATE_MARKER) {
        return Err(AppError::config_invalid(
            "CA data does not contain a PEM certificate",
        ));
    }
    Ok(())
}

/// Parse a Go-style duration such as `90s`, `1h30m`, or `2.5h`
///
/// Accepted units are `ns`, `us` (or `µs`), `ms`, `s`, `m`, and `h`. Every
/// number needs a unit, except a bare `0`.
///
/// # Errors
///
/// Returns `ConfigurationInvalid` on empty input, missing or unknown units,
/// negative values, or malformed numbers
pub fn parse_duration(input: &str) -> AppResult<Duration> {
    let text = input.trim();
    let invalid = |reason: &str| AppError::config_invalid(format!("invalid duration {input:?}: {reason}"));

    if text.is_empty() {
        return Err(invalid("empty"));
    }
    if text == "0" {
        return Ok(Duration::ZERO);
    }

    let mut rest = text;
    let mut total_secs = 0f64;

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return Err(invalid("expected a number"));
        }
        let (number, tail) = rest.split_at(number_len);
        let value: f64 = number.parse().map_err(|_| invalid("malformed number"))?;

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_len);

        let scale = match unit {
            "ns" => 1e-9,
            "us" | "µs" | "μs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            "" => return Err(invalid("missing unit")),
            _ => return Err(invalid("unknown unit")),
        };

        total_secs += value * scale;
        rest = next;
    }

    Duration::try_from_secs_f64(total_secs).map_err(|e| invalid("out of range").with_source(e))
}

/// Parse a comma-separated list, dropping blanks
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("4h").unwrap(), Duration::from_secs(14_400));
        assert_eq!(parse_duration("90s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5_400));
        assert_eq!(parse_duration("2.5h").unwrap(), Duration::from_secs(9_000));
        assert_eq!(parse_duration("1500ms").unwrap(), Duration::from_millis(1_500));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        for raw in ["", "4", "h", "-1h", "4 hours", "1d", "1.2.3s", "."] {
            assert!(parse_duration(raw).is_err(), "{raw:?}");
        }
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("X", "TRUE").unwrap());
        assert!(parse_bool("X", "t").unwrap());
        assert!(!parse_bool("X", "0").unwrap());
        assert!(parse_bool("X", "yes").is_err());
        assert!(parse_bool("X", "tRuE").is_err());
    }

    #[test]
    fn test_ldap_url_brackets_ipv6_hosts() {
        let mut config = LdapConfig {
            host: "ldap.example.com".into(),
            port: 389,
            use_ssl: false,
            start_tls: false,
            skip_tls_verification: false,
            bind_dn: "cn=svc".into(),
            bind_password: "secret".into(),
            user_base: "ou=people".into(),
            group_base: "ou=groups".into(),
            admin_user_base: None,
            admin_group_base: None,
            user_filter: defaults::LDAP_USER_FILTER.into(),
            group_filter: defaults::LDAP_GROUP_FILTER.into(),
        };
        assert_eq!(config.url(), "ldap://ldap.example.com:389");

        config.host = "fd00::10".into();
        config.port = 636;
        config.use_ssl = true;
        assert_eq!(config.url(), "ldaps://[fd00::10]:636");
        assert!(!format!("{config:?}").contains("secret"));
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            parse_list(" Kube-System, ,default "),
            vec!["kube-system".to_owned(), "default".to_owned()]
        );
    }

    #[test]
    fn test_validate_api_server_url() {
        assert!(validate_api_server_url("https://10.0.0.1:443").is_ok());
        assert!(validate_api_server_url("http://api.internal").is_ok());
        assert!(validate_api_server_url("ftp://api.internal").is_err());
        assert!(validate_api_server_url("not a url").is_err());
    }

    #[test]
    fn test_validate_ca_data() {
        let pem = "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n";
        assert!(validate_ca_data(&STANDARD.encode(pem)).is_ok());
        assert!(validate_ca_data(&STANDARD.encode("hello")).is_err());
        assert!(validate_ca_data("%%%").is_err());
    }
}
