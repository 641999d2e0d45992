// ABOUTME: Authorization header parsing for HTTP Basic credentials and bearer tokens
// ABOUTME: Every parse failure maps to a single error code per scheme so callers learn nothing extra
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::constants::auth_schemes::{BASIC_PREFIX, BEARER_PREFIX};
use crate::errors::{AppError, AppResult};

/// Username and password taken from a Basic Authorization header
///
/// Lives only for the duration of one request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Decode `Basic base64(username:password)` into credentials
///
/// The scheme prefix is case-sensitive and the payload is split on the first
/// colon only, so passwords may contain colons.
///
/// # Errors
///
/// Returns `InvalidCredentialsFormat` if:
/// - the header does not start with `"Basic "`
/// - the payload is not standard base64
/// - the decoded payload is not UTF-8
/// - the decoded payload has no colon
pub fn extract_basic_credentials(auth_header: &str) -> AppResult<Credentials> {
    let encoded = auth_header
        .strip_prefix(BASIC_PREFIX)
        .ok_or_else(|| AppError::invalid_credentials_format("missing Basic scheme"))?;

    let decoded = STANDARD.decode(encoded.trim()).map_err(|e| {
        AppError::invalid_credentials_format("Basic payload is not base64").with_source(e)
    })?;

    let decoded = String::from_utf8(decoded).map_err(|e| {
        AppError::invalid_credentials_format("Basic payload is not UTF-8").with_source(e)
    })?;

    let (username, password) = decoded
        .split_once(':')
        .ok_or_else(|| AppError::invalid_credentials_format("Basic payload has no colon"))?;

    Ok(Credentials {
        username: username.to_owned(),
        password: password.to_owned(),
    })
}

/// Extract bearer token from Authorization header string
///
/// # Errors
///
/// Returns `MissingOrMalformedBearer` if:
/// - Authorization header doesn't start with "Bearer "
/// - Token is empty after extraction and trimming
pub fn extract_bearer_token(auth_header: &str) -> AppResult<&str> {
    let token = auth_header
        .strip_prefix(BEARER_PREFIX)
        .ok_or_else(|| AppError::missing_bearer("Invalid authorization header format"))?
        .trim();

    if token.is_empty() {
        return Err(AppError::missing_bearer("Empty bearer token"));
    }

    Ok(token)
}

/// Extract bearer token from optional Authorization header
///
/// # Errors
///
/// Returns `MissingOrMalformedBearer` if the header is missing or malformed
pub fn extract_bearer_token_from_option(auth_header: Option<&str>) -> AppResult<&str> {
    let header =
        auth_header.ok_or_else(|| AppError::missing_bearer("Missing authorization header"))?;
    extract_bearer_token(header)
}
