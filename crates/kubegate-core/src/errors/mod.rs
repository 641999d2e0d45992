// ABOUTME: Unified error taxonomy for credential extraction, token handling, and startup failures
// ABOUTME: Maps every error code to an HTTP status and a fixed, non-revealing client message
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors

//! # Unified Error Handling
//!
//! Every fallible operation in the service returns [`AppResult`]. Error codes fall
//! into three classes:
//!
//! - per-request failures, surfaced as `401` with a generic message
//! - startup-fatal failures, which stop the process before it accepts traffic
//! - unexpected failures, surfaced as `500`
//!
//! The detailed `message` is for logs only and never reaches the client.

use crate::constants::messages;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Standard error codes used throughout the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Basic credential path
    InvalidCredentialsFormat,
    AuthenticationFailed,
    DirectoryUnavailable,

    // Bearer token path
    MalformedToken,
    InvalidSignature,
    TokenExpired,
    MissingOrMalformedBearer,

    // Startup-fatal
    SigningUnavailable,
    ConfigurationInvalid,

    // Unexpected
    SerializationError,
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        if self.is_per_request() {
            401
        } else {
            500
        }
    }

    /// Whether this error is recovered locally and answered with `401`
    #[must_use]
    pub const fn is_per_request(self) -> bool {
        self.is_credential_failure() || self.is_token_failure()
    }

    /// Failures on the HTTP Basic issuance path
    #[must_use]
    pub const fn is_credential_failure(self) -> bool {
        matches!(
            self,
            Self::InvalidCredentialsFormat | Self::AuthenticationFailed | Self::DirectoryUnavailable
        )
    }

    /// Failures on the bearer token verification path
    #[must_use]
    pub const fn is_token_failure(self) -> bool {
        matches!(
            self,
            Self::MalformedToken
                | Self::InvalidSignature
                | Self::TokenExpired
                | Self::MissingOrMalformedBearer
        )
    }

    /// Errors that must prevent the service from accepting traffic
    #[must_use]
    pub const fn is_startup_fatal(self) -> bool {
        matches!(self, Self::SigningUnavailable | Self::ConfigurationInvalid)
    }

    /// Fixed message returned to clients
    #[must_use]
    pub const fn public_message(self) -> &'static str {
        if self.is_credential_failure() {
            messages::INVALID_CREDENTIALS
        } else if self.is_token_failure() {
            messages::INVALID_TOKEN
        } else {
            messages::INTERNAL_ERROR
        }
    }

    /// Operator-facing description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::InvalidCredentialsFormat => "Authorization header is not valid Basic credentials",
            Self::AuthenticationFailed => "Directory rejected the credentials",
            Self::DirectoryUnavailable => "Directory did not answer in time",
            Self::MalformedToken => "Token could not be parsed",
            Self::InvalidSignature => "Token signature does not match",
            Self::TokenExpired => "Token has expired",
            Self::MissingOrMalformedBearer => "Authorization header is not a Bearer token",
            Self::SigningUnavailable => "Signing key is unavailable",
            Self::ConfigurationInvalid => "Configuration is invalid",
            Self::SerializationError => "Serialization failed",
            Self::InternalError => "An internal error occurred",
        }
    }
}

/// Unified error type for the service
#[derive(Debug, Error)]
#[error("{}: {}", .code.description(), .message)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Detailed message, logged but never returned to clients
    pub message: String,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    pub fn invalid_credentials_format(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidCredentialsFormat, message)
    }

    pub fn authentication_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthenticationFailed, message)
    }

    pub fn directory_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DirectoryUnavailable, message)
    }

    pub fn malformed_token(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MalformedToken, message)
    }

    pub fn invalid_signature(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidSignature, message)
    }

    pub fn token_expired(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TokenExpired, message)
    }

    pub fn missing_bearer(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MissingOrMalformedBearer, message)
    }

    pub fn signing_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SigningUnavailable, message)
    }

    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigurationInvalid, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

#[cfg(feature = "http-response")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = http::StatusCode::from_u16(self.http_status())
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);

        if self.code.is_per_request() {
            tracing::debug!(code = ?self.code, error = %self, "request rejected");
        } else {
            tracing::error!(code = ?self.code, error = %self, "request failed");
        }

        (status, self.code.public_message()).into_response()
    }
}
