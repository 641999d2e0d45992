// ABOUTME: Token issuance and verification for directory-authenticated identities
// ABOUTME: Signs namespace grants into HS512 JWTs and validates signature, issuer, and expiry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors

//! # Token Issuance and Verification
//!
//! [`AuthManager`] is the only component that touches the signing key. Tokens
//! carry whole-second `iat`/`exp` claims, and `exp` is always `iat` plus the
//! configured lifetime. Verification checks the signature first, then the
//! issuer, then expiry, so a token whose payload was edited is reported as a
//! signature failure.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, Header, Validation};
use tracing::{debug, warn};

use crate::authorization::AuthorizationMapper;
use crate::constants::service_names::TOKEN_ISSUER;
use crate::errors::{AppError, AppResult};
use crate::key_management::SigningKey;
use crate::models::Claims;

/// Signing algorithm for every issued token
const TOKEN_ALGORITHM: Algorithm = Algorithm::HS512;

/// Convert a duration to a human-readable format
fn humanize_seconds(total_secs: i64) -> String {
    let total_secs = total_secs.abs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;

    if hours > 0 {
        format!("{hours} hours")
    } else if minutes > 0 {
        format!("{minutes} minutes")
    } else {
        format!("{total_secs} seconds")
    }
}

/// Issues and validates namespace tokens
#[derive(Clone)]
pub struct AuthManager {
    signing_key: Arc<SigningKey>,
    token_lifetime: Duration,
    mapper: Arc<dyn AuthorizationMapper>,
}

impl AuthManager {
    /// Create a new authentication manager
    ///
    /// Claims carry whole seconds, so any sub-second part of `token_lifetime`
    /// is truncated. `ServerConfig` rejects such lifetimes before they get here.
    #[must_use]
    pub fn new(
        signing_key: Arc<SigningKey>,
        token_lifetime: Duration,
        mapper: Arc<dyn AuthorizationMapper>,
    ) -> Self {
        Self {
            signing_key,
            token_lifetime,
            mapper,
        }
    }

    /// Configured token lifetime
    #[must_use]
    pub const fn token_lifetime(&self) -> Duration {
        self.token_lifetime
    }

    /// Fingerprint of the signing key, reported by `/ready`
    #[must_use]
    pub fn key_fingerprint(&self) -> &str {
        self.signing_key.fingerprint()
    }

    /// Generate a signed token for a directory identity
    ///
    /// # Errors
    ///
    /// Returns `SigningUnavailable` if the claims cannot be signed
    pub fn generate_token(
        &self,
        username: &str,
        groups: &[String],
        is_admin: bool,
    ) -> AppResult<String> {
        self.generate_token_at(username, groups, is_admin, Utc::now())
    }

    /// Generate a signed token as if issued at `now`
    ///
    /// # Errors
    ///
    /// Returns `SigningUnavailable` if the claims cannot be signed
    pub fn generate_token_at(
        &self,
        username: &str,
        groups: &[String],
        is_admin: bool,
        now: DateTime<Utc>,
    ) -> AppResult<String> {
        let claims = self.build_claims(username, groups, is_admin, now);

        let token = encode(
            &Header::new(TOKEN_ALGORITHM),
            &claims,
            self.signing_key.encoding_key(),
        )
        .map_err(|e| AppError::signing_unavailable("token signing failed").with_source(e))?;

        debug!(
            user = %claims.subject,
            grants = claims.authorizations.len(),
            admin = claims.is_admin,
            exp = claims.expires_at,
            "Issued token"
        );
        Ok(token)
    }

    fn build_claims(
        &self,
        username: &str,
        groups: &[String],
        is_admin: bool,
        now: DateTime<Utc>,
    ) -> Claims {
        let issued_at = now.timestamp();
        let lifetime = i64::try_from(self.token_lifetime.as_secs()).unwrap_or(i64::MAX);

        Claims {
            authorizations: self.mapper.map_groups(groups),
            subject: username.to_owned(),
            is_admin,
            issuer: TOKEN_ISSUER.to_owned(),
            issued_at,
            expires_at: issued_at.saturating_add(lifetime),
        }
    }

    /// Validate a token against the current time
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `MalformedToken` if the token cannot be parsed or lacks required claims
    /// - `InvalidSignature` if the signature or algorithm does not match
    /// - `TokenExpired` if the current time is past `exp`
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        self.validate_token_at(token, Utc::now())
    }

    /// Validate a token as if checked at `now`
    ///
    /// # Errors
    ///
    /// Same as [`AuthManager::validate_token`]
    pub fn validate_token_at(&self, token: &str, now: DateTime<Utc>) -> AppResult<Claims> {
        let claims = self.decode_token_claims(token)?;
        Self::check_token_expiry(&claims, now)?;

        debug!(user = %claims.subject, "Token validation successful");
        Ok(claims)
    }

    /// Decode and verify the token without checking expiry
    fn decode_token_claims(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(TOKEN_ALGORITHM);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss"]);

        decode::<Claims>(token, self.signing_key.decoding_key(), &validation)
            .map(|data| data.claims)
            .map_err(|e| Self::convert_jwt_error(token, e))
    }

    /// Whether the header and payload segments of `token` decode cleanly
    ///
    /// A base64 failure on such a token can only come from the signature
    /// segment.
    fn signing_input_decodes(token: &str) -> bool {
        let mut segments = token.split('.');
        let (Some(_), Some(payload), Some(_), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return false;
        };

        jsonwebtoken::decode_header(token).is_ok() && URL_SAFE_NO_PAD.decode(payload).is_ok()
    }

    /// Check if token is expired and return error if so
    fn check_token_expiry(claims: &Claims, now: DateTime<Utc>) -> AppResult<()> {
        let current = now.timestamp();
        if current > claims.expires_at {
            warn!(
                user = %claims.subject,
                "Token expired {} ago",
                humanize_seconds(current - claims.expires_at)
            );
            return Err(AppError::token_expired(format!(
                "token for {} expired at {}, now {}",
                claims.subject, claims.expires_at, current
            )));
        }
        Ok(())
    }

    /// Convert JWT library errors to token error codes
    fn convert_jwt_error(token: &str, e: jsonwebtoken::errors::Error) -> AppError {
        let signature_failure = match e.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => true,
            ErrorKind::Base64(_) => Self::signing_input_decodes(token),
            _ => false,
        };
        let issuer_mismatch = matches!(e.kind(), ErrorKind::InvalidIssuer);

        if signature_failure {
            warn!("Token signature verification failed");
            AppError::invalid_signature("token signature verification failed").with_source(e)
        } else if issuer_mismatch {
            warn!("Token issuer does not match");
            AppError::malformed_token("token issuer does not match").with_source(e)
        } else {
            debug!(error = %e, "Token could not be parsed");
            AppError::malformed_token("token could not be parsed").with_source(e)
        }
    }
}

impl std::fmt::Debug for AuthManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthManager")
            .field("signing_key", &self.signing_key)
            .field("token_lifetime", &self.token_lifetime)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorization::GroupNamingMapper;
    use crate::errors::ErrorCode;
    use crate::models::{AuthorizationGrant, NamespaceRole};

    fn manager(lifetime_secs: u64) -> AuthManager {
        AuthManager::new(
            Arc::new(SigningKey::from_bytes(&[42u8; 64]).unwrap()),
            Duration::from_secs(lifetime_secs),
            Arc::new(GroupNamingMapper::new(["kube-system"]).unwrap()),
        )
    }

    #[test]
    fn test_expiry_is_issued_at_plus_lifetime() {
        let auth = manager(14_400);
        let now = Utc::now();
        let token = auth
            .generate_token_at("alice", &["dev_write".to_owned()], false, now)
            .unwrap();
        let claims = auth.validate_token_at(&token, now).unwrap();

        assert_eq!(claims.issued_at, now.timestamp());
        assert_eq!(claims.expires_at, now.timestamp() + 14_400);
        assert_eq!(claims.issuer, TOKEN_ISSUER);
        assert_eq!(
            claims.authorizations,
            vec![AuthorizationGrant::new("dev", NamespaceRole::Write)]
        );
    }

    #[test]
    fn test_garbage_is_malformed() {
        let auth = manager(60);
        for token in ["", "abc", "a.b", "a.b.c", "....", "\u{0}\u{1}"] {
            let err = auth.validate_token(token).unwrap_err();
            assert_eq!(err.code, ErrorCode::MalformedToken, "{token:?}");
        }
    }

    #[test]
    fn test_humanize_seconds() {
        assert_eq!(humanize_seconds(5), "5 seconds");
        assert_eq!(humanize_seconds(125), "2 minutes");
        assert_eq!(humanize_seconds(7300), "2 hours");
    }
}
