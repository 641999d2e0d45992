// ABOUTME: Process-wide HMAC signing key for token issuance and verification
// ABOUTME: Loads the secret once at startup, derives JWT keys, and zeroizes the raw bytes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors

//! # Signing Key Management
//!
//! A single symmetric secret signs and verifies every token. It is read once
//! from disk before the listener binds and is never mutated or rotated.
//! The raw buffer is wiped as soon as the HMAC keys are derived, and the
//! type never prints its contents.

use std::fmt;
use std::path::Path;

use jsonwebtoken::{DecodingKey, EncodingKey};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::constants::defaults::MIN_RECOMMENDED_KEY_BYTES;
use crate::errors::{AppError, AppResult};

/// Length of the hex fingerprint used to identify a key in logs
const FINGERPRINT_HEX_LEN: usize = 16;

/// Immutable HMAC-SHA-512 secret shared by the issuer and the verifier
pub struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
    fingerprint: String,
    length: usize,
}

impl SigningKey {
    /// Build a signing key from raw secret bytes
    ///
    /// # Errors
    ///
    /// Returns `SigningUnavailable` if the secret is empty
    pub fn from_bytes(secret: &[u8]) -> AppResult<Self> {
        if secret.is_empty() {
            return Err(AppError::signing_unavailable("signing key is empty"));
        }

        if secret.len() < MIN_RECOMMENDED_KEY_BYTES {
            warn!(
                key_bytes = secret.len(),
                recommended = MIN_RECOMMENDED_KEY_BYTES,
                "Signing key is shorter than the HS512 digest size"
            );
        }

        Ok(Self::derive(secret))
    }

    /// Load the secret from a file; the whole file content is the key
    ///
    /// # Errors
    ///
    /// Returns `SigningUnavailable` if the file cannot be read or is empty
    pub fn load_from_file(path: &Path) -> AppResult<Self> {
        let raw = Zeroizing::new(std::fs::read(path).map_err(|e| {
            AppError::signing_unavailable(format!(
                "cannot read signing key {}",
                path.display()
            ))
            .with_source(e)
        })?);

        let key = Self::from_bytes(&raw)?;
        info!(
            path = %path.display(),
            fingerprint = %key.fingerprint,
            "Signing key loaded"
        );
        Ok(key)
    }

    /// Generate a random 64-byte key
    #[must_use]
    pub fn generate() -> Self {
        let mut secret = Zeroizing::new([0u8; MIN_RECOMMENDED_KEY_BYTES]);
        rand::thread_rng().fill_bytes(&mut secret[..]);
        Self::derive(&secret[..])
    }

    fn derive(secret: &[u8]) -> Self {
        let mut fingerprint = hex::encode(Sha256::digest(secret));
        fingerprint.truncate(FINGERPRINT_HEX_LEN);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            fingerprint,
            length: secret.len(),
        }
    }

    pub(crate) const fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    pub(crate) const fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }

    /// Short SHA-256 fingerprint, safe to log
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Secret length in bytes
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Always false; empty keys are rejected at construction
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("fingerprint", &self.fingerprint)
            .field("length", &self.length)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_key_rejected() {
        let err = SigningKey::from_bytes(&[]).unwrap_err();
        assert_eq!(
            err.code,
            crate::errors::ErrorCode::SigningUnavailable
        );
    }

    #[test]
    fn test_fingerprint_is_stable_and_short() {
        let a = SigningKey::from_bytes(b"same-secret").unwrap();
        let b = SigningKey::from_bytes(b"same-secret").unwrap();
        let c = SigningKey::from_bytes(b"other-secret").unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), FINGERPRINT_HEX_LEN);
    }

    #[test]
    fn test_debug_does_not_leak_secret() {
        let key = SigningKey::from_bytes(b"super-secret-material").unwrap();
        let rendered = format!("{key:?}");
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains("super-secret-material"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[7u8; 64]).unwrap();
        let key = SigningKey::load_from_file(file.path()).unwrap();
        assert_eq!(key.len(), 64);
    }

    #[test]
    fn test_load_missing_file_is_signing_unavailable() {
        let err = SigningKey::load_from_file(Path::new("/nonexistent/kubegate/tls.key"))
            .unwrap_err();
        assert_eq!(
            err.code,
            crate::errors::ErrorCode::SigningUnavailable
        );
        assert!(err.code.is_startup_fatal());
    }

    #[test]
    fn test_generated_keys_differ() {
        let a = SigningKey::generate();
        let b = SigningKey::generate();
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert!(!a.is_empty());
    }
}
