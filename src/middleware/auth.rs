// ABOUTME: Bearer token authentication for protected routes
// ABOUTME: Provides the `CurrentClaims` extractor and the header-level verification helper
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::auth::AuthManager;
use crate::context::ServerContext;
use crate::errors::{AppError, AppResult};
use crate::models::Claims;
use crate::utils::auth::extract_bearer_token_from_option;

/// Verified claims of the bearer token presented with the request
///
/// Handlers taking this extractor only run for requests carrying a valid,
/// unexpired token; everything else is answered with `401`.
#[derive(Debug, Clone)]
pub struct CurrentClaims(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentClaims
where
    ServerContext: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let context = ServerContext::from_ref(state);
        current_claims(&parts.headers, context.auth().auth_manager()).map(Self)
    }
}

/// Verify the bearer token in `headers`
///
/// # Errors
///
/// Returns:
/// - `MissingOrMalformedBearer` if the Authorization header is absent, not
///   ASCII, or not a `Bearer` credential
/// - any verification error from [`AuthManager::validate_token`]
#[tracing::instrument(skip_all, fields(user = tracing::field::Empty))]
pub fn current_claims(headers: &HeaderMap, auth_manager: &AuthManager) -> AppResult<Claims> {
    let header = headers
        .get(AUTHORIZATION)
        .map(|value| {
            value.to_str().map_err(|e| {
                AppError::missing_bearer("Authorization header is not ASCII").with_source(e)
            })
        })
        .transpose()?;

    let token = extract_bearer_token_from_option(header)?;
    let claims = auth_manager.validate_token(token)?;

    tracing::Span::current().record("user", claims.subject.as_str());
    Ok(claims)
}
