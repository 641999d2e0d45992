// ABOUTME: Token issuance, kubeconfig download, and token verification route handlers
// ABOUTME: Exchanges HTTP Basic credentials for signed tokens and checks presented tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors

//! Token routes
//!
//! | Route          | Input               | Success                     |
//! |----------------|---------------------|-----------------------------|
//! | `GET /token`   | Basic credentials   | `200`, token as plain text  |
//! | `GET /config`  | Basic credentials   | `201`, kubeconfig YAML      |
//! | `POST /verify` | raw token as body   | `200`, claims as JSON       |
//!
//! Every per-request failure is answered with `401` and a fixed message.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use crate::constants::kubeconfig::CONTENT_TYPE as KUBECONFIG_CONTENT_TYPE;
use crate::context::ServerContext;
use crate::errors::{AppError, AppResult};
use crate::kubeconfig::KubeConfig;
use crate::logging::AppLogger;
use crate::utils::auth::{extract_basic_credentials, Credentials};

const PLAIN_TEXT: &str = "text/plain; charset=utf-8";

/// Token issuance and verification routes
pub struct TokenRoutes;

impl TokenRoutes {
    /// Create all token routes
    pub fn routes(context: ServerContext) -> Router {
        Router::new()
            .route("/token", get(Self::handle_issue_token))
            .route("/config", get(Self::handle_issue_kubeconfig))
            .route("/verify", post(Self::handle_verify_token))
            .with_state(context)
    }

    /// Pull Basic credentials out of the request headers
    fn basic_credentials(headers: &HeaderMap) -> AppResult<Credentials> {
        let header = headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::invalid_credentials_format("missing Authorization header"))?
            .to_str()
            .map_err(|e| {
                AppError::invalid_credentials_format("Authorization header is not ASCII")
                    .with_source(e)
            })?;

        extract_basic_credentials(header)
    }

    /// Run the issuance flow and log its outcome
    async fn issue(context: &ServerContext, headers: &HeaderMap) -> AppResult<(Credentials, String)> {
        let credentials = Self::basic_credentials(headers)?;

        match context
            .auth()
            .issuance()
            .issue_for_credentials(&credentials)
            .await
        {
            Ok(token) => {
                AppLogger::log_auth_event(&credentials.username, "issue", true, None);
                Ok((credentials, token))
            }
            Err(e) => {
                AppLogger::log_auth_event(
                    &credentials.username,
                    "issue",
                    false,
                    Some(e.code.description()),
                );
                Err(e)
            }
        }
    }

    /// Handle token issuance (GET /token)
    async fn handle_issue_token(
        State(context): State<ServerContext>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let (_, token) = Self::issue(&context, &headers).await?;

        Ok((StatusCode::OK, [(header::CONTENT_TYPE, PLAIN_TEXT)], token).into_response())
    }

    /// Handle kubeconfig download (GET /config)
    async fn handle_issue_kubeconfig(
        State(context): State<ServerContext>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let (credentials, token) = Self::issue(&context, &headers).await?;

        let cluster = &context.config().cluster;
        let yaml = KubeConfig::render(
            &credentials.username,
            &token,
            &cluster.api_server_url,
            &cluster.ca_data,
        )
        .to_yaml()?;

        Ok((
            StatusCode::CREATED,
            [(header::CONTENT_TYPE, KUBECONFIG_CONTENT_TYPE)],
            yaml,
        )
            .into_response())
    }

    /// Handle token verification (POST /verify)
    async fn handle_verify_token(
        State(context): State<ServerContext>,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let token = std::str::from_utf8(&body)
            .map_err(|e| AppError::malformed_token("verify body is not UTF-8").with_source(e))?
            .trim();

        match context.auth().auth_manager().validate_token(token) {
            Ok(claims) => {
                AppLogger::log_auth_event(&claims.subject, "verify", true, None);
                Ok((StatusCode::OK, Json(claims)).into_response())
            }
            Err(e) => {
                AppLogger::log_auth_event("unknown", "verify", false, Some(e.code.description()));
                Err(e)
            }
        }
    }
}
