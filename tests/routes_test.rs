// ABOUTME: HTTP-level tests for the token, kubeconfig, verify, identity, and health routes
// ABOUTME: Drives the full router with tower oneshot requests against a stub directory
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
};
use common::{
    basic_header, scenario_context, test_config, test_context, test_signing_key, StubDirectory,
    StubMapper, TEST_SECRET,
};
use kubegate::{
    constants::{kubeconfig::CONTENT_TYPE as KUBECONFIG_CONTENT_TYPE, messages},
    context::ServerContext,
    directory::StaticDirectory,
    errors::ErrorCode,
    kubeconfig::KubeConfig,
    middleware::{current_claims, REQUEST_ID_HEADER},
    models::{AuthorizationGrant, Claims, NamespaceRole},
    server::build_router,
    utils::auth::Credentials,
};
use tower::ServiceExt;

async fn send(context: ServerContext, request: Request<Body>) -> Response {
    build_router(context).oneshot(request).await.unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get_with_auth(uri: &str, authorization: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, authorization)
        .body(Body::empty())
        .unwrap()
}

fn verify_request(token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/verify")
        .body(Body::from(token.to_owned()))
        .unwrap()
}

async fn issue_token(username: &str, password: &str) -> String {
    let response = send(
        scenario_context(),
        get_with_auth("/token", &basic_header(username, password)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_text(response).await
}

#[tokio::test]
async fn test_issue_then_verify_token() {
    let token = issue_token("alice", "wonderland").await;
    assert_eq!(token.split('.').count(), 3);

    let response = send(scenario_context(), verify_request(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let claims: Claims = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(claims.subject, "alice");
    assert!(claims.is_admin);
    assert_eq!(
        claims.authorizations,
        vec![AuthorizationGrant::new("ns-dev", NamespaceRole::Write)]
    );
}

#[tokio::test]
async fn test_token_response_is_plain_text() {
    let response = send(
        scenario_context(),
        get_with_auth("/token", &basic_header("bob", "builder")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn test_verify_accepts_surrounding_whitespace() {
    let token = issue_token("bob", "builder").await;

    let response = send(scenario_context(), verify_request(&format!("  {token}\n"))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_basic_header_rejected() {
    let response = send(
        scenario_context(),
        get_with_auth("/token", "Basic !!!notbase64!!!"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(response).await, messages::INVALID_CREDENTIALS);
}

#[tokio::test]
async fn test_missing_authorization_rejected() {
    let request = Request::builder()
        .uri("/token")
        .body(Body::empty())
        .unwrap();
    let response = send(scenario_context(), request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(response).await, messages::INVALID_CREDENTIALS);
}

#[tokio::test]
async fn test_wrong_password_and_unknown_user_look_identical() {
    let wrong_password = send(
        scenario_context(),
        get_with_auth("/token", &basic_header("alice", "looking-glass")),
    )
    .await;
    let unknown_user = send(
        scenario_context(),
        get_with_auth("/token", &basic_header("mallory", "wonderland")),
    )
    .await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_text(wrong_password).await,
        body_text(unknown_user).await
    );
}

#[tokio::test]
async fn test_slow_directory_times_out() {
    let context = test_context(
        StubDirectory::scenario().with_delay(Duration::from_secs(3)),
        Arc::new(StubMapper::scenario()),
        "4h",
        1,
    );

    let started = std::time::Instant::now();
    let response = send(
        context.clone(),
        get_with_auth("/token", &basic_header("alice", "wonderland")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(response).await, messages::INVALID_CREDENTIALS);
    assert!(started.elapsed() < Duration::from_secs(3));

    let err = context
        .auth()
        .issuance()
        .issue_for_credentials(&Credentials {
            username: "alice".into(),
            password: "wonderland".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::DirectoryUnavailable);
}

#[tokio::test]
async fn test_verify_rejects_garbage() {
    for body in ["", "not-a-token", "a.b.c"] {
        let response = send(scenario_context(), verify_request(body)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{body:?}");
        assert_eq!(body_text(response).await, messages::INVALID_TOKEN);
    }
}

#[tokio::test]
async fn test_whoami_requires_bearer_scheme() {
    let response = send(scenario_context(), get_with_auth("/whoami", "Token abc")).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(response).await, messages::INVALID_TOKEN);

    let mut headers = axum::http::HeaderMap::new();
    headers.insert(header::AUTHORIZATION, "Token abc".parse().unwrap());
    let context = scenario_context();
    let err = current_claims(&headers, context.auth().auth_manager()).unwrap_err();
    assert_eq!(err.code, ErrorCode::MissingOrMalformedBearer);

    let err = current_claims(&axum::http::HeaderMap::new(), context.auth().auth_manager())
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::MissingOrMalformedBearer);
}

#[tokio::test]
async fn test_whoami_with_valid_bearer() {
    let token = issue_token("bob", "builder").await;

    let response = send(
        scenario_context(),
        get_with_auth("/whoami", &format!("Bearer {token}")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let claims: Claims = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(claims.subject, "bob");
    assert!(!claims.is_admin);
}

#[tokio::test]
async fn test_config_download() {
    let response = send(
        scenario_context(),
        get_with_auth("/config", &basic_header("bob", "builder")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE].to_str().unwrap(),
        KUBECONFIG_CONTENT_TYPE
    );

    let config: KubeConfig = serde_yaml::from_str(&body_text(response).await).unwrap();
    assert_eq!(config.current_context, "kubernetes-bob");
    assert_eq!(config.clusters[0].cluster.server, common::TEST_API_SERVER);
    assert_eq!(
        config.clusters[0].cluster.certificate_authority_data,
        common::test_ca_data()
    );
    assert_eq!(config.users[0].name, "bob");

    let context = scenario_context();
    let claims = context
        .auth()
        .auth_manager()
        .validate_token(&config.users[0].user.token)
        .unwrap();
    assert_eq!(claims.subject, "bob");
}

#[test]
fn test_render_kubeconfig_document() {
    let config = KubeConfig::render("bob", "tok.en.value", "https://host:6443", "Q0E=");
    let yaml = config.to_yaml().unwrap();

    assert!(yaml.contains("apiVersion: v1"));
    assert!(yaml.contains("kind: Config"));
    assert!(yaml.contains("current-context: kubernetes-bob"));
    assert!(yaml.contains("certificate-authority-data: Q0E="));
    assert!(yaml.contains("server: https://host:6443"));
    assert!(yaml.contains("token: tok.en.value"));

    let parsed: KubeConfig = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(parsed, config);
}

#[tokio::test]
async fn test_health_endpoints() {
    for uri in ["/health", "/ready"] {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = send(scenario_context(), request).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn test_ready_reports_startup_state() {
    let request = Request::builder().uri("/ready").body(Body::empty()).unwrap();
    let response = send(scenario_context(), request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let text = body_text(response).await;
    let report: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(report["status"], "ready");
    assert_eq!(report["key_fingerprint"], test_signing_key().fingerprint());
    assert_eq!(report["token_lifetime_secs"], 4 * 3600);
    assert_eq!(report["directory"]["backend"], "custom");
    assert_eq!(report["directory"]["timeout_secs"], 5);
    assert!(report["directory"].get("users").is_none());
    assert_eq!(report["api_server"], "https://host:6443");
    assert!(!text.contains(std::str::from_utf8(TEST_SECRET).unwrap()));
}

#[tokio::test]
async fn test_ready_counts_static_directory_users() {
    let hash = bcrypt::hash("wonderland", 4).unwrap();
    let yaml = format!("users:\n  - {{username: alice, password_hash: \"{hash}\"}}\n");
    let directory = StaticDirectory::from_yaml_str(&yaml).unwrap();
    let context = ServerContext::build(
        Arc::new(test_config("30m", 2)),
        test_signing_key(),
        Arc::new(directory),
        Arc::new(StubMapper::scenario()),
    );

    let request = Request::builder().uri("/ready").body(Body::empty()).unwrap();
    let report: serde_json::Value =
        serde_json::from_str(&body_text(send(context, request).await).await).unwrap();
    assert_eq!(report["token_lifetime_secs"], 1800);
    assert_eq!(report["directory"]["backend"], "static");
    assert_eq!(report["directory"]["users"], 1);
    assert_eq!(report["directory"]["timeout_secs"], 2);
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let request = Request::builder()
        .uri("/health")
        .header(REQUEST_ID_HEADER, "req-1234")
        .body(Body::empty())
        .unwrap();
    let response = send(scenario_context(), request).await;

    assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-1234");

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = send(scenario_context(), request).await;
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
}
