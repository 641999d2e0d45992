// ABOUTME: HTTP server assembly: router composition, tracing layers, and graceful shutdown
// ABOUTME: Merges the per-domain routers and serves them on a tokio TCP listener
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::context::ServerContext;
use crate::errors::{AppError, AppResult};
use crate::middleware::{create_request_span, REQUEST_ID_HEADER};
use crate::routes::{HealthRoutes, IdentityRoutes, TokenRoutes};

/// Build the complete application router
pub fn build_router(context: ServerContext) -> Router {
    let layers = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(create_request_span::<axum::body::Body>),
        )
        .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER));

    Router::new()
        .merge(TokenRoutes::routes(context.clone()))
        .merge(IdentityRoutes::routes(context.clone()))
        .merge(HealthRoutes::routes(context))
        .layer(layers)
}

/// Bind `port` on all interfaces and serve until `shutdown` resolves
///
/// # Errors
///
/// Returns `InternalError` if the port cannot be bound or the server fails
pub async fn serve<F>(context: ServerContext, port: u16, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        AppError::internal(format!("failed to bind HTTP listener on {addr}")).with_source(e)
    })?;

    info!(%addr, "HTTP server listening");
    serve_with_listener(context, listener, shutdown).await
}

/// Serve on an already bound listener
///
/// # Errors
///
/// Returns `InternalError` if the server fails
pub async fn serve_with_listener<F>(
    context: ServerContext,
    listener: TcpListener,
    shutdown: F,
) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, build_router(context).into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| AppError::internal("HTTP server terminated").with_source(e))?;

    info!("HTTP server stopped");
    Ok(())
}

/// Resolve on Ctrl-C
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
