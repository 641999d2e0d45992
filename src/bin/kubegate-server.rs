// ABOUTME: Server binary exchanging directory credentials for namespace-scoped cluster tokens
// ABOUTME: Loads configuration, signing key, and directory before binding the HTTP listener
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kubegate contributors

//! # kubegate server binary
//!
//! Startup fails before the listener binds if the configuration, signing key,
//! or directory cannot be loaded.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use kubegate::{
    authorization::GroupNamingMapper,
    config::{DirectoryBackend, ServerConfig},
    context::ServerContext,
    directory::{DirectoryAuthenticator, LdapDirectory, StaticDirectory},
    errors::{AppError, AppResult},
    key_management::SigningKey,
    logging, server,
};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "kubegate-server")]
#[command(about = "Exchange directory credentials for namespace-scoped Kubernetes tokens")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let context = match bootstrap(&args) {
        Ok(context) => context,
        Err(e) => {
            error!(code = ?e.code, error = %e, "Startup failed");
            return Err(e.into());
        }
    };

    let port = context.config().http_port;
    display_available_endpoints(port);

    if let Err(e) = server::serve(context, port, server::shutdown_signal()).await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    Ok(())
}

/// Load every startup-fatal dependency and wire the server context
fn bootstrap(args: &Args) -> AppResult<ServerContext> {
    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    info!("{}", config.summary());

    let signing_key = Arc::new(SigningKey::load_from_file(&config.auth.signing_key_path)?);
    let directory = load_directory(&config)?;
    let mapper = Arc::new(GroupNamingMapper::new(
        config.authorization.reserved_namespaces.iter().cloned(),
    )?);

    Ok(ServerContext::build(
        Arc::new(config),
        signing_key,
        directory,
        mapper,
    ))
}

/// Build the configured directory backend
fn load_directory(config: &ServerConfig) -> AppResult<Arc<dyn DirectoryAuthenticator>> {
    match (config.directory.backend, &config.directory.ldap) {
        (DirectoryBackend::Ldap, Some(ldap)) => {
            info!(url = %ldap.url(), user_base = %ldap.user_base, "Using LDAP directory");
            Ok(Arc::new(LdapDirectory::new(
                ldap.clone(),
                config.auth.directory_timeout,
            )))
        }
        (DirectoryBackend::Ldap, None) => Err(AppError::config_invalid(
            "LDAP directory selected without LDAP settings",
        )),
        (DirectoryBackend::Static, _) => {
            let directory = StaticDirectory::load(&config.directory.users_file)?;
            if directory.user_count() == 0 {
                warn!(
                    path = %config.directory.users_file.display(),
                    "Directory lists no users; every issuance will be rejected"
                );
            }
            Ok(Arc::new(directory))
        }
    }
}

/// Display all available API endpoints
#[allow(clippy::cognitive_complexity)]
fn display_available_endpoints(port: u16) {
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());

    info!("=== Available API Endpoints ===");
    info!("   Issue Token:       GET  http://{host}:{port}/token");
    info!("   Kubeconfig:        GET  http://{host}:{port}/config");
    info!("   Verify Token:      POST http://{host}:{port}/verify");
    info!("   Who Am I:          GET  http://{host}:{port}/whoami");
    info!("   Health:            GET  http://{host}:{port}/health");
    info!("   Readiness:         GET  http://{host}:{port}/ready");
    info!("=== End of Endpoint List ===");
}
