//! OIDC identity provider server binary.
//!
//! Wires the client record store, the client detail cache and the client
//! registry from environment configuration, then serves token request
//! authentication and the client management API with graceful shutdown.

use anyhow::Result;
use idp::{
    config::Config,
    http::{AppState, build_router},
    oauth::{ClientRegistry, TokenRequestValidator},
    storage::{create_client_cache, create_storage_backend, parse_storage_backend},
};
use std::{env, sync::Arc};
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "idp=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();

    let version = idp::config::version()?;

    env::args().for_each(|arg| {
        if arg == "--version" {
            println!("{version}");
            std::process::exit(0);
        }
    });

    tracing::info!(?version, "Starting IdP");

    let config = Config::new()?;

    let backend = parse_storage_backend(&config.storage_backend, config.database_url.as_deref())?;
    tracing::info!(backend = %config.storage_backend, "Using storage backend");
    let client_store = create_storage_backend(backend).await?;

    let client_cache = create_client_cache(
        config.redis_url.as_deref(),
        *config.client_cache_ttl.as_ref(),
    )?;
    tracing::info!(
        redis = config.redis_url.is_some(),
        ttl = ?config.client_cache_ttl.as_ref(),
        "Client detail cache ready"
    );

    let client_registry = ClientRegistry::new(client_store, client_cache);

    let token_validator = TokenRequestValidator::from_config(client_registry.clone(), &config);
    tracing::info!(
        audience = %token_validator.audience(),
        grant_types = ?config.supported_grant_types.as_ref(),
        "Token request validator ready"
    );

    if !*config.enable_client_api.as_ref() {
        tracing::warn!("Client management API is disabled; set ENABLE_CLIENT_API=true to mount it");
    }

    let config = Arc::new(config);
    let app_context = AppState {
        config: config.clone(),
        client_registry,
        token_validator,
    };

    // Build the router
    let app = build_router(app_context);

    // Setup graceful shutdown
    let tracker = TaskTracker::new();
    let token = CancellationToken::new();

    {
        let tracker = tracker.clone();
        let inner_token = token.clone();

        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("failed to install signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::spawn(async move {
            tokio::select! {
                () = inner_token.cancelled() => { },
                _ = terminate => {},
                _ = ctrl_c => {},
            }

            tracker.close();
            inner_token.cancel();
        });
    }

    // Start HTTP server
    {
        let http_port = *config.http_port.as_ref();
        let inner_token = token.clone();
        tracker.spawn(async move {
            let bind_address = format!("0.0.0.0:{http_port}");
            tracing::info!("Starting server on {bind_address}");
            let listener = match TcpListener::bind(&bind_address).await {
                Ok(listener) => listener,
                Err(err) => {
                    tracing::error!("failed to bind {bind_address}: {err}");
                    inner_token.cancel();
                    return;
                }
            };

            let shutdown_token = inner_token.clone();
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_token.cancelled().await;
                    tracing::info!("axum graceful shutdown complete");
                })
                .await;
            if let Err(err) = result {
                tracing::error!("axum task failed: {}", err);
            }

            inner_token.cancel();
        });
    }

    tracker.wait().await;

    Ok(())
}
