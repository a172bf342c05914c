// This project was developed with assistance from GitHub Copilot
// Server setup and configuration

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::endpoints::{AppState, auth_handler, jwks_handler};
use crate::key_management::KeyStore;

/// Create the application router with all endpoints
pub fn create_app(app_state: AppState) -> Router {
    Router::new()
        .route("/.well-known/jwks.json", get(jwks_handler))
        .route("/jwks", get(jwks_handler)) // Alternative endpoint
        .route("/auth", post(auth_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Seed the key store, bind the listener and serve until shutdown
pub async fn start_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    // Key generation failure is fatal: never serve with a partially seeded store
    let store = KeyStore::seeded(&config)?;
    let app = create_app(Arc::new(store));

    let listener = TcpListener::bind(config.bind_target()).await?;
    let addr = listener.local_addr()?;
    info!(%addr, "JWKS server listening");
    info!("  GET  /.well-known/jwks.json - JWKS endpoint");
    info!("  GET  /jwks                   - Alternative JWKS endpoint");
    info!("  POST /auth                   - Authentication endpoint");
    info!("  POST /auth?expired=true      - Auth with expired key");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("JWKS server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
