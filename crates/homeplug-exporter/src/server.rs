//! Web server setup and routing

use anyhow::Result;
use axum::{routing::get, Router};
use std::sync::Arc;
use tracing::info;

use crate::api;
use crate::state::AppState;

/// Build the router for the configured metrics path
pub fn build_router(state: Arc<AppState>) -> Router {
    let metrics_path = state.config.metrics_path();

    let mut app = Router::new()
        .route(&metrics_path, get(api::metrics))
        .route("/api/netinfo", get(api::netinfo));

    if metrics_path != "/" {
        app = app.route("/", get(api::index));
    }

    app.with_state(state)
}

/// Run the HTTP server until interrupted
pub async fn run(state: Arc<AppState>, bind: &str) -> Result<()> {
    let app = build_router(state.clone());

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(
        address = %bind,
        metrics_path = %state.config.metrics_path(),
        "Starting HTTP server"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.collector.shutdown().await;
    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
