//! Axum HTTP server for the REST API

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::controller::ControllerState;
use crate::error::{Error, Result};

use super::handlers;

/// Run the REST API server
pub async fn run_server(state: Arc<ControllerState>) -> Result<()> {
    let app = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/clusters", get(handlers::list_clusters))
        .route("/api/v1/clusters/{namespace}/{name}", get(handlers::get_cluster))
        .route("/api/v1/machines", get(handlers::list_machines))
        .route("/api/v1/machines/{namespace}/{name}", get(handlers::get_machine));

    #[cfg(feature = "metrics")]
    let app = app.route("/metrics", get(handlers::metrics));

    let app = app.layer(TraceLayer::new_for_http()).with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 8080));
    info!("REST API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::ConfigError(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::ConfigError(format!("Server error: {}", e)))?;

    Ok(())
}
