//! HTTP transport for the relay hub
//!
//! This module provides the long-poll watch endpoint that backs client
//! connections plus the ingest endpoints used by fleet producers.
//!
//! ## Architecture
//!
//! - **Axum** web framework with Tower middleware
//! - **Long-poll** watch requests held open until the broker resolves them
//! - **JSON** request/response bodies throughout
//!
//! ## Endpoints
//!
//! - `GET /api/v1/health` - Health check
//! - `GET /api/v1/watch[?channel=NAME]` - Long-poll for the next snapshot
//! - `POST /api/v1/publish/heartbeat` - Producer heartbeat ingest
//! - `POST /api/v1/publish/escalation` - Producer escalation ingest

pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::ApiState;

use std::net::SocketAddr;

use axum::{
    Router,
    routing::{get, post},
};
use tracing::info;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:8080")
    pub bind_addr: SocketAddr,

    /// Enable CORS for browser-based watchers
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".parse().expect("static default address"),
            enable_cors: true,
        }
    }
}

/// Spawn the API server
///
/// This starts an Axum HTTP server in a background task.
/// Returns the server's local address.
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::trace::TraceLayer;

    info!("starting API server on {}", config.bind_addr);

    let mut app = Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .route("/api/v1/watch", get(routes::watch::watch))
        .route(
            "/api/v1/publish/heartbeat",
            post(routes::publish::publish_heartbeat),
        )
        .route(
            "/api/v1/publish/escalation",
            post(routes::publish::publish_escalation),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
