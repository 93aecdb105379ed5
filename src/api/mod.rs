//! HTTP API server
//!
//! Serves the JSON ladder API alongside the health and metrics endpoints on
//! a single axum router.

pub mod error;
pub mod handlers;

pub use error::ApiError;

use crate::metrics::monitoring_routes;
use crate::service::app::AppState;
use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderName, Method},
    routing::{get, patch, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host to bind to (typically "0.0.0.0" for all interfaces)
    pub host: String,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
        }
    }
}

/// Build the full router for the given application state
pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route(
            "/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route("/rankings/{category}", get(handlers::category_rankings))
        .route(
            "/players",
            get(handlers::list_players).post(handlers::create_player),
        )
        .route("/players/search", get(handlers::search_players))
        .route("/players/merge", post(handlers::merge_players))
        .route(
            "/players/{id}",
            get(handlers::player_profile).patch(handlers::update_player),
        )
        .route("/players/{id}/matches", get(handlers::player_matches))
        .route("/players/{id}/results", get(handlers::player_results))
        .route("/matches", post(handlers::create_match))
        .route("/matches/{id}", patch(handlers::update_match))
        .route("/results", post(handlers::create_result))
        .route("/results/{id}", patch(handlers::update_result))
        .route("/faceoff/{player1}/{player2}", get(handlers::faceoff))
        .layer(cors_layer());

    monitoring_routes()
        .nest("/api", api)
        .with_state(state)
}

/// Browsers may call the API from any origin, with credentials
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::CONTENT_LENGTH,
            header::ACCEPT_ENCODING,
            HeaderName::from_static("x-csrf-token"),
        ])
        .allow_credentials(true)
}

/// HTTP server with graceful shutdown
pub struct ApiServer {
    config: ApiServerConfig,
    state: Arc<AppState>,
    shutdown_tx: broadcast::Sender<()>,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(config: ApiServerConfig, state: Arc<AppState>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            state,
            shutdown_tx,
        }
    }

    /// Bind and serve until [`ApiServer::stop`] is called
    pub async fn start(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .context("Invalid API server address")?;

        let app = create_router(self.state.clone());
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        info!("API server listening on http://{}", addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("API server shutdown signal received");
            })
            .await?;

        info!("API server stopped");
        Ok(())
    }

    /// Stop the server
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping API server...");

        if let Err(e) = self.shutdown_tx.send(()) {
            warn!("Failed to send shutdown signal to API server: {}", e);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_server_config() {
        let config = ApiServerConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "0.0.0.0");
    }
}
