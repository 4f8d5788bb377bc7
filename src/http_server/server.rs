//! # HTTP Server
//!
//! Main HTTP server combining all endpoint routers.

use std::net::SocketAddr;

use axum::{http::Uri, Router};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::auth_routes::auth_routes;
use super::config::HttpServerConfig;
use super::health_routes::health_routes;
use super::receipt_routes::receipt_routes;
use super::state::AppState;
use crate::api::ErrorSignal;

/// HTTP server for the registration and receipts API
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server over the given state
    pub fn new(config: HttpServerConfig, state: AppState) -> Self {
        let router = Self::build_router(&config, state);
        Self { config, router }
    }

    /// Build the combined router with all endpoints
    pub fn build_router(config: &HttpServerConfig, state: AppState) -> Router {
        Router::new()
            .merge(health_routes())
            .merge(auth_routes(state.clone()))
            .nest("/api", receipt_routes(state))
            .fallback(not_found)
            .layer(cors_layer(config))
            .layer(TraceLayer::new_for_http())
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Start the HTTP server (async)
    pub async fn start(self) -> std::io::Result<()> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid socket address {}: {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "HTTP server listening");

        axum::serve(listener, self.router).await
    }
}

fn cors_layer(config: &HttpServerConfig) -> CorsLayer {
    if config.cors_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn not_found(uri: Uri) -> ErrorSignal {
    ErrorSignal::not_found(format!("Route {} not found", uri.path()))
}
