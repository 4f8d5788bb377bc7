//! # HTTP Server Module
//!
//! Axum router, shared state and payload extraction.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/register`, `/login` - Registration and login
//! - `/api/receipts` - Receipt generation and listing
//!
//! Every failure is an `ErrorSignal` rendered as the JSON error envelope,
//! including unknown routes.

pub mod auth_routes;
pub mod config;
pub mod health_routes;
pub mod payload;
pub mod receipt_routes;
pub mod server;
pub mod state;

pub use config::HttpServerConfig;
pub use payload::Payload;
pub use server::HttpServer;
pub use state::AppState;
