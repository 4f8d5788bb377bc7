//! Auth HTTP Routes
//!
//! Registration and login endpoints over the shared [`AuthWorkflow`].
//! Argon2 work runs on the blocking pool.

use axum::{
    extract::State,
    http::{header::SET_COOKIE, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::task;
use tracing::error;

use super::payload::Payload;
use super::state::AppState;
use crate::api::{ErrorSignal, SignalResult};
use crate::auth::{AuthWorkflow, TokenResponse};

/// Cookie carrying the access token after login
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Auth routes with shared state
pub fn auth_routes(state: AppState) -> Router {
    Router::new()
        .route("/register", get(register_page).post(register_handler))
        .route("/login", get(login_page).post(login_handler))
        .with_state(state)
}

// ==================
// Handlers
// ==================

async fn register_page() -> impl IntoResponse {
    Json(json!({ "message": "Register" }))
}

async fn login_page() -> impl IntoResponse {
    Json(json!({ "message": "Login" }))
}

/// POST /register
async fn register_handler(
    State(state): State<AppState>,
    Payload(payload): Payload,
) -> SignalResult<impl IntoResponse> {
    let user = run_blocking(state, payload, |auth, payload| auth.register(payload)).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /login
async fn login_handler(
    State(state): State<AppState>,
    Payload(payload): Payload,
) -> SignalResult<impl IntoResponse> {
    let token = run_blocking(state, payload, |auth, payload| auth.login(payload)).await?;
    let cookie = access_token_cookie(&token);
    Ok(([(SET_COOKIE, cookie)], Json(token)))
}

/// `Set-Cookie` value for a freshly issued token
pub fn access_token_cookie(token: &TokenResponse) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        ACCESS_TOKEN_COOKIE, token.access_token, token.expires_in
    )
}

async fn run_blocking<T, F>(state: AppState, payload: Map<String, Value>, op: F) -> SignalResult<T>
where
    T: Send + 'static,
    F: FnOnce(&AuthWorkflow, &Map<String, Value>) -> crate::auth::AuthResult<T> + Send + 'static,
{
    task::spawn_blocking(move || op(&state.auth, &payload))
        .await
        .map_err(|e| {
            error!(error = %e, "auth task panicked");
            ErrorSignal::unexpected()
        })?
        .map_err(ErrorSignal::from)
}
