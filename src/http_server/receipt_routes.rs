//! Receipt HTTP Routes
//!
//! Store calls may sync a log file, so they run on the blocking pool.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tokio::task;
use tracing::error;

use super::state::AppState;
use crate::api::{ErrorSignal, SignalResult};
use crate::receipts::ReceiptSummary;

/// Receipt routes, nested under `/api`
pub fn receipt_routes(state: AppState) -> Router {
    Router::new()
        .route("/receipts", get(list_receipts).post(create_receipt))
        .with_state(state)
}

/// GET /api/receipts
async fn list_receipts(State(state): State<AppState>) -> SignalResult<Json<Vec<ReceiptSummary>>> {
    let receipts = run_blocking(move || state.receipts.list()).await?;
    Ok(Json(receipts))
}

/// POST /api/receipts
async fn create_receipt(State(state): State<AppState>) -> SignalResult<StatusCode> {
    run_blocking(move || state.receipts.create()).await?;
    Ok(StatusCode::OK)
}

async fn run_blocking<T, F>(op: F) -> SignalResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> SignalResult<T> + Send + 'static,
{
    task::spawn_blocking(op).await.map_err(|e| {
        error!(error = %e, "receipt task panicked");
        ErrorSignal::unexpected()
    })?
}
