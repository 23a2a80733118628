pub mod api;
pub mod dashboard;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        // Pages
        .route("/", get(dashboard::index))
        // API (JSON for charts)
        .route("/api/dashboard", get(api::dashboard))
        // Receipt import
        .route("/api/receipts/preview", post(api::receipt_preview))
        .route("/api/receipts/csv", post(api::receipt_csv))
        // Health check
        .route("/health", get(health))
}

async fn health() -> &'static str {
    "OK"
}
