//! Todo API — record-management backend for todos and their categories.

use std::sync::Arc;

use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::store::Store;

pub mod categories;
pub mod config;
pub mod error;
pub mod store;
pub mod todos;

/// Build the full application router over the given store.
pub fn app(store: Arc<dyn Store>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(todos::routes::todo_routes(Arc::clone(&store)))
        .merge(categories::routes::category_routes(store))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}
