//! Error types for the todo API.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Storage-related errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("category {id} does not exist")]
    CategoryNotFound { id: i64 },

    #[error("Migration failed: {0}")]
    Migration(String),
}

/// Map store errors onto the HTTP contract.
///
/// A missing entity is a bare 404. A dangling category reference is a 400
/// whose body names the offending id. Everything else is a 500.
impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        match self {
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND.into_response(),
            StoreError::CategoryNotFound { .. } => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": self.to_string()})),
            )
                .into_response(),
            other => {
                tracing::error!(error = %other, "Store operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({"error": "internal error"})),
                )
                    .into_response()
            }
        }
    }
}

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
