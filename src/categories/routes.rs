//! REST endpoints for categories.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use crate::categories::model::{CategoryView, CreateCategoryRequest, UpdateCategoryRequest};
use crate::error::StoreError;
use crate::store::Store;

/// Build the category REST routes.
pub fn category_routes(store: Arc<dyn Store>) -> Router {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
        .with_state(store)
}

/// GET /categories
async fn list_categories(
    State(store): State<Arc<dyn Store>>,
) -> Result<Json<Vec<CategoryView>>, StoreError> {
    let categories = store.list_categories().await?;
    Ok(Json(categories.into_iter().map(CategoryView::from).collect()))
}

/// GET /categories/{id}
async fn get_category(
    State(store): State<Arc<dyn Store>>,
    Path(id): Path<i64>,
) -> Result<Response, StoreError> {
    match store.get_category(id).await? {
        Some(found) => Ok(Json(CategoryView::from(found)).into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

/// POST /categories
async fn create_category(
    State(store): State<Arc<dyn Store>>,
    Json(body): Json<CreateCategoryRequest>,
) -> Result<Response, StoreError> {
    let created = store
        .create_category(&body.name, body.description.as_deref())
        .await?;

    let location = format!("/categories/{}", created.category.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(CategoryView::from(created)),
    )
        .into_response())
}

/// PUT /categories/{id}
async fn update_category(
    State(store): State<Arc<dyn Store>>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateCategoryRequest>,
) -> Result<Json<CategoryView>, StoreError> {
    let updated = store
        .update_category(id, &body.name, body.description.as_deref())
        .await?;
    Ok(Json(CategoryView::from(updated)))
}

/// DELETE /categories/{id}
async fn delete_category(
    State(store): State<Arc<dyn Store>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, StoreError> {
    store.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
