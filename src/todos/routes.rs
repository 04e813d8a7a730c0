//! REST endpoints for todo items.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use crate::error::StoreError;
use crate::store::{Store, TodoFilter};
use crate::todos::model::{CreateTodoRequest, TodoView, UpdateTodoRequest};

/// Build the todo REST routes.
pub fn todo_routes(store: Arc<dyn Store>) -> Router {
    Router::new()
        .route("/todoitems", get(list_todos).post(create_todo))
        .route("/todoitems/complete", get(list_complete_todos))
        .route("/todoitems/category/{category_id}", get(list_todos_by_category))
        .route(
            "/todoitems/{id}",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .with_state(store)
}

/// GET /todoitems
async fn list_todos(
    State(store): State<Arc<dyn Store>>,
) -> Result<Json<Vec<TodoView>>, StoreError> {
    let todos = store.list_todos(TodoFilter::default()).await?;
    Ok(Json(todos.into_iter().map(TodoView::from).collect()))
}

/// GET /todoitems/complete
async fn list_complete_todos(
    State(store): State<Arc<dyn Store>>,
) -> Result<Json<Vec<TodoView>>, StoreError> {
    let todos = store.list_todos(TodoFilter::complete()).await?;
    Ok(Json(todos.into_iter().map(TodoView::from).collect()))
}

/// GET /todoitems/category/{category_id}
async fn list_todos_by_category(
    State(store): State<Arc<dyn Store>>,
    Path(category_id): Path<i64>,
) -> Result<Json<Vec<TodoView>>, StoreError> {
    let todos = store.list_todos(TodoFilter::in_category(category_id)).await?;
    Ok(Json(todos.into_iter().map(TodoView::from).collect()))
}

/// GET /todoitems/{id}
async fn get_todo(
    State(store): State<Arc<dyn Store>>,
    Path(id): Path<i64>,
) -> Result<Response, StoreError> {
    match store.get_todo(id).await? {
        Some(found) => Ok(Json(TodoView::from(found)).into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

/// POST /todoitems
async fn create_todo(
    State(store): State<Arc<dyn Store>>,
    Json(body): Json<CreateTodoRequest>,
) -> Result<Response, StoreError> {
    let created = store
        .create_todo(body.name.as_deref(), body.is_complete, body.category_id)
        .await?;

    let location = format!("/todoitems/{}", created.todo.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(TodoView::from(created)),
    )
        .into_response())
}

/// PUT /todoitems/{id}
async fn update_todo(
    State(store): State<Arc<dyn Store>>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateTodoRequest>,
) -> Result<Json<TodoView>, StoreError> {
    let updated = store
        .update_todo(id, body.name.as_deref(), body.is_complete, body.category_id)
        .await?;
    Ok(Json(TodoView::from(updated)))
}

/// DELETE /todoitems/{id}
async fn delete_todo(
    State(store): State<Arc<dyn Store>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, StoreError> {
    if store.delete_todo(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Ok(StatusCode::NOT_FOUND)
    }
}
