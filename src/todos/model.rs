//! Todo data model — entity, request bodies, and the external view.

use serde::{Deserialize, Serialize};

use crate::categories::model::CategoryView;
use crate::store::traits::TodoWithCategory;

/// A single task record, optionally grouped under a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    /// Store-assigned ID, immutable after creation.
    pub id: i64,
    /// Optional short label.
    pub name: Option<String>,
    /// Whether the task is done.
    pub is_complete: bool,
    /// The owning category, if any.
    pub category_id: Option<i64>,
}

/// Body of `POST /todoitems`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default)]
    pub category_id: Option<i64>,
}

/// Body of `PUT /todoitems/{id}`. Replaces every field (not a partial patch).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default)]
    pub category_id: Option<i64>,
}

/// External representation of a [`Todo`].
///
/// The category is flattened to a [`CategoryView`] summary so the
/// Todo↔Category reference cycle never reaches the wire.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoView {
    pub id: i64,
    pub name: Option<String>,
    pub is_complete: bool,
    pub category_id: Option<i64>,
    pub category: Option<CategoryView>,
}

impl From<TodoWithCategory> for TodoView {
    fn from(found: TodoWithCategory) -> Self {
        Self {
            id: found.todo.id,
            name: found.todo.name,
            is_complete: found.todo.is_complete,
            category_id: found.todo.category_id,
            category: found.category.map(CategoryView::from),
        }
    }
}
