//! Category data model — entity, request bodies, and the external view.

use serde::{Deserialize, Serialize};

use crate::store::traits::CategoryWithCount;

/// A named grouping for todos, deletable independently of its members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Store-assigned ID, immutable after creation.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Optional free-text description.
    pub description: Option<String>,
}

/// Body of `POST /categories`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of `PUT /categories/{id}`. Replaces every field.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// External representation of a [`Category`].
///
/// Member todos are reported only as a count, never as embedded objects.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryView {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub todo_count: i64,
}

impl From<CategoryWithCount> for CategoryView {
    fn from(found: CategoryWithCount) -> Self {
        Self {
            id: found.category.id,
            name: found.category.name,
            description: found.category.description,
            todo_count: found.todo_count,
        }
    }
}
