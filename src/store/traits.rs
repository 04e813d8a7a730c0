//! Backend-agnostic `Store` trait — single async interface for persistence.

use async_trait::async_trait;

use crate::categories::model::Category;
use crate::error::StoreResult;
use crate::todos::model::Todo;

/// A category together with its live member count.
///
/// The count is derived by query; it is never persisted as a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryWithCount {
    pub category: Category,
    pub todo_count: i64,
}

/// A todo together with its resolved category, if it has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoWithCategory {
    pub todo: Todo,
    pub category: Option<CategoryWithCount>,
}

/// Listing filter for todos. Conditions compose with AND.
#[derive(Debug, Clone, Copy, Default)]
pub struct TodoFilter {
    /// Only return completed todos.
    pub only_complete: bool,
    /// Only return todos in this category.
    pub category_id: Option<i64>,
}

impl TodoFilter {
    /// Filter down to completed todos.
    pub fn complete() -> Self {
        Self {
            only_complete: true,
            ..Self::default()
        }
    }

    /// Filter down to one category's todos.
    pub fn in_category(category_id: i64) -> Self {
        Self {
            category_id: Some(category_id),
            ..Self::default()
        }
    }
}

/// Backend-agnostic store covering todos and categories.
#[async_trait]
pub trait Store: Send + Sync {
    // ── Todos ───────────────────────────────────────────────────────

    /// Insert a new todo. Fails with `CategoryNotFound` (writing nothing)
    /// if a category id is supplied that does not resolve.
    async fn create_todo(
        &self,
        name: Option<&str>,
        is_complete: bool,
        category_id: Option<i64>,
    ) -> StoreResult<TodoWithCategory>;

    /// Get a todo by id, with its category resolved.
    async fn get_todo(&self, id: i64) -> StoreResult<Option<TodoWithCategory>>;

    /// List todos in insertion order, optionally filtered.
    async fn list_todos(&self, filter: TodoFilter) -> StoreResult<Vec<TodoWithCategory>>;

    /// Replace every field of an existing todo. Fails with `NotFound` if the
    /// todo does not exist, `CategoryNotFound` if the reference is dangling;
    /// neither failure leaves a partial write.
    async fn update_todo(
        &self,
        id: i64,
        name: Option<&str>,
        is_complete: bool,
        category_id: Option<i64>,
    ) -> StoreResult<TodoWithCategory>;

    /// Delete a todo. Returns false if the id does not exist.
    async fn delete_todo(&self, id: i64) -> StoreResult<bool>;

    // ── Categories ──────────────────────────────────────────────────

    /// Insert a new category.
    async fn create_category(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> StoreResult<CategoryWithCount>;

    /// Get a category by id, with its member count.
    async fn get_category(&self, id: i64) -> StoreResult<Option<CategoryWithCount>>;

    /// List all categories in insertion order.
    async fn list_categories(&self) -> StoreResult<Vec<CategoryWithCount>>;

    /// Replace every field of an existing category.
    async fn update_category(
        &self,
        id: i64,
        name: &str,
        description: Option<&str>,
    ) -> StoreResult<CategoryWithCount>;

    /// Delete a category. Every todo referencing it has its category id set
    /// to null in the same transaction; no todo is deleted. Returns how many
    /// todos were detached.
    async fn delete_category(&self, id: i64) -> StoreResult<usize>;
}
