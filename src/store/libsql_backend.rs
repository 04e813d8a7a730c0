//! libSQL backend — async `Store` trait implementation.
//!
//! Supports local file and in-memory databases. Referential checks and the
//! category-delete detach run inside a single transaction, so a category
//! deleted between check and write can never leave a dangling reference.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::categories::model::Category;
use crate::error::{StoreError, StoreResult};
use crate::store::migrations;
use crate::store::traits::{CategoryWithCount, Store, TodoFilter, TodoWithCategory};
use crate::todos::model::Todo;

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Pool(format!("Failed to create connection: {e}")))?;

        migrations::run_migrations(&conn).await?;
        info!(path = %path.display(), "Database opened");
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> StoreResult<Self> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StoreError::Pool(format!("Failed to create in-memory database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Pool(format!("Failed to create connection: {e}")))?;

        migrations::run_migrations(&conn).await?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    /// Get the connection.
    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Convert `Option<&str>` to libsql Value.
fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

/// Convert `Option<i64>` to libsql Value.
fn opt_int(v: Option<i64>) -> libsql::Value {
    match v {
        Some(v) => libsql::Value::Integer(v),
        None => libsql::Value::Null,
    }
}

/// Todo rows carry the joined category and its live count.
///
/// Column order: 0:id, 1:name, 2:is_complete, 3:category_id,
/// 4:category name, 5:category description, 6:category todo count.
const TODO_SELECT: &str = "SELECT t.id, t.name, t.is_complete, t.category_id, \
     c.name, c.description, \
     (SELECT COUNT(*) FROM todos t2 WHERE t2.category_id = c.id) \
     FROM todos t LEFT JOIN categories c ON c.id = t.category_id";

/// Column order: 0:id, 1:name, 2:description, 3:todo count.
const CATEGORY_SELECT: &str = "SELECT c.id, c.name, c.description, \
     (SELECT COUNT(*) FROM todos t WHERE t.category_id = c.id) \
     FROM categories c";

/// Map a libsql Row (shaped by `TODO_SELECT`) to a TodoWithCategory.
fn row_to_todo(row: &libsql::Row) -> Result<TodoWithCategory, libsql::Error> {
    let id: i64 = row.get(0)?;
    let name: Option<String> = row.get(1).ok();
    let is_complete: i64 = row.get(2)?;
    let category_id: Option<i64> = row.get(3).ok();

    let category = match category_id {
        Some(cid) => {
            let cat_name: String = row.get(4)?;
            let description: Option<String> = row.get(5).ok();
            let todo_count: i64 = row.get(6)?;
            Some(CategoryWithCount {
                category: Category {
                    id: cid,
                    name: cat_name,
                    description,
                },
                todo_count,
            })
        }
        None => None,
    };

    Ok(TodoWithCategory {
        todo: Todo {
            id,
            name,
            is_complete: is_complete != 0,
            category_id,
        },
        category,
    })
}

/// Map a libsql Row (shaped by `CATEGORY_SELECT`) to a CategoryWithCount.
fn row_to_category(row: &libsql::Row) -> Result<CategoryWithCount, libsql::Error> {
    Ok(CategoryWithCount {
        category: Category {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2).ok(),
        },
        todo_count: row.get(3)?,
    })
}

/// Check that a category id resolves. Runs on whatever connection (or open
/// transaction) the caller is inside.
async fn category_exists(conn: &Connection, id: i64) -> StoreResult<bool> {
    let mut rows = conn
        .query("SELECT COUNT(*) FROM categories WHERE id = ?1", params![id])
        .await
        .map_err(|e| StoreError::Query(format!("category_exists: {e}")))?;

    match rows.next().await {
        Ok(Some(row)) => {
            let count: i64 = row.get(0).unwrap_or(0);
            Ok(count > 0)
        }
        _ => Ok(false),
    }
}

/// Fetch a single todo with its category resolved.
async fn fetch_todo(conn: &Connection, id: i64) -> StoreResult<Option<TodoWithCategory>> {
    let mut rows = conn
        .query(&format!("{TODO_SELECT} WHERE t.id = ?1"), params![id])
        .await
        .map_err(|e| StoreError::Query(format!("fetch_todo: {e}")))?;

    match rows.next().await {
        Ok(Some(row)) => {
            let todo = row_to_todo(&row)
                .map_err(|e| StoreError::Query(format!("fetch_todo row parse: {e}")))?;
            Ok(Some(todo))
        }
        Ok(None) => Ok(None),
        Err(e) => Err(StoreError::Query(format!("fetch_todo: {e}"))),
    }
}

/// Fetch a single category with its member count.
async fn fetch_category(conn: &Connection, id: i64) -> StoreResult<Option<CategoryWithCount>> {
    let mut rows = conn
        .query(&format!("{CATEGORY_SELECT} WHERE c.id = ?1"), params![id])
        .await
        .map_err(|e| StoreError::Query(format!("fetch_category: {e}")))?;

    match rows.next().await {
        Ok(Some(row)) => {
            let category = row_to_category(&row)
                .map_err(|e| StoreError::Query(format!("fetch_category row parse: {e}")))?;
            Ok(Some(category))
        }
        Ok(None) => Ok(None),
        Err(e) => Err(StoreError::Query(format!("fetch_category: {e}"))),
    }
}

// ── Transactional steps ─────────────────────────────────────────────
//
// Each runs inside a caller-owned transaction, so the referential check and
// the write land atomically. The caller commits on Ok and rolls back on Err,
// which is what keeps a failed operation free of partial writes.

async fn insert_todo(
    conn: &Connection,
    name: Option<&str>,
    is_complete: bool,
    category_id: Option<i64>,
) -> StoreResult<TodoWithCategory> {
    if let Some(cid) = category_id {
        if !category_exists(conn, cid).await? {
            return Err(StoreError::CategoryNotFound { id: cid });
        }
    }

    conn.execute(
        "INSERT INTO todos (name, is_complete, category_id) VALUES (?1, ?2, ?3)",
        params![opt_text(name), is_complete as i64, opt_int(category_id)],
    )
    .await
    .map_err(|e| StoreError::Query(format!("insert_todo: {e}")))?;

    let id = conn.last_insert_rowid();
    fetch_todo(conn, id)
        .await?
        .ok_or(StoreError::NotFound { entity: "todo", id })
}

async fn replace_todo(
    conn: &Connection,
    id: i64,
    name: Option<&str>,
    is_complete: bool,
    category_id: Option<i64>,
) -> StoreResult<TodoWithCategory> {
    if let Some(cid) = category_id {
        if !category_exists(conn, cid).await? {
            return Err(StoreError::CategoryNotFound { id: cid });
        }
    }

    let affected = conn
        .execute(
            "UPDATE todos SET name = ?1, is_complete = ?2, category_id = ?3 WHERE id = ?4",
            params![opt_text(name), is_complete as i64, opt_int(category_id), id],
        )
        .await
        .map_err(|e| StoreError::Query(format!("replace_todo: {e}")))?;

    if affected == 0 {
        return Err(StoreError::NotFound { entity: "todo", id });
    }

    fetch_todo(conn, id)
        .await?
        .ok_or(StoreError::NotFound { entity: "todo", id })
}

async fn insert_category(
    conn: &Connection,
    name: &str,
    description: Option<&str>,
) -> StoreResult<CategoryWithCount> {
    conn.execute(
        "INSERT INTO categories (name, description) VALUES (?1, ?2)",
        params![name, opt_text(description)],
    )
    .await
    .map_err(|e| StoreError::Query(format!("insert_category: {e}")))?;

    let id = conn.last_insert_rowid();
    fetch_category(conn, id).await?.ok_or(StoreError::NotFound {
        entity: "category",
        id,
    })
}

/// Detach every member todo, then delete the category. Returns how many
/// todos were detached.
async fn detach_and_delete_category(conn: &Connection, id: i64) -> StoreResult<usize> {
    let detached = conn
        .execute(
            "UPDATE todos SET category_id = NULL WHERE category_id = ?1",
            params![id],
        )
        .await
        .map_err(|e| StoreError::Query(format!("delete_category detach: {e}")))?;

    let deleted = conn
        .execute("DELETE FROM categories WHERE id = ?1", params![id])
        .await
        .map_err(|e| StoreError::Query(format!("delete_category: {e}")))?;

    if deleted == 0 {
        return Err(StoreError::NotFound {
            entity: "category",
            id,
        });
    }

    Ok(detached as usize)
}

// ── Trait implementation ────────────────────────────────────────────

impl LibSqlBackend {
    /// Open a transaction, tagging failures with the operation name.
    async fn begin(&self, op: &str) -> StoreResult<libsql::Transaction> {
        self.conn()
            .transaction()
            .await
            .map_err(|e| StoreError::Query(format!("{op} begin: {e}")))
    }
}

/// Commit on Ok; roll back on Err so nothing of a failed operation stays
/// visible on the shared connection.
async fn finish_tx<T>(
    tx: libsql::Transaction,
    op: &str,
    result: StoreResult<T>,
) -> StoreResult<T> {
    match result {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(|e| StoreError::Query(format!("{op} commit: {e}")))?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rb) = tx.rollback().await {
                tracing::warn!("{op} rollback failed: {rb}");
            }
            Err(e)
        }
    }
}

#[async_trait]
impl Store for LibSqlBackend {
    // ── Todos ───────────────────────────────────────────────────────

    async fn create_todo(
        &self,
        name: Option<&str>,
        is_complete: bool,
        category_id: Option<i64>,
    ) -> StoreResult<TodoWithCategory> {
        let tx = self.begin("create_todo").await?;
        let result = insert_todo(&tx, name, is_complete, category_id).await;
        let created = finish_tx(tx, "create_todo", result).await?;

        debug!(todo_id = created.todo.id, "Todo created");
        Ok(created)
    }

    async fn get_todo(&self, id: i64) -> StoreResult<Option<TodoWithCategory>> {
        fetch_todo(self.conn(), id).await
    }

    async fn list_todos(&self, filter: TodoFilter) -> StoreResult<Vec<TodoWithCategory>> {
        let conn = self.conn();
        let result = match (filter.only_complete, filter.category_id) {
            (false, None) => conn.query(&format!("{TODO_SELECT} ORDER BY t.id"), ()).await,
            (true, None) => {
                conn.query(
                    &format!("{TODO_SELECT} WHERE t.is_complete = 1 ORDER BY t.id"),
                    (),
                )
                .await
            }
            (false, Some(cid)) => {
                conn.query(
                    &format!("{TODO_SELECT} WHERE t.category_id = ?1 ORDER BY t.id"),
                    params![cid],
                )
                .await
            }
            (true, Some(cid)) => {
                conn.query(
                    &format!(
                        "{TODO_SELECT} WHERE t.is_complete = 1 AND t.category_id = ?1 ORDER BY t.id"
                    ),
                    params![cid],
                )
                .await
            }
        };
        let mut rows = result.map_err(|e| StoreError::Query(format!("list_todos: {e}")))?;

        let mut todos = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_todo(&row) {
                Ok(todo) => todos.push(todo),
                Err(e) => {
                    tracing::warn!("Skipping todo row: {e}");
                }
            }
        }
        Ok(todos)
    }

    async fn update_todo(
        &self,
        id: i64,
        name: Option<&str>,
        is_complete: bool,
        category_id: Option<i64>,
    ) -> StoreResult<TodoWithCategory> {
        let tx = self.begin("update_todo").await?;
        let result = replace_todo(&tx, id, name, is_complete, category_id).await;
        let updated = finish_tx(tx, "update_todo", result).await?;

        debug!(todo_id = id, "Todo updated");
        Ok(updated)
    }

    async fn delete_todo(&self, id: i64) -> StoreResult<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM todos WHERE id = ?1", params![id])
            .await
            .map_err(|e| StoreError::Query(format!("delete_todo: {e}")))?;

        if affected > 0 {
            debug!(todo_id = id, "Todo deleted");
        }
        Ok(affected > 0)
    }

    // ── Categories ──────────────────────────────────────────────────

    async fn create_category(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> StoreResult<CategoryWithCount> {
        let tx = self.begin("create_category").await?;
        let result = insert_category(&tx, name, description).await;
        let created = finish_tx(tx, "create_category", result).await?;

        debug!(category_id = created.category.id, "Category created");
        Ok(created)
    }

    async fn get_category(&self, id: i64) -> StoreResult<Option<CategoryWithCount>> {
        fetch_category(self.conn(), id).await
    }

    async fn list_categories(&self) -> StoreResult<Vec<CategoryWithCount>> {
        let conn = self.conn();
        let mut rows = conn
            .query(&format!("{CATEGORY_SELECT} ORDER BY c.id"), ())
            .await
            .map_err(|e| StoreError::Query(format!("list_categories: {e}")))?;

        let mut categories = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_category(&row) {
                Ok(category) => categories.push(category),
                Err(e) => {
                    tracing::warn!("Skipping category row: {e}");
                }
            }
        }
        Ok(categories)
    }

    async fn update_category(
        &self,
        id: i64,
        name: &str,
        description: Option<&str>,
    ) -> StoreResult<CategoryWithCount> {
        let conn = self.conn();
        let affected = conn
            .execute(
                "UPDATE categories SET name = ?1, description = ?2 WHERE id = ?3",
                params![name, opt_text(description), id],
            )
            .await
            .map_err(|e| StoreError::Query(format!("update_category: {e}")))?;

        if affected == 0 {
            return Err(StoreError::NotFound {
                entity: "category",
                id,
            });
        }

        let updated = fetch_category(conn, id).await?.ok_or(StoreError::NotFound {
            entity: "category",
            id,
        })?;

        debug!(category_id = id, "Category updated");
        Ok(updated)
    }

    async fn delete_category(&self, id: i64) -> StoreResult<usize> {
        let tx = self.begin("delete_category").await?;
        let result = detach_and_delete_category(&tx, id).await;
        let detached = finish_tx(tx, "delete_category", result).await?;

        debug!(category_id = id, detached, "Category deleted");
        Ok(detached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> LibSqlBackend {
        LibSqlBackend::new_memory().await.unwrap()
    }

    #[tokio::test]
    async fn create_and_get_todo_roundtrip() {
        let store = memory_store().await;

        let created = store.create_todo(Some("walk dog"), false, None).await.unwrap();
        assert_eq!(created.todo.name.as_deref(), Some("walk dog"));
        assert!(!created.todo.is_complete);
        assert_eq!(created.todo.category_id, None);
        assert!(created.category.is_none());

        let fetched = store.get_todo(created.todo.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn create_todo_without_name() {
        let store = memory_store().await;
        let created = store.create_todo(None, true, None).await.unwrap();
        assert_eq!(created.todo.name, None);
        assert!(created.todo.is_complete);
    }

    #[tokio::test]
    async fn create_todo_with_dangling_category_writes_nothing() {
        let store = memory_store().await;

        let err = store.create_todo(Some("x"), false, Some(999)).await.unwrap_err();
        assert!(matches!(err, StoreError::CategoryNotFound { id: 999 }));

        let todos = store.list_todos(TodoFilter::default()).await.unwrap();
        assert!(todos.is_empty());
    }

    #[tokio::test]
    async fn create_todo_resolves_category_with_count() {
        let store = memory_store().await;
        let cat = store.create_category("Work", None).await.unwrap();

        let created = store
            .create_todo(Some("report"), false, Some(cat.category.id))
            .await
            .unwrap();

        let resolved = created.category.unwrap();
        assert_eq!(resolved.category.name, "Work");
        assert_eq!(resolved.todo_count, 1);

        // Second member bumps the count seen on a fresh read.
        store
            .create_todo(Some("slides"), false, Some(cat.category.id))
            .await
            .unwrap();
        let fetched = store.get_todo(created.todo.id).await.unwrap().unwrap();
        assert_eq!(fetched.category.unwrap().todo_count, 2);
    }

    #[tokio::test]
    async fn get_missing_todo_is_none() {
        let store = memory_store().await;
        assert!(store.get_todo(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_todos_only_complete_subset_in_insertion_order() {
        let store = memory_store().await;
        store.create_todo(Some("a"), true, None).await.unwrap();
        store.create_todo(Some("b"), false, None).await.unwrap();
        store.create_todo(Some("c"), true, None).await.unwrap();

        let complete = store.list_todos(TodoFilter::complete()).await.unwrap();
        let names: Vec<_> = complete
            .iter()
            .map(|t| t.todo.name.as_deref().unwrap())
            .collect();
        assert_eq!(names, ["a", "c"]);
        assert!(complete.iter().all(|t| t.todo.is_complete));
    }

    #[tokio::test]
    async fn list_todos_by_category() {
        let store = memory_store().await;
        let work = store.create_category("Work", None).await.unwrap();
        let home = store.create_category("Home", None).await.unwrap();

        store
            .create_todo(Some("report"), false, Some(work.category.id))
            .await
            .unwrap();
        store
            .create_todo(Some("dishes"), false, Some(home.category.id))
            .await
            .unwrap();
        store.create_todo(Some("loose"), false, None).await.unwrap();

        let in_work = store
            .list_todos(TodoFilter::in_category(work.category.id))
            .await
            .unwrap();
        assert_eq!(in_work.len(), 1);
        assert_eq!(in_work[0].todo.name.as_deref(), Some("report"));
    }

    #[tokio::test]
    async fn update_todo_replaces_every_field() {
        let store = memory_store().await;
        let cat = store.create_category("Work", None).await.unwrap();
        let created = store.create_todo(Some("draft"), false, None).await.unwrap();

        let updated = store
            .update_todo(created.todo.id, Some("final"), true, Some(cat.category.id))
            .await
            .unwrap();
        assert_eq!(updated.todo.name.as_deref(), Some("final"));
        assert!(updated.todo.is_complete);
        assert_eq!(updated.todo.category_id, Some(cat.category.id));

        // Full-replace semantics: updating with None clears the field.
        let cleared = store
            .update_todo(created.todo.id, None, true, None)
            .await
            .unwrap();
        assert_eq!(cleared.todo.name, None);
        assert_eq!(cleared.todo.category_id, None);
    }

    #[tokio::test]
    async fn update_missing_todo_is_not_found() {
        let store = memory_store().await;
        let err = store.update_todo(42, Some("x"), false, None).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "todo", id: 42 }));
    }

    #[tokio::test]
    async fn update_todo_with_dangling_category_leaves_row_untouched() {
        let store = memory_store().await;
        let created = store.create_todo(Some("keep"), false, None).await.unwrap();

        let err = store
            .update_todo(created.todo.id, Some("clobbered"), true, Some(7))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::CategoryNotFound { id: 7 }));

        let fetched = store.get_todo(created.todo.id).await.unwrap().unwrap();
        assert_eq!(fetched.todo.name.as_deref(), Some("keep"));
        assert!(!fetched.todo.is_complete);
    }

    #[tokio::test]
    async fn delete_todo_reports_existence() {
        let store = memory_store().await;
        let created = store.create_todo(Some("gone"), false, None).await.unwrap();

        assert!(store.delete_todo(created.todo.id).await.unwrap());
        assert!(store.get_todo(created.todo.id).await.unwrap().is_none());
        assert!(!store.delete_todo(created.todo.id).await.unwrap());
    }

    #[tokio::test]
    async fn category_crud_roundtrip() {
        let store = memory_store().await;

        let created = store
            .create_category("Errands", Some("out and about"))
            .await
            .unwrap();
        assert_eq!(created.category.name, "Errands");
        assert_eq!(created.category.description.as_deref(), Some("out and about"));
        assert_eq!(created.todo_count, 0);

        let fetched = store.get_category(created.category.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);

        let updated = store
            .update_category(created.category.id, "Chores", None)
            .await
            .unwrap();
        assert_eq!(updated.category.name, "Chores");
        assert_eq!(updated.category.description, None);

        let all = store.list_categories().await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn update_or_delete_missing_category_is_not_found() {
        let store = memory_store().await;

        let err = store.update_category(9, "x", None).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "category", id: 9 }));

        let err = store.delete_category(9).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "category", id: 9 }));
    }

    #[tokio::test]
    async fn delete_category_detaches_members_without_deleting_them() {
        let store = memory_store().await;
        let cat = store.create_category("Work", None).await.unwrap();
        let other = store.create_category("Home", None).await.unwrap();

        let a = store
            .create_todo(Some("a"), false, Some(cat.category.id))
            .await
            .unwrap();
        let b = store
            .create_todo(Some("b"), true, Some(cat.category.id))
            .await
            .unwrap();
        let c = store
            .create_todo(Some("c"), false, Some(other.category.id))
            .await
            .unwrap();

        let detached = store.delete_category(cat.category.id).await.unwrap();
        assert_eq!(detached, 2);

        // Members survive with a null category; unrelated todos untouched.
        for id in [a.todo.id, b.todo.id] {
            let todo = store.get_todo(id).await.unwrap().unwrap();
            assert_eq!(todo.todo.category_id, None);
            assert!(todo.category.is_none());
        }
        let untouched = store.get_todo(c.todo.id).await.unwrap().unwrap();
        assert_eq!(untouched.todo.category_id, Some(other.category.id));

        assert!(store.get_category(cat.category.id).await.unwrap().is_none());
        assert_eq!(store.list_todos(TodoFilter::default()).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn local_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("todos.db");

        let id = {
            let store = LibSqlBackend::new_local(&path).await.unwrap();
            let created = store.create_todo(Some("durable"), true, None).await.unwrap();
            created.todo.id
        };

        let store = LibSqlBackend::new_local(&path).await.unwrap();
        let fetched = store.get_todo(id).await.unwrap().unwrap();
        assert_eq!(fetched.todo.name.as_deref(), Some("durable"));
        assert!(fetched.todo.is_complete);
    }
}
