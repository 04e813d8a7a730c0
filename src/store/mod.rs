//! Persistence layer — libSQL-backed storage for todos and categories.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{CategoryWithCount, Store, TodoFilter, TodoWithCategory};
