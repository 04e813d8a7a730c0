//! Server configuration, built from environment variables.

/// Runtime configuration for the HTTP server and its database.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port the HTTP listener binds on.
    pub port: u16,
    /// Path of the local database file.
    pub db_path: String,
}

impl ServerConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let port: u16 = std::env::var("TODO_API_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let db_path = std::env::var("TODO_API_DB_PATH")
            .unwrap_or_else(|_| "./data/todo-api.db".to_string());

        Self { port, db_path }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            db_path: "./data/todo-api.db".to_string(),
        }
    }
}
