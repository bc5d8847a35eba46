pub mod test_helpers {
    use crate::models::{ConfigDocument, CreateServerRequest, Server};
    use crate::repositories::{ServerRepository, SqliteServerRepository};
    use crate::AppState;
    use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
    use tempfile::NamedTempFile;

    /// Create a new in-memory SQLite database for testing
    pub async fn create_test_db() -> Result<SqlitePool, sqlx::Error> {
        // A single connection keeps every query on the same in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(pool)
    }

    /// Create a temporary file-based SQLite database for testing
    /// Useful when a test needs several connections to see the same data
    pub async fn create_test_db_file() -> Result<(SqlitePool, NamedTempFile), sqlx::Error> {
        let temp_file = NamedTempFile::new().map_err(sqlx::Error::Io)?;
        let db_path = temp_file
            .path()
            .to_str()
            .ok_or_else(|| sqlx::Error::Configuration("Invalid database path".into()))?;
        let database_url = format!("sqlite://{}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(&database_url)
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok((pool, temp_file))
    }

    /// Build the application state over a test pool
    pub fn create_test_state(pool: SqlitePool, admin_token: Option<&str>) -> AppState {
        AppState::new(pool, admin_token.map(str::to_string))
    }

    /// Build a config document from a `serde_json::json!` object literal
    pub fn config_doc(value: serde_json::Value) -> ConfigDocument {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("expected a JSON object, got {}", other),
        }
    }

    /// Create a test server for testing
    pub async fn create_test_server(
        pool: &SqlitePool,
        name: &str,
        server_type: &str,
    ) -> Result<Server, sqlx::Error> {
        let repository = SqliteServerRepository::new(pool.clone());
        let request = CreateServerRequest {
            name: name.to_string(),
            server_type: server_type.to_string(),
            description: Some(format!("{} for tests", name)),
            base_config: config_doc(serde_json::json!({
                "transport": "stdio",
                "url": format!("mcp://{}", server_type),
            })),
        };

        repository.create(request).await.map_err(|e| match e {
            crate::repositories::RepositoryError::Database(e) => e,
            crate::repositories::RepositoryError::NotFound => sqlx::Error::RowNotFound,
        })
    }

    /// Flip the active flag directly in storage
    pub async fn set_server_active(
        pool: &SqlitePool,
        server_id: &str,
        is_active: bool,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE servers SET is_active = ? WHERE id = ?")
            .bind(is_active)
            .bind(server_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

// Re-export commonly used test functions at module level for convenience
// Note: This is test-only code. Panic on error is acceptable in tests.
#[cfg(test)]
pub async fn create_test_pool() -> sqlx::SqlitePool {
    match test_helpers::create_test_db().await {
        Ok(pool) => pool,
        Err(e) => panic!("Failed to create test pool: {}", e),
    }
}
