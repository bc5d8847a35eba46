use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use crate::config::AppConfig;

pub async fn create_pool(config: &AppConfig) -> Result<SqlitePool, sqlx::Error> {
    let database_url = &config.database_url;

    // Ensure the data directory exists
    let path = database_url
        .trim_start_matches("sqlite://")
        .split('?')
        .next()
        .unwrap_or_default();
    if let Some(parent) = std::path::Path::new(path).parent() {
        std::fs::create_dir_all(parent).ok();
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
