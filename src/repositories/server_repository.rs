use crate::models::{ConfigDocument, CreateServerRequest, Server, UpdateServerRequest};
use crate::repositories::error::RepositoryResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, SqlitePool};
use uuid::Uuid;

/// Storage for server descriptors and their embedded claim state.
///
/// Every mutating method is a single conditional statement. Methods returning
/// `bool` report whether a row matched the condition, so callers can tell a
/// no-op apart from a write without a prior read.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServerRepository: Send + Sync {
    async fn create(&self, request: CreateServerRequest) -> RepositoryResult<Server>;
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Server>>;
    async fn find_claimed(&self, id: &str, user_id: &str) -> RepositoryResult<Option<Server>>;
    async fn list_all(&self) -> RepositoryResult<Vec<Server>>;
    async fn list_active(&self) -> RepositoryResult<Vec<Server>>;
    async fn list_available(&self) -> RepositoryResult<Vec<Server>>;
    async fn list_by_user(&self, user_id: &str) -> RepositoryResult<Vec<Server>>;
    async fn list_connected(&self, user_id: &str) -> RepositoryResult<Vec<Server>>;
    async fn count(&self) -> RepositoryResult<i64>;

    /// Set the owner only if the server is active and still unowned.
    async fn claim(
        &self,
        id: &str,
        user_id: &str,
        user_config: Option<ConfigDocument>,
        now: DateTime<Utc>,
    ) -> RepositoryResult<bool>;
    async fn release(&self, id: &str, user_id: &str, now: DateTime<Utc>) -> RepositoryResult<bool>;
    /// Mark an owned, active server connected again. A supplied config
    /// replaces the stored one; `None` keeps it.
    async fn reconnect(
        &self,
        id: &str,
        user_id: &str,
        user_config: Option<ConfigDocument>,
        now: DateTime<Utc>,
    ) -> RepositoryResult<bool>;
    async fn update_user_config(
        &self,
        id: &str,
        user_id: &str,
        user_config: ConfigDocument,
        now: DateTime<Utc>,
    ) -> RepositoryResult<bool>;

    async fn update(&self, id: &str, request: UpdateServerRequest) -> RepositoryResult<bool>;
    async fn delete(&self, id: &str) -> RepositoryResult<bool>;
}

const SERVER_COLUMNS: &str = "id, name, server_type, description, base_config, is_active, \
     user_id, is_connected, user_config, created_at, connected_at, last_used";

#[derive(FromRow)]
struct ServerRow {
    id: String,
    name: String,
    server_type: String,
    description: Option<String>,
    base_config: Json<ConfigDocument>,
    is_active: bool,
    user_id: Option<String>,
    is_connected: bool,
    user_config: Option<Json<ConfigDocument>>,
    created_at: DateTime<Utc>,
    connected_at: Option<DateTime<Utc>>,
    last_used: Option<DateTime<Utc>>,
}

impl From<ServerRow> for Server {
    fn from(r: ServerRow) -> Self {
        Server {
            id: r.id,
            name: r.name,
            server_type: r.server_type,
            description: r.description,
            base_config: r.base_config.0,
            is_active: r.is_active,
            user_id: r.user_id,
            is_connected: r.is_connected,
            user_config: r.user_config.map(|c| c.0),
            created_at: r.created_at,
            connected_at: r.connected_at,
            last_used: r.last_used,
        }
    }
}

pub struct SqliteServerRepository {
    pool: SqlitePool,
}

impl SqliteServerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_many(&self, filter: &str, binds: &[&str]) -> RepositoryResult<Vec<Server>> {
        let sql = format!(
            "SELECT {} FROM servers {} ORDER BY created_at, id",
            SERVER_COLUMNS, filter
        );
        let mut query = sqlx::query_as::<_, ServerRow>(&sql);
        for value in binds {
            query = query.bind(*value);
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Server::from).collect())
    }
}

#[async_trait]
impl ServerRepository for SqliteServerRepository {
    async fn create(&self, request: CreateServerRequest) -> RepositoryResult<Server> {
        let server = Server {
            id: Uuid::new_v4().to_string(),
            name: request.name,
            server_type: request.server_type,
            description: request.description,
            base_config: request.base_config,
            is_active: true,
            user_id: None,
            is_connected: false,
            user_config: None,
            created_at: Utc::now(),
            connected_at: None,
            last_used: None,
        };

        sqlx::query(
            r#"
            INSERT INTO servers (id, name, server_type, description, base_config, is_active, is_connected, created_at)
            VALUES (?, ?, ?, ?, ?, 1, 0, ?)
            "#,
        )
        .bind(&server.id)
        .bind(&server.name)
        .bind(&server.server_type)
        .bind(&server.description)
        .bind(Json(&server.base_config))
        .bind(server.created_at)
        .execute(&self.pool)
        .await?;

        Ok(server)
    }

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Server>> {
        let sql = format!("SELECT {} FROM servers WHERE id = ?", SERVER_COLUMNS);
        let row = sqlx::query_as::<_, ServerRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Server::from))
    }

    async fn find_claimed(&self, id: &str, user_id: &str) -> RepositoryResult<Option<Server>> {
        let sql = format!(
            "SELECT {} FROM servers WHERE id = ? AND user_id = ?",
            SERVER_COLUMNS
        );
        let row = sqlx::query_as::<_, ServerRow>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Server::from))
    }

    async fn list_all(&self) -> RepositoryResult<Vec<Server>> {
        self.fetch_many("", &[]).await
    }

    async fn list_active(&self) -> RepositoryResult<Vec<Server>> {
        self.fetch_many("WHERE is_active = 1", &[]).await
    }

    async fn list_available(&self) -> RepositoryResult<Vec<Server>> {
        self.fetch_many("WHERE is_active = 1 AND user_id IS NULL", &[])
            .await
    }

    async fn list_by_user(&self, user_id: &str) -> RepositoryResult<Vec<Server>> {
        self.fetch_many("WHERE user_id = ?", &[user_id]).await
    }

    async fn list_connected(&self, user_id: &str) -> RepositoryResult<Vec<Server>> {
        self.fetch_many("WHERE user_id = ? AND is_connected = 1", &[user_id])
            .await
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM servers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn claim(
        &self,
        id: &str,
        user_id: &str,
        user_config: Option<ConfigDocument>,
        now: DateTime<Utc>,
    ) -> RepositoryResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE servers
            SET user_id = ?, is_connected = 1, user_config = ?, connected_at = ?, last_used = ?
            WHERE id = ? AND is_active = 1 AND user_id IS NULL
            "#,
        )
        .bind(user_id)
        .bind(user_config.map(Json))
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn release(&self, id: &str, user_id: &str, now: DateTime<Utc>) -> RepositoryResult<bool> {
        let result = sqlx::query(
            "UPDATE servers SET is_connected = 0, last_used = ? WHERE id = ? AND user_id = ?",
        )
        .bind(now)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn reconnect(
        &self,
        id: &str,
        user_id: &str,
        user_config: Option<ConfigDocument>,
        now: DateTime<Utc>,
    ) -> RepositoryResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE servers
            SET is_connected = 1,
                user_config = COALESCE(?, user_config),
                connected_at = ?,
                last_used = ?
            WHERE id = ? AND user_id = ? AND is_active = 1
            "#,
        )
        .bind(user_config.map(Json))
        .bind(now)
        .bind(now)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_user_config(
        &self,
        id: &str,
        user_id: &str,
        user_config: ConfigDocument,
        now: DateTime<Utc>,
    ) -> RepositoryResult<bool> {
        let result = sqlx::query(
            "UPDATE servers SET user_config = ?, last_used = ? WHERE id = ? AND user_id = ?",
        )
        .bind(Json(user_config))
        .bind(now)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update(&self, id: &str, request: UpdateServerRequest) -> RepositoryResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE servers
            SET name = COALESCE(?, name),
                server_type = COALESCE(?, server_type),
                description = COALESCE(?, description),
                base_config = COALESCE(?, base_config),
                is_active = COALESCE(?, is_active)
            WHERE id = ?
            "#,
        )
        .bind(request.name)
        .bind(request.server_type)
        .bind(request.description)
        .bind(request.base_config.map(Json))
        .bind(request.is_active)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &str) -> RepositoryResult<bool> {
        let result = sqlx::query("DELETE FROM servers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_pool, test_helpers};
    use serde_json::json;

    #[tokio::test]
    async fn claim_is_a_compare_and_set_on_the_owner() {
        let pool = create_test_pool().await;
        let repo = SqliteServerRepository::new(pool.clone());
        let server = test_helpers::create_test_server(&pool, "Git", "git")
            .await
            .unwrap();

        assert!(repo.claim(&server.id, "alice", None, Utc::now()).await.unwrap());
        assert!(!repo.claim(&server.id, "bob", None, Utc::now()).await.unwrap());

        let stored = repo.find_by_id(&server.id).await.unwrap().unwrap();
        assert_eq!(stored.user_id.as_deref(), Some("alice"));
        assert!(stored.is_connected);
        assert!(stored.connected_at.is_some());
        assert_eq!(stored.connected_at, stored.last_used);
    }

    #[tokio::test]
    async fn json_documents_survive_storage() {
        let pool = create_test_pool().await;
        let repo = SqliteServerRepository::new(pool.clone());
        let server = test_helpers::create_test_server(&pool, "Web", "websearch")
            .await
            .unwrap();

        let config = test_helpers::config_doc(json!({
            "api_key": "k",
            "limits": {"rpm": 60, "burst": [1, 2, 3]},
            "enabled": true,
            "note": null
        }));
        repo.claim(&server.id, "alice", Some(config.clone()), Utc::now())
            .await
            .unwrap();

        let stored = repo.find_claimed(&server.id, "alice").await.unwrap().unwrap();
        assert_eq!(stored.user_config, Some(config));
        assert_eq!(stored.base_config, server.base_config);
    }

    #[tokio::test]
    async fn reconnect_without_config_keeps_stored_config() {
        let pool = create_test_pool().await;
        let repo = SqliteServerRepository::new(pool.clone());
        let server = test_helpers::create_test_server(&pool, "Git", "git")
            .await
            .unwrap();
        let config = test_helpers::config_doc(json!({"branch": "main"}));

        repo.claim(&server.id, "alice", Some(config.clone()), Utc::now())
            .await
            .unwrap();
        repo.release(&server.id, "alice", Utc::now()).await.unwrap();
        assert!(repo
            .reconnect(&server.id, "alice", None, Utc::now())
            .await
            .unwrap());

        let stored = repo.find_by_id(&server.id).await.unwrap().unwrap();
        assert!(stored.is_connected);
        assert_eq!(stored.user_config, Some(config));
    }

    #[tokio::test]
    async fn listings_follow_creation_order() {
        let pool = create_test_pool().await;
        let repo = SqliteServerRepository::new(pool.clone());
        let first = test_helpers::create_test_server(&pool, "First", "a")
            .await
            .unwrap();
        let second = test_helpers::create_test_server(&pool, "Second", "b")
            .await
            .unwrap();

        let ids: Vec<String> = repo
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id]);
        assert_eq!(repo.count().await.unwrap(), 2);
    }
}
