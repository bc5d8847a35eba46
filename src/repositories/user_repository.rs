use crate::models::user::User;
use crate::repositories::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert the user with default profile fields unless it already exists,
    /// then return the stored row.
    async fn ensure_user(&self, user_id: &str) -> RepositoryResult<User>;
    async fn find_by_id(&self, user_id: &str) -> RepositoryResult<Option<User>>;
    async fn update_profile(
        &self,
        user_id: &str,
        name: Option<String>,
        email: Option<String>,
    ) -> RepositoryResult<()>;
    async fn list_users(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> RepositoryResult<Vec<User>>;
}

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn ensure_user(&self, user_id: &str) -> RepositoryResult<User> {
        // ON CONFLICT keeps two first requests from the same user racing into
        // a constraint error.
        sqlx::query(
            r#"
            INSERT INTO users (user_id, name, email, created_at)
            VALUES (?, ?, '', ?)
            ON CONFLICT(user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.find_by_id(user_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn find_by_id(&self, user_id: &str) -> RepositoryResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT user_id, name, email, created_at FROM users WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_profile(
        &self,
        user_id: &str,
        name: Option<String>,
        email: Option<String>,
    ) -> RepositoryResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = COALESCE(?, name), email = COALESCE(?, email)
            WHERE user_id = ?
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn list_users(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> RepositoryResult<Vec<User>> {
        let limit = limit.unwrap_or(100);
        let offset = offset.unwrap_or(0);

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, name, email, created_at
            FROM users
            ORDER BY created_at, user_id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
