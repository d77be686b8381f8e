//! User persistence: the repository trait and its PostgreSQL implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::StoreError;
use crate::models::user::StoredUser;
use crate::types::UserId;

/// Repository trait for user accounts.
///
/// This trait is designed to be mockable using mockall for testing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by their exact (case-sensitive) username.
    async fn find_user_by_name(&self, username: &str) -> Result<Option<StoredUser>, StoreError>;

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<StoredUser>, StoreError>;

    /// Persist a new user. Fails with [`StoreError::Conflict`] if the
    /// username is taken.
    async fn insert_user(&self, user: &StoredUser) -> Result<(), StoreError>;

    /// Returns `false` when no such user existed.
    async fn delete_user_by_name(&self, username: &str) -> Result<bool, StoreError>;

    /// All users, ordered by username.
    async fn list_users(&self) -> Result<Vec<StoredUser>, StoreError>;
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    capabilities: Vec<String>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for StoredUser {
    fn from(row: UserRow) -> Self {
        StoredUser {
            id: UserId::from_uuid(row.id),
            username: row.username,
            password_hash: row.password_hash,
            capabilities: row.capabilities,
            created_at: row.created_at,
        }
    }
}

const USER_COLUMNS: &str = "id, username, password_hash, capabilities, created_at";

#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_user_by_name(&self, username: &str) -> Result<Option<StoredUser>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(StoredUser::from))
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<StoredUser>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(StoredUser::from))
    }

    async fn insert_user(&self, user: &StoredUser) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (id, username, password_hash, capabilities, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::from(user.id))
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.capabilities)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_user_by_name(&self, username: &str) -> Result<bool, StoreError> {
        // session_tokens and timesheet_entries cascade
        let result = sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_users(&self) -> Result<Vec<StoredUser>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY username"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(StoredUser::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_user_repository_is_send_sync() {
        fn check_send_sync<T: Send + Sync>() {}
        check_send_sync::<MockUserRepository>();
    }
}
