//! Session token persistence.
//!
//! Updates are field-targeted single statements rather than whole-record
//! writes, so concurrent touches can't lose each other's work and a touch can
//! never clear a revocation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::StoreError;
use crate::models::session_token::SessionToken;
use crate::types::{TokenId, UserId};

/// Repository trait for session tokens.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Persist a new token. An existing record with the same ID is never
    /// overwritten; that case fails with [`StoreError::Conflict`].
    async fn insert_token(&self, token: &SessionToken) -> Result<(), StoreError>;

    /// The stored record, whatever its validity.
    async fn find_token_by_id(&self, id: &TokenId) -> Result<Option<SessionToken>, StoreError>;

    /// Moves `last_seen_at` forward to `now` (never backwards, and not at all
    /// once revoked). Returns `false` if the token is unknown.
    async fn touch_token(&self, id: &TokenId, now: DateTime<Utc>) -> Result<bool, StoreError>;

    /// Marks the token revoked, stamping `last_seen_at = now` the first time.
    /// Returns `false` if the token is unknown.
    async fn revoke_token(&self, id: &TokenId, now: DateTime<Utc>) -> Result<bool, StoreError>;

    /// Physically deletes every token last seen before `cutoff`.
    async fn purge_tokens_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;
}

#[derive(Debug, FromRow)]
struct TokenRow {
    id: String,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    last_seen_at: DateTime<Utc>,
    revoked: bool,
}

impl TryFrom<TokenRow> for SessionToken {
    type Error = StoreError;

    fn try_from(row: TokenRow) -> Result<Self, Self::Error> {
        let id = row
            .id
            .parse()
            .map_err(|_| anyhow::anyhow!("session_tokens contains a malformed id"))?;
        Ok(SessionToken {
            id,
            user_id: UserId::from_uuid(row.user_id),
            created_at: row.created_at,
            last_seen_at: row.last_seen_at,
            revoked: row.revoked,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PgTokenRepository {
    pool: PgPool,
}

impl PgTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for PgTokenRepository {
    async fn insert_token(&self, token: &SessionToken) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO session_tokens (id, user_id, created_at, last_seen_at, revoked) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(token.id.as_str())
        .bind(Uuid::from(token.user_id))
        .bind(token.created_at)
        .bind(token.last_seen_at)
        .bind(token.revoked)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_token_by_id(&self, id: &TokenId) -> Result<Option<SessionToken>, StoreError> {
        let row = sqlx::query_as::<_, TokenRow>(
            "SELECT id, user_id, created_at, last_seen_at, revoked \
             FROM session_tokens WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(SessionToken::try_from).transpose()
    }

    async fn touch_token(&self, id: &TokenId, now: DateTime<Utc>) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE session_tokens
            SET last_seen_at = CASE
                    WHEN revoked THEN last_seen_at
                    ELSE GREATEST(last_seen_at, $1)
                END
            WHERE id = $2
            "#,
        )
        .bind(now)
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn revoke_token(&self, id: &TokenId, now: DateTime<Utc>) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE session_tokens
            SET last_seen_at = CASE WHEN revoked THEN last_seen_at ELSE $1 END,
                revoked = TRUE
            WHERE id = $2
            "#,
        )
        .bind(now)
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn purge_tokens_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM session_tokens WHERE last_seen_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
