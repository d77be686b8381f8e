//! Token store: the only component that writes session token records.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::AuthError;
use crate::models::session_token::SessionToken;
use crate::repositories::{StoreError, TokenRepository};
use crate::types::{TokenId, UserId};

#[derive(Clone)]
pub struct TokenStore {
    tokens: Arc<dyn TokenRepository>,
}

impl TokenStore {
    pub fn new(tokens: Arc<dyn TokenRepository>) -> Self {
        Self { tokens }
    }

    pub async fn issue(&self, user_id: UserId) -> Result<SessionToken, AuthError> {
        self.issue_at(user_id, Utc::now()).await
    }

    /// Creates a fresh token for `user_id`. An identifier that is already
    /// taken is never overwritten.
    pub async fn issue_at(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<SessionToken, AuthError> {
        let token = SessionToken::new(user_id, now);
        match self.tokens.insert_token(&token).await {
            Ok(()) => Ok(token),
            Err(StoreError::Conflict) => {
                tracing::error!(%user_id, "session token identifier collision");
                Err(AuthError::TokenCollision)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Raw record, whatever its validity.
    pub async fn lookup(&self, id: &TokenId) -> Result<Option<SessionToken>, AuthError> {
        Ok(self.tokens.find_token_by_id(id).await?)
    }

    pub async fn touch(&self, id: &TokenId, now: DateTime<Utc>) -> Result<(), AuthError> {
        if self.tokens.touch_token(id, now).await? {
            Ok(())
        } else {
            Err(AuthError::TokenNotFound)
        }
    }

    /// Marks the token revoked. Revoking twice keeps the first stamp.
    pub async fn revoke(&self, id: &TokenId, now: DateTime<Utc>) -> Result<(), AuthError> {
        if self.tokens.revoke_token(id, now).await? {
            Ok(())
        } else {
            Err(AuthError::TokenNotFound)
        }
    }

    /// Deletes every record last seen before `cutoff`.
    pub async fn sweep(&self, cutoff: DateTime<Utc>) -> Result<u64, AuthError> {
        let purged = self.tokens.purge_tokens_before(cutoff).await?;
        tracing::info!(purged, %cutoff, "swept session tokens");
        Ok(purged)
    }
}
