//! In-memory implementations of the repository traits.
//!
//! Used by the test suite and by `DATABASE_URL=memory` development servers.
//! Each repository has its own lock; token records additionally carry a
//! per-record mutex so updates to one session never wait on another.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use super::{StoreError, TimesheetRepository, TokenRepository, UserRepository};
use crate::models::{session_token::SessionToken, timesheet::TimesheetEntry, user::StoredUser};
use crate::types::{TimesheetEntryId, TokenId, UserId};

#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<UserId, StoredUser>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_user_by_name(&self, username: &str) -> Result<Option<StoredUser>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<StoredUser>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn insert_user(&self, user: &StoredUser) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let taken = users.contains_key(&user.id)
            || users.values().any(|u| u.username == user.username);
        if taken {
            return Err(StoreError::Conflict);
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete_user_by_name(&self, username: &str) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|_, u| u.username != username);
        Ok(users.len() != before)
    }

    async fn list_users(&self) -> Result<Vec<StoredUser>, StoreError> {
        let mut users: Vec<_> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }
}

type TokenRecord = Arc<Mutex<SessionToken>>;

#[derive(Debug, Default)]
pub struct MemoryTokenRepository {
    tokens: RwLock<HashMap<TokenId, TokenRecord>>,
}

impl MemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, revoked or not.
    #[cfg(test)]
    async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    async fn record(&self, id: &TokenId) -> Option<TokenRecord> {
        self.tokens.read().await.get(id).cloned()
    }
}

#[async_trait]
impl TokenRepository for MemoryTokenRepository {
    async fn insert_token(&self, token: &SessionToken) -> Result<(), StoreError> {
        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&token.id) {
            return Err(StoreError::Conflict);
        }
        tokens.insert(token.id.clone(), Arc::new(Mutex::new(token.clone())));
        Ok(())
    }

    async fn find_token_by_id(&self, id: &TokenId) -> Result<Option<SessionToken>, StoreError> {
        match self.record(id).await {
            Some(record) => Ok(Some(record.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn touch_token(&self, id: &TokenId, now: DateTime<Utc>) -> Result<bool, StoreError> {
        let Some(record) = self.record(id).await else {
            return Ok(false);
        };
        let mut token = record.lock().await;
        if !token.revoked && now > token.last_seen_at {
            token.last_seen_at = now;
        }
        Ok(true)
    }

    async fn revoke_token(&self, id: &TokenId, now: DateTime<Utc>) -> Result<bool, StoreError> {
        let Some(record) = self.record(id).await else {
            return Ok(false);
        };
        let mut token = record.lock().await;
        if !token.revoked {
            token.revoked = true;
            token.last_seen_at = now;
        }
        Ok(true)
    }

    async fn purge_tokens_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let snapshot: Vec<(TokenId, TokenRecord)> = self
            .tokens
            .read()
            .await
            .iter()
            .map(|(id, record)| (id.clone(), record.clone()))
            .collect();

        let mut stale = Vec::new();
        for (id, record) in snapshot {
            if record.lock().await.last_seen_at < cutoff {
                stale.push(id);
            }
        }

        let mut tokens = self.tokens.write().await;
        for id in &stale {
            tokens.remove(id);
        }
        Ok(stale.len() as u64)
    }
}

#[derive(Debug, Default)]
pub struct MemoryTimesheetRepository {
    entries: RwLock<HashMap<TimesheetEntryId, TimesheetEntry>>,
}

impl MemoryTimesheetRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TimesheetRepository for MemoryTimesheetRepository {
    async fn entries_for_user(
        &self,
        user_id: UserId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<TimesheetEntry>, StoreError> {
        let entries = self.entries.read().await;
        let mut found: Vec<_> = entries
            .values()
            .filter(|e| e.user_id == user_id)
            .filter(|e| from.map_or(true, |from| e.start >= from))
            .filter(|e| to.map_or(true, |to| e.start < to))
            .cloned()
            .collect();
        found.sort_by_key(|e| (e.start, *e.id.as_uuid()));
        Ok(found)
    }

    async fn save_entry(&self, entry: &TimesheetEntry) -> Result<bool, StoreError> {
        let mut entries = self.entries.write().await;
        if let Some(existing) = entries.get(&entry.id) {
            if existing.user_id != entry.user_id {
                return Ok(false);
            }
        }
        entries.insert(entry.id, entry.clone());
        Ok(true)
    }

    async fn delete_entry(
        &self,
        user_id: UserId,
        id: TimesheetEntryId,
    ) -> Result<bool, StoreError> {
        let mut entries = self.entries.write().await;
        match entries.get(&id) {
            Some(entry) if entry.user_id == user_id => {
                entries.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
