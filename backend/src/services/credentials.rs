//! Credential store: user records and password verification.

use std::sync::Arc;

use chrono::Utc;

use super::AuthError;
use crate::models::user::{StoredUser, User};
use crate::repositories::{StoreError, UserRepository};
use crate::types::UserId;
use crate::utils::password::{
    hash_password_blocking, verify_against_dummy_blocking, verify_password_blocking,
};

#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<dyn UserRepository>,
}

impl CredentialStore {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Checks `password` against the stored hash for `username`.
    ///
    /// Fails with [`AuthError::InvalidUser`] or [`AuthError::InvalidPassword`];
    /// callers facing the network must merge the two.
    pub async fn verify(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let Some(stored) = self.users.find_user_by_name(username).await? else {
            verify_against_dummy_blocking(password.to_owned()).await?;
            return Err(AuthError::InvalidUser(username.to_owned()));
        };

        let matches =
            verify_password_blocking(password.to_owned(), stored.password_hash.clone()).await?;
        if !matches {
            return Err(AuthError::InvalidPassword(username.to_owned()));
        }
        Ok(stored.into_user())
    }

    pub async fn create(
        &self,
        username: &str,
        password: &str,
        capabilities: Vec<String>,
    ) -> Result<User, AuthError> {
        if self.users.find_user_by_name(username).await?.is_some() {
            return Err(AuthError::UserExists(username.to_owned()));
        }

        let password_hash = hash_password_blocking(password.to_owned()).await?;
        let stored = StoredUser {
            id: UserId::new(),
            username: username.to_owned(),
            password_hash,
            capabilities,
            created_at: Utc::now(),
        };

        // The pre-check above races with concurrent creates; the unique
        // constraint decides.
        match self.users.insert_user(&stored).await {
            Ok(()) => {}
            Err(StoreError::Conflict) => return Err(AuthError::UserExists(username.to_owned())),
            Err(err) => return Err(err.into()),
        }

        tracing::info!(user_id = %stored.id, username, "user created");
        Ok(stored.into_user())
    }

    pub async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, AuthError> {
        Ok(self
            .users
            .find_user_by_id(user_id)
            .await?
            .map(StoredUser::into_user))
    }

    pub async fn list(&self) -> Result<Vec<User>, AuthError> {
        Ok(self
            .users
            .list_users()
            .await?
            .into_iter()
            .map(StoredUser::into_user)
            .collect())
    }

    /// Removes the user and, through the storage cascade, their tokens.
    pub async fn delete(&self, username: &str) -> Result<bool, AuthError> {
        let deleted = self.users.delete_user_by_name(username).await?;
        if deleted {
            tracing::info!(username, "user deleted");
        }
        Ok(deleted)
    }
}
