use thiserror::Error;

use crate::repositories::StoreError;

/// Outcome taxonomy of the authentication services.
///
/// The HTTP layer collapses the credential and token kinds into generic
/// messages; the distinct variants exist for logging and tests.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unknown user `{0}`")]
    InvalidUser(String),
    #[error("wrong password for user `{0}`")]
    InvalidPassword(String),
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("user `{0}` already exists")]
    UserExists(String),
    #[error("session token not found")]
    TokenNotFound,
    #[error("session token expired")]
    TokenExpired,
    #[error("session token revoked")]
    TokenRevoked,
    #[error("session token identifier collision")]
    TokenCollision,
    #[error("missing capability {0}")]
    MissingCapability(String),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl AuthError {
    pub fn is_invalid_credentials(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidUser(_) | AuthError::InvalidPassword(_) | AuthError::InvalidCredentials
        )
    }

    pub fn is_token_rejection(&self) -> bool {
        matches!(
            self,
            AuthError::TokenNotFound | AuthError::TokenExpired | AuthError::TokenRevoked
        )
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError::Storage(StoreError::Backend(err))
    }
}
