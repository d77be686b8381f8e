//! Session authenticator: login, logout and resolution of presented tokens.
//!
//! A token is `Active` from issue until it is revoked or has gone
//! `timeout` without activity; after that it is `Invalid` for good. Every
//! successful resolution renews the window.

use chrono::{DateTime, Duration, Utc};

use super::{AuthError, CredentialStore, TokenStore};
use crate::models::session_token::{ActiveSession, PingResult, SessionToken, TokenStatus};
use crate::types::TokenId;

#[derive(Clone)]
pub struct SessionAuthenticator {
    credentials: CredentialStore,
    tokens: TokenStore,
    timeout: Duration,
}

impl SessionAuthenticator {
    pub fn new(credentials: CredentialStore, tokens: TokenStore, timeout: Duration) -> Self {
        Self {
            credentials,
            tokens,
            timeout,
        }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Records last seen before the returned instant are expired or revoked
    /// and have been for at least `retention`. Clamps to the earliest
    /// representable instant, which sweeps nothing.
    pub fn sweep_cutoff(&self, now: DateTime<Utc>, retention: Duration) -> DateTime<Utc> {
        self.timeout
            .checked_add(&retention)
            .and_then(|age| now.checked_sub_signed(age))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Verifies the credentials and issues a new token.
    ///
    /// Unknown user and wrong password both come back as
    /// [`AuthError::InvalidCredentials`].
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionToken, AuthError> {
        let user = match self.credentials.verify(username, password).await {
            Ok(user) => user,
            Err(err) if err.is_invalid_credentials() => {
                tracing::warn!(username, reason = %err, "login rejected");
                return Err(AuthError::InvalidCredentials);
            }
            Err(err) => return Err(err),
        };

        let token = self.tokens.issue(user.id).await?;
        tracing::info!(user_id = %user.id, username, token = ?token.id, "login succeeded");
        Ok(token)
    }

    pub async fn logout(&self, raw_token: &str) -> Result<(), AuthError> {
        self.logout_at(raw_token, Utc::now()).await
    }

    /// Revokes the presented token. Tokens that are malformed, unknown or
    /// already revoked are accepted silently.
    pub async fn logout_at(&self, raw_token: &str, now: DateTime<Utc>) -> Result<(), AuthError> {
        let Ok(id) = raw_token.parse::<TokenId>() else {
            tracing::debug!("logout with malformed token");
            return Ok(());
        };
        match self.tokens.revoke(&id, now).await {
            Ok(()) => {
                tracing::info!(token = ?id, "logged out");
                Ok(())
            }
            Err(AuthError::TokenNotFound) => {
                tracing::debug!(token = ?id, "logout with unknown token");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    pub async fn resolve(&self, raw_token: &str) -> Result<Option<ActiveSession>, AuthError> {
        self.resolve_at(raw_token, Utc::now()).await
    }

    /// Resolves the presented token into an [`ActiveSession`], renewing it.
    ///
    /// `Ok(None)` covers every way a token can be unusable; `Err` is reserved
    /// for storage failures.
    pub async fn resolve_at(
        &self,
        raw_token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ActiveSession>, AuthError> {
        match self.try_resolve(raw_token, now).await {
            Ok(session) => Ok(Some(session)),
            Err(err) if err.is_token_rejection() => {
                tracing::debug!(reason = %err, "session not resolved");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn try_resolve(
        &self,
        raw_token: &str,
        now: DateTime<Utc>,
    ) -> Result<ActiveSession, AuthError> {
        let id: TokenId = raw_token.parse().map_err(|_| AuthError::TokenNotFound)?;
        let token = self
            .tokens
            .lookup(&id)
            .await?
            .ok_or(AuthError::TokenNotFound)?;

        match token.status(now, self.timeout) {
            TokenStatus::Active => {}
            TokenStatus::Expired => return Err(AuthError::TokenExpired),
            TokenStatus::Revoked => return Err(AuthError::TokenRevoked),
        }

        // Tokens of deleted users are removed by the storage cascade; a user
        // vanishing between the two reads is treated the same way.
        let user = self
            .credentials
            .find_by_id(token.user_id)
            .await?
            .ok_or(AuthError::TokenNotFound)?;

        self.tokens.touch(&id, now).await?;

        Ok(ActiveSession {
            token: id,
            user_id: user.id,
            username: user.username,
            capabilities: user.capabilities,
            previously_seen: token.last_seen_at,
            last_seen: now.max(token.last_seen_at),
        })
    }

    pub async fn ping(&self, raw_token: Option<&str>) -> Result<PingResult, AuthError> {
        self.ping_at(raw_token, Utc::now()).await
    }

    /// Liveness probe used by the frontend. Resolving renews the session.
    pub async fn ping_at(
        &self,
        raw_token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<PingResult, AuthError> {
        let Some(raw_token) = raw_token else {
            return Ok(PingResult::anonymous());
        };
        Ok(self
            .resolve_at(raw_token, now)
            .await?
            .map(PingResult::from)
            .unwrap_or_else(PingResult::anonymous))
    }
}
