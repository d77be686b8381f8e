//! Session tokens and the authenticated-session view handed to handlers.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::types::{TokenId, UserId};

/// Default sliding validity window: seven days since last activity.
pub const DEFAULT_TOKEN_TIMEOUT_HOURS: u64 = 7 * 24;

#[derive(Debug, Clone, PartialEq)]
/// Database representation of an issued session token.
///
/// Records are soft-revoked and kept for auditing; only the cleanup job ever
/// deletes them.
pub struct SessionToken {
    pub id: TokenId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    /// Last authenticated activity, or the revocation time once revoked.
    pub last_seen_at: DateTime<Utc>,
    pub revoked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Active,
    Expired,
    Revoked,
}

impl SessionToken {
    pub fn new(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: TokenId::generate(),
            user_id,
            created_at: now,
            last_seen_at: now,
            revoked: false,
        }
    }

    /// Applies the sliding-expiry policy at `now`.
    pub fn status(&self, now: DateTime<Utc>, timeout: Duration) -> TokenStatus {
        if self.revoked {
            TokenStatus::Revoked
        } else if now - self.last_seen_at >= timeout {
            TokenStatus::Expired
        } else {
            TokenStatus::Active
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// A resolved, currently valid session. Inserted into the request by the
/// authorization middleware.
pub struct ActiveSession {
    pub token: TokenId,
    pub user_id: UserId,
    pub username: String,
    pub capabilities: Vec<String>,
    /// `last_seen_at` as it was before this request renewed the session.
    pub previously_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl ActiveSession {
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Body of `GET /api/ping`.
pub struct PingResult {
    #[serde(rename = "logged-in")]
    pub logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(rename = "previously-seen", skip_serializing_if = "Option::is_none")]
    pub previously_seen: Option<DateTime<Utc>>,
}

impl PingResult {
    pub fn anonymous() -> Self {
        Self {
            logged_in: false,
            username: None,
            previously_seen: None,
        }
    }
}

impl From<ActiveSession> for PingResult {
    fn from(session: ActiveSession) -> Self {
        Self {
            logged_in: true,
            username: Some(session.username),
            previously_seen: Some(session.previously_seen),
        }
    }
}
