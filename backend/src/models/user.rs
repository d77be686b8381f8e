//! Models that represent users, their capabilities and authentication payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::types::{TokenId, UserId};

/// Capability required to list your own timesheet entries.
pub const TIMES_READ: &str = "TIMES/READ";
/// Capability required to save or delete your own timesheet entries.
pub const TIMES_WRITE: &str = "TIMES/WRITE";
/// Capability required to manage user accounts.
pub const USERS_ADMIN: &str = "USERS/ADMIN";

pub const KNOWN_CAPABILITIES: [&str; 3] = [TIMES_READ, TIMES_WRITE, USERS_ADMIN];

/// First capability in `capabilities` that the gate never checks for.
pub fn find_unknown_capability(capabilities: &[String]) -> Option<&str> {
    capabilities
        .iter()
        .map(String::as_str)
        .find(|c| !KNOWN_CAPABILITIES.contains(c))
}

/// Capabilities granted to a freshly created user when none are specified.
pub fn default_capabilities() -> Vec<String> {
    vec![TIMES_READ.to_string(), TIMES_WRITE.to_string()]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A user account as seen by everything outside the credential store.
pub struct User {
    /// Unique identifier for the user.
    pub id: UserId,
    /// Immutable, case-sensitive username used for login.
    pub username: String,
    /// Flat capability strings (e.g. [`TIMES_READ`]).
    pub capabilities: Vec<String>,
    /// Creation timestamp for auditing.
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Persistence representation of a user, including the password hash.
///
/// Only repositories and the credential store handle this type.
pub struct StoredUser {
    pub id: UserId,
    pub username: String,
    /// Argon2 PHC string; salt and cost parameters are embedded.
    pub password_hash: String,
    pub capabilities: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl StoredUser {
    /// Drops the password hash.
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            username: self.username,
            capabilities: self.capabilities,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
/// Credentials submitted by a user attempting to authenticate.
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
/// Body returned after a successful login.
pub struct LoginResponse {
    pub success: bool,
    pub token: TokenId,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
/// Payload for creating a new user account.
pub struct CreateUser {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[validate(length(min = 8))]
    pub password: String,
    /// Defaults to [`default_capabilities`] when omitted.
    #[serde(default)]
    pub capabilities: Option<Vec<String>>,
}
