//! Typed ID wrappers for compile-time type safety.
//!
//! Entity IDs wrap UUIDs so a `UserId` can never be passed where a
//! `TimesheetEntryId` is expected. Session tokens are deliberately *not* UUIDs,
//! see [`TokenId`].

use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Macro to generate typed ID wrappers with common trait implementations.
macro_rules! typed_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random ID.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an ID from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_str(&self.0.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Uuid::parse_str(&s)
                    .map(Self)
                    .map_err(serde::de::Error::custom)
            }
        }
    };
}

typed_id!(UserId, "Unique identifier for a user.");
typed_id!(TimesheetEntryId, "Unique identifier for a timesheet entry.");

/// Number of random bytes backing a session token.
pub const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("not a session token identifier")]
pub struct MalformedTokenId;

/// Opaque, unguessable identifier of a session token.
///
/// Generated from [`TOKEN_BYTES`] bytes of the operating system's CSPRNG and
/// hex encoded, so the only valid textual form is a string of
/// `2 * TOKEN_BYTES` lowercase hex digits. Anything else fails to parse and is
/// treated by callers exactly like an unknown token.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TokenId(String);

impl TokenId {
    /// Draws a fresh identifier from the OS random number generator.
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TokenId {
    type Err = MalformedTokenId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let well_formed = s.len() == TOKEN_BYTES * 2
            && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if well_formed {
            Ok(Self(s.to_owned()))
        } else {
            Err(MalformedTokenId)
        }
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Tokens are bearer secrets; keep them out of debug logs.
impl fmt::Debug for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenId({}..)", &self.0[..8.min(self.0.len())])
    }
}

impl Serialize for TokenId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TokenId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_parse_back() {
        let token = TokenId::generate();
        assert_eq!(token.as_str().len(), TOKEN_BYTES * 2);
        let parsed: TokenId = token.as_str().parse().expect("well formed");
        assert_eq!(parsed, token);
    }

    #[test]
    fn generated_tokens_are_unique() {
        let a = TokenId::generate();
        let b = TokenId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_token_ids_are_rejected() {
        let candidates: Vec<String> = vec![
            String::new(),
            "not-a-token".into(),
            "ABCDEF".into(),
            "g".repeat(TOKEN_BYTES * 2),
            "A".repeat(TOKEN_BYTES * 2),
            "a".repeat(TOKEN_BYTES * 2 + 1),
            "550e8400-e29b-41d4-a716-446655440000".into(),
        ];
        for raw in candidates {
            assert_eq!(raw.parse::<TokenId>(), Err(MalformedTokenId), "{raw:?}");
        }
    }

    #[test]
    fn debug_output_hides_most_of_the_token() {
        let token = TokenId::generate();
        let debug = format!("{token:?}");
        assert!(!debug.contains(token.as_str()));
        assert!(debug.starts_with("TokenId("));
    }

    #[test]
    fn user_ids_roundtrip_through_strings() {
        let id = UserId::new();
        let parsed: UserId = id.to_string().parse().expect("uuid");
        assert_eq!(parsed, id);
        assert!("nope".parse::<UserId>().is_err());
    }
}
