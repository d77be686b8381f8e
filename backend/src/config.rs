use anyhow::anyhow;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::models::session_token::DEFAULT_TOKEN_TIMEOUT_HOURS;
use crate::utils::cookies::{CookieOptions, SameSite, DEFAULT_SESSION_COOKIE_NAME};

/// `DATABASE_URL` value selecting the in-memory backend.
pub const MEMORY_DATABASE_URL: &str = "memory";

const DEFAULT_TOKEN_RETENTION_DAYS: u64 = 30;

/// Where the gate looks for the session token. Exactly one carrier is active
/// per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialCarrier {
    Cookie,
    Bearer,
}

impl FromStr for CredentialCarrier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cookie" => Ok(CredentialCarrier::Cookie),
            "bearer" | "header" => Ok(CredentialCarrier::Bearer),
            other => Err(anyhow!("Invalid AUTH_CARRIER value: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_address: String,
    pub token_timeout_hours: u64,
    pub token_retention_days: u64,
    #[serde(skip, default = "default_token_timeout")]
    token_timeout: TimeDelta,
    #[serde(skip, default = "default_token_retention")]
    token_retention: TimeDelta,
    pub auth_carrier: CredentialCarrier,
    pub session_cookie_name: String,
    pub cookie_secure: bool,
    pub cookie_same_site: SameSite,
    pub login_redirect: String,
    pub cors_allow_origins: Vec<String>,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup; `load` feeds it
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow!("DATABASE_URL must be set (use `memory` for a scratch store)"))?;

        let database_max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        let bind_address = lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());

        let token_timeout_hours = match lookup("TOKEN_TIMEOUT_HOURS") {
            Some(raw) => raw
                .parse()
                .ok()
                .filter(|hours| *hours > 0)
                .ok_or_else(|| anyhow!("Invalid TOKEN_TIMEOUT_HOURS value: {}", raw))?,
            None => DEFAULT_TOKEN_TIMEOUT_HOURS,
        };

        let token_timeout = i64::try_from(token_timeout_hours)
            .ok()
            .and_then(TimeDelta::try_hours)
            .ok_or_else(|| anyhow!("TOKEN_TIMEOUT_HOURS out of range: {}", token_timeout_hours))?;

        let token_retention_days = match lookup("TOKEN_RETENTION_DAYS") {
            Some(raw) => raw
                .parse()
                .map_err(|_| anyhow!("Invalid TOKEN_RETENTION_DAYS value: {}", raw))?,
            None => DEFAULT_TOKEN_RETENTION_DAYS,
        };
        let token_retention = i64::try_from(token_retention_days)
            .ok()
            .and_then(TimeDelta::try_days)
            .ok_or_else(|| anyhow!("TOKEN_RETENTION_DAYS out of range: {}", token_retention_days))?;

        let auth_carrier = match lookup("AUTH_CARRIER") {
            Some(raw) => raw.parse()?,
            None => CredentialCarrier::Cookie,
        };

        let session_cookie_name = lookup("SESSION_COOKIE_NAME")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION_COOKIE_NAME.to_string());

        let cookie_secure = lookup("COOKIE_SECURE")
            .map(|v| parse_bool(&v))
            .unwrap_or(false);

        let cookie_same_site = match lookup("COOKIE_SAME_SITE") {
            Some(raw) => raw
                .parse()
                .map_err(|_| anyhow!("Invalid COOKIE_SAME_SITE value: {}", raw))?,
            None => SameSite::Lax,
        };
        if cookie_same_site == SameSite::None && !cookie_secure {
            return Err(anyhow!("COOKIE_SAME_SITE=None requires COOKIE_SECURE=true"));
        }

        let login_redirect = lookup("LOGIN_REDIRECT").unwrap_or_else(|| "/forbidden".to_string());

        let cors_allow_origins = lookup("CORS_ALLOW_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Config {
            database_url,
            database_max_connections,
            bind_address,
            token_timeout_hours,
            token_retention_days,
            token_timeout,
            token_retention,
            auth_carrier,
            session_cookie_name,
            cookie_secure,
            cookie_same_site,
            login_redirect,
            cors_allow_origins,
        })
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_DATABASE_URL
    }

    pub fn token_timeout(&self) -> TimeDelta {
        self.token_timeout
    }

    pub fn token_retention(&self) -> TimeDelta {
        self.token_retention
    }

    pub fn cookie_options(&self) -> CookieOptions {
        CookieOptions {
            secure: self.cookie_secure,
            same_site: self.cookie_same_site,
        }
    }
}

fn default_token_timeout() -> TimeDelta {
    TimeDelta::hours(DEFAULT_TOKEN_TIMEOUT_HOURS as i64)
}

fn default_token_retention() -> TimeDelta {
    TimeDelta::days(DEFAULT_TOKEN_RETENTION_DAYS as i64)
}

fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
