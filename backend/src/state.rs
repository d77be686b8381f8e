use std::sync::Arc;

use crate::{
    config::Config,
    db::connection::{create_pool, run_migrations, DbPool},
    repositories::{
        MemoryTimesheetRepository, MemoryTokenRepository, MemoryUserRepository,
        PgTimesheetRepository, PgTokenRepository, PgUserRepository, TimesheetRepository,
        TokenRepository, UserRepository,
    },
    services::{CredentialStore, SessionAuthenticator, TokenStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub authenticator: Arc<SessionAuthenticator>,
    pub timesheets: Arc<dyn TimesheetRepository>,
}

impl AppState {
    pub fn from_repositories(
        config: Config,
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn TokenRepository>,
        timesheets: Arc<dyn TimesheetRepository>,
    ) -> Self {
        let authenticator = SessionAuthenticator::new(
            CredentialStore::new(users),
            TokenStore::new(tokens),
            config.token_timeout(),
        );
        Self {
            config,
            authenticator: Arc::new(authenticator),
            timesheets,
        }
    }

    pub fn postgres(pool: DbPool, config: Config) -> Self {
        Self::from_repositories(
            config,
            Arc::new(PgUserRepository::new(pool.clone())),
            Arc::new(PgTokenRepository::new(pool.clone())),
            Arc::new(PgTimesheetRepository::new(pool)),
        )
    }

    /// Volatile state; everything is lost on restart.
    pub fn in_memory(config: Config) -> Self {
        Self::from_repositories(
            config,
            Arc::new(MemoryUserRepository::new()),
            Arc::new(MemoryTokenRepository::new()),
            Arc::new(MemoryTimesheetRepository::new()),
        )
    }

    /// Opens the backend named by `DATABASE_URL` and applies migrations.
    pub async fn connect(config: Config) -> anyhow::Result<Self> {
        if config.uses_memory_store() {
            tracing::warn!("using the in-memory store; data will not survive a restart");
            return Ok(Self::in_memory(config));
        }
        let pool = create_pool(&config.database_url, config.database_max_connections).await?;
        run_migrations(&pool).await?;
        Ok(Self::postgres(pool, config))
    }
}
