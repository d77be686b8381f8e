use std::sync::Arc;

use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use website_backend::{
    config::Config,
    db::connection::create_pool,
    repositories::{PgTokenRepository, PgUserRepository},
    services::{CredentialStore, SessionAuthenticator, TokenStore},
};

/// Deletes session tokens that have been unusable for longer than
/// `TOKEN_RETENTION_DAYS`.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "website_backend=info,token_cleanup=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    if config.uses_memory_store() {
        anyhow::bail!("token_cleanup needs a PostgreSQL DATABASE_URL");
    }
    let pool = create_pool(&config.database_url, 1).await?;
    let authenticator = SessionAuthenticator::new(
        CredentialStore::new(Arc::new(PgUserRepository::new(pool.clone()))),
        TokenStore::new(Arc::new(PgTokenRepository::new(pool.clone()))),
        config.token_timeout(),
    );

    // Past the cutoff a record is expired (or was revoked) for at least the
    // retention period.
    let cutoff = authenticator.sweep_cutoff(Utc::now(), config.token_retention());
    let purged = authenticator.tokens().sweep(cutoff).await?;
    if purged > 0 {
        sqlx::query("VACUUM (ANALYZE) session_tokens")
            .execute(&pool)
            .await?;
    }
    tracing::info!(purged, %cutoff, "token cleanup finished");

    Ok(())
}
