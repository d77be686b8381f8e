use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use website_backend::{config::Config, routes::router, state::AppState};

fn mask_database_url(url: &str) -> String {
    match url.split_once('@') {
        Some((_, host)) => format!("***@{}", host),
        None => url.to_string(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "website_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!(
        database_url = %mask_database_url(&config.database_url),
        bind_address = %config.bind_address,
        token_timeout_hours = config.token_timeout_hours,
        auth_carrier = ?config.auth_carrier,
        session_cookie_name = %config.session_cookie_name,
        cookie_secure = config.cookie_secure,
        "Loaded configuration from environment/.env"
    );

    let addr: SocketAddr = config.bind_address.parse()?;
    let state = AppState::connect(config).await?;
    let app = router(state);

    tracing::info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
