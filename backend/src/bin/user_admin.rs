use std::io::{self, BufRead, Write};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use website_backend::{
    config::Config,
    db::connection::{create_pool, run_migrations},
    models::user::{default_capabilities, find_unknown_capability, USERS_ADMIN},
    repositories::PgUserRepository,
    services::{AuthError, CredentialStore},
};

/// Manage website user accounts
#[derive(Parser)]
#[command(name = "user_admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a user; the password is read from stdin unless given
    CreateUser {
        username: String,
        #[arg(long, env = "USER_ADMIN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Capability to grant, repeatable (default: TIMES/READ and TIMES/WRITE)
        #[arg(long = "capability")]
        capabilities: Vec<String>,
        /// Also grant USERS/ADMIN
        #[arg(long)]
        admin: bool,
    },

    /// Delete a user and all of their sessions
    DeleteUser { username: String },

    /// List all users
    #[command(alias = "ls")]
    ListUsers,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries command output; log to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "website_backend=info,user_admin=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = Config::load()?;
    if config.uses_memory_store() {
        anyhow::bail!("user_admin needs a PostgreSQL DATABASE_URL");
    }
    let pool = create_pool(&config.database_url, 1).await?;
    run_migrations(&pool).await?;
    let credentials = CredentialStore::new(Arc::new(PgUserRepository::new(pool)));

    match cli.command {
        Commands::CreateUser {
            username,
            password,
            capabilities,
            admin,
        } => {
            let password = match password {
                Some(password) => password,
                None => prompt_password()?,
            };
            if password.len() < 8 {
                anyhow::bail!("password must be at least 8 characters");
            }
            let mut capabilities = if capabilities.is_empty() {
                default_capabilities()
            } else {
                capabilities
            };
            if let Some(unknown) = find_unknown_capability(&capabilities) {
                anyhow::bail!("unknown capability {}", unknown);
            }
            if admin && !capabilities.iter().any(|c| c == USERS_ADMIN) {
                capabilities.push(USERS_ADMIN.to_string());
            }

            match credentials.create(&username, &password, capabilities).await {
                Ok(user) => println!("created {} ({})", user.username, user.id),
                Err(AuthError::UserExists(name)) => anyhow::bail!("user {} already exists", name),
                Err(err) => return Err(err.into()),
            }
        }
        Commands::DeleteUser { username } => {
            if !credentials.delete(&username).await? {
                anyhow::bail!("no such user: {}", username);
            }
            println!("deleted {}", username);
        }
        Commands::ListUsers => {
            for user in credentials.list().await? {
                println!(
                    "{}\t{}\t{}",
                    user.username,
                    user.capabilities.join(","),
                    user.created_at.format("%Y-%m-%d")
                );
            }
        }
    }

    Ok(())
}

fn prompt_password() -> anyhow::Result<String> {
    print!("password: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
