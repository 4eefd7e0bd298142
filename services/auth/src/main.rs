use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use auth::{AuthConfig, AuthError, Session, SessionStore};
use common::{StorageConfig, open_store};

/// Client for the remote auth API with a persisted session
#[derive(Parser)]
#[command(name = "auth", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in with an email or username
    Login {
        identifier: String,
        secret: String,
    },
    /// Log out and clear the stored session
    Logout,
    /// Exchange the refresh token for a new access token
    Refresh,
    /// Show the current session and profile
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cli = Cli::parse();

    let auth_config = AuthConfig::from_env()?;
    let storage_config = StorageConfig::from_env()?;
    let storage = open_store(&storage_config).await?;
    let store = SessionStore::from_config(&auth_config, Arc::clone(&storage))?;

    // Startup: hydrate from storage, then validate what was loaded
    if let Err(e) = store.hydrate().await {
        warn!("Hydration failed: {}", e);
    }
    let restored = store.check_auth().await;
    info!("Auth check result: {}", restored);

    match cli.command {
        Command::Login { identifier, secret } => match store.login(&identifier, &secret).await {
            Ok(session) => {
                println!("Logged in");
                print_session(&session);
            }
            Err(e) => return Err(report(e)),
        },
        Command::Logout => {
            store.logout().await;
            println!("Logged out");
        }
        Command::Refresh => match store.refresh_access_token().await {
            Ok(session) => {
                println!("Token refreshed");
                print_session(&session);
            }
            Err(e) => return Err(report(e)),
        },
        Command::Status => print_session(&store.session().await),
    }

    Ok(())
}

fn print_session(session: &Session) {
    if !session.is_authenticated {
        println!("Not signed in");
        return;
    }

    if let Some(expiration) = session
        .access_token_expiration
        .and_then(chrono::DateTime::from_timestamp_millis)
    {
        println!("Token expires: {}", expiration.to_rfc3339());
    }

    match &session.user {
        Some(user) => {
            println!("Name:  {}", user.display_name());
            if let Some(email) = &user.email {
                println!("Email: {}", email);
            }
            if let Some(role) = &user.role {
                println!("Role:  {}", role);
            }
            println!("Verified: {}", if user.is_verified() { "yes" } else { "no" });
        }
        None => println!("No profile loaded"),
    }
}

fn report(error: AuthError) -> anyhow::Error {
    if let Some(fields) = error.field_errors() {
        for (field, messages) in fields {
            for message in messages {
                eprintln!("{}: {}", field, message);
            }
        }
    }
    anyhow::anyhow!(error.user_message())
}
