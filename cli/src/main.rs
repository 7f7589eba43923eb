//! Seedling CLI - one-shot credential exchange against a Farmbot web app.
//!
//! ```text
//! main() -> load config -> init_tracing() -> Commands::{Token, Secret}
//!                                                  |
//!                                                  v
//!                            Authorization (retries until terminal or Ctrl-C)
//! ```
//!
//! stdout carries only the token (or secret); logs go to stderr.

mod account;

use std::future::Future;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use account::AccountArgs;
use seedling_auth::{AuthError, Authorization, Authorizer, Login};
use seedling_config::{ConfigError, SeedlingConfig};
use seedling_types::{Credentials, Secret, ServerAddress, Token};

#[derive(Parser)]
#[command(name = "seedling", version)]
#[command(about = "Exchange Farmbot account credentials for a session token")]
struct Cli {
    /// Config file [default: ~/.seedling/config.toml]
    #[arg(long, env = "SEEDLING_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Request a session token and print it
    Token {
        #[command(flatten)]
        account: AccountArgs,

        /// Exchange a previously provisioned secret instead of email and password
        #[arg(long, env = "SEEDLING_SECRET", hide_env_values = true)]
        secret: Option<String>,
    },
    /// Seal credentials with the server's public key and print the secret
    Secret {
        #[command(flatten)]
        account: AccountArgs,
    },
}

fn init_tracing(config_level: Option<&str>) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config_level.unwrap_or("info")))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn settle_config(loaded: Result<Option<SeedlingConfig>, ConfigError>) -> Result<SeedlingConfig> {
    match loaded {
        Ok(config) => Ok(config.unwrap_or_default()),
        Err(err) => {
            tracing::error!(path = %err.path().display(), error = %err, "Unusable config file");
            Err(err.into())
        }
    }
}

/// Drive `work` until it finishes or `cancel` fires.
async fn until_cancelled<T>(
    cancel: &CancellationToken,
    work: impl Future<Output = Result<T, AuthError>>,
) -> Result<T, AuthError> {
    tokio::select! {
        () = cancel.cancelled() => Err(AuthError::Cancelled),
        result = work => result,
    }
}

async fn request_token(
    authorizer: &dyn Authorizer,
    credentials: &Credentials,
    server: &ServerAddress,
    cancel: &CancellationToken,
) -> Result<Token, AuthError> {
    until_cancelled(cancel, authorizer.authorize(credentials, server)).await
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling authorization");
            trigger.cancel();
        }
    });
    cancel
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging depends on the config, so a load failure is reported after init.
    let loaded = SeedlingConfig::load(cli.config.as_deref());
    init_tracing(
        loaded
            .as_ref()
            .ok()
            .and_then(Option::as_ref)
            .and_then(SeedlingConfig::log_level),
    );
    let config = settle_config(loaded)?;
    let file = config.account.as_ref();

    let authorization = Authorization::new().context("failed to build HTTP client")?;
    let cancel = cancel_on_ctrl_c();

    match cli.command {
        Commands::Token { account, secret } => {
            let server = account.server(file)?;
            let token = match secret {
                Some(secret) => {
                    let secret = Secret::new(secret)?;
                    authorization
                        .exchange(Login::Secret(&secret), &server, &cancel)
                        .await?
                }
                None => {
                    let credentials = account.credentials(file)?;
                    request_token(&authorization, &credentials, &server, &cancel).await?
                }
            };
            println!("{}", token.as_str());
        }
        Commands::Secret { account } => {
            let server = account.server(file)?;
            let credentials = account.credentials(file)?;
            let secret = until_cancelled(
                &cancel,
                authorization.provision_secret(&credentials, &server),
            )
            .await?;
            println!("{}", secret.expose_secret());
        }
    }

    Ok(())
}
