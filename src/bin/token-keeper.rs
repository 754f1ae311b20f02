use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use token_keeper::config::settings::parse_lifetime_override;
use token_keeper::credentials::credential::Credential;
use token_keeper::manager::token_manager::TokenManager;
use token_keeper::observability::metrics::Metrics;
use token_keeper::server::server::{self, AppState};
use token_keeper::sources::oauth2::HttpTokenClient;
use token_keeper::utils::config_loader;
use token_keeper::utils::logging::{self, LogLevel};
use tracing::{debug, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "token-keeper.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
    /// key handed to the secret decoder; `plain` and `base64` ignore it,
    /// only custom `SecretDecoder` implementations read it
    #[arg(long, env = "TOKEN_KEEPER_SECRET_KEY", hide_env_values = true, default_value = "")]
    secret_key: String,
    /// fixed token lifetime in seconds; blank falls back to `expires_in`
    #[arg(long, env = "TOKEN_EXPIRY_SECONDS")]
    token_expiry_seconds: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch one token and print it
    Token,
    /// Serve tokens over HTTP (default)
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Read args, load YAML config
    // -------------------------------

    let args = Args::parse();
    let service_config = config_loader::run(&args.config).await?;
    logging::run(&service_config, args.log_level)?;

    // -------------------------------
    // 2. Resolve credentials
    // -------------------------------

    let settings = &service_config.settings;
    let decoder = settings.secret_encoding.decoder();
    if !args.secret_key.is_empty() {
        debug!(
            "secret key is set but ignored by the {:?} decoder",
            settings.secret_encoding
        );
    }
    let credential = Credential::load(
        &service_config.properties(),
        decoder.as_ref(),
        &args.secret_key,
        settings.decode_client_id,
    )?;

    // CLI / env override wins over the config file
    let lifetime_override = match parse_lifetime_override(args.token_expiry_seconds.as_deref())? {
        Some(seconds) => Some(seconds),
        None => settings.lifetime_override()?,
    };

    // -------------------------------
    // 3. Build token manager
    // -------------------------------

    let metrics = Arc::new(Metrics::new().map_err(|e| anyhow!("cannot register metrics: {}", e))?);
    let client = HttpTokenClient::with_timeout(settings.http_timeout())?;
    let manager = TokenManager::new(credential, client)
        .with_safety_margin(settings.safety_margin())
        .with_lifetime_override(lifetime_override)
        .with_retry_policy(Some(settings.retry_policy()))
        .with_metrics(metrics.clone());
    let manager = Arc::new(manager);

    // -------------------------------
    // 4. Run command
    // -------------------------------

    match args.command.unwrap_or(Command::Serve) {
        Command::Token => {
            let token = manager.get_token().await?;
            println!("{}", token);
        }
        Command::Serve => {
            info!("Service starting...");
            server::start(settings, AppState::new(manager), Some(metrics.as_ref())).await?;
        }
    }

    Ok(())
}
