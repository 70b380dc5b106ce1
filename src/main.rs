//! CLI entry point for coursehub.

mod cli;

use std::sync::Arc;

use clap::Parser;
use coursehub::account;
use coursehub::api::ApiClient;
use coursehub::auth::{
    token_health, unix_now_millis, FileTokenStore, SessionNotifier, TokenStore,
};
use coursehub::config::{load_config, Config};
use coursehub::error::{ApiError, ClientError};

#[tokio::main]
async fn main() {
    init_tracing();
    let args = cli::Args::parse();

    let mut config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };
    if let Some(url) = &args.base_url {
        config.api.base_url = url.trim_end_matches('/').to_string();
    }

    let Some(store_path) = config.token_file_path() else {
        eprintln!("error: unable to resolve a credential store path");
        std::process::exit(1);
    };
    let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(store_path));
    let notifier = Arc::new(SessionNotifier::new());
    // Registered before any authenticated request can happen.
    notifier.on_session_expired(|| {
        eprintln!("session expired: run `coursehub login` to sign in again");
    });
    let api = ApiClient::new(&config, Arc::clone(&store), Arc::clone(&notifier));

    let result = match args.command {
        cli::Command::Login { email } => run_login(&api, &email).await,
        cli::Command::Register { name, email } => run_register(&api, &name, &email).await,
        cli::Command::Status => run_status(&api, &config).await,
        cli::Command::Refresh => run_refresh(&api).await,
        cli::Command::Logout => account::logout(&api).await,
        cli::Command::Health => run_health(&api).await,
    };

    notifier.clear_handler();
    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_env("COURSEHUB_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn prompt_password() -> Result<String, ClientError> {
    rpassword::prompt_password("password: ")
        .map_err(|err| ClientError::Invalid(format!("failed to read password: {err}")))
}

async fn run_login(api: &ApiClient, email: &str) -> Result<(), ClientError> {
    let password = prompt_password()?;
    let pair = account::login(api, email, &password).await?;
    println!(
        "logged in; access token valid for {} seconds",
        pair.remaining_seconds(unix_now_millis())
    );
    Ok(())
}

async fn run_register(api: &ApiClient, name: &str, email: &str) -> Result<(), ClientError> {
    let password = prompt_password()?;
    let profile = account::register(api, name, email, &password).await?;
    println!("registered: {profile}");
    Ok(())
}

async fn run_status(api: &ApiClient, config: &Config) -> Result<(), ClientError> {
    let health = token_health(
        api.token_store().as_ref(),
        unix_now_millis(),
        config.expiry_buffer(),
    )
    .await?;
    if !health.has_tokens {
        println!("not signed in");
        return Ok(());
    }
    println!("signed in");
    println!("  expiring soon: {}", health.expiring_soon);
    println!("  remaining:     {} seconds", health.remaining_seconds);
    Ok(())
}

async fn run_refresh(api: &ApiClient) -> Result<(), ClientError> {
    let pair = api
        .refresher()
        .refresh_access_token()
        .await
        .map_err(|err| ClientError::Api(ApiError::from(err)))?;
    println!(
        "refreshed; access token valid for {} seconds",
        pair.remaining_seconds(unix_now_millis())
    );
    Ok(())
}

async fn run_health(api: &ApiClient) -> Result<(), ClientError> {
    let body: serde_json::Value = api.get("/health").await?;
    println!("{body}");
    Ok(())
}
