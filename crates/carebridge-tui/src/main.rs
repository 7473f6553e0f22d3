//! Carebridge terminal client entry point.

use std::{fmt, path::PathBuf, sync::Arc};

use carebridge_app::Runtime;
use carebridge_client::{
    ApiClient, AuthSession, ClientConfig, ClientError, CredentialFetcher, FileTokenStore,
    HttpCredentialFetcher, LiveKitRoom, LoopbackRoom, MediaRoom, SystemEnv,
};
use carebridge_proto::api::SessionStatus;
use carebridge_tui::{OfflineFetcher, TerminalDriver, TerminalError, logging};
use clap::Parser;
use thiserror::Error;

/// Carebridge session client
#[derive(Parser, Debug)]
#[command(name = "carebridge")]
#[command(about = "Join a Carebridge telehealth session from the terminal")]
#[command(version)]
struct Args {
    /// Session to join
    #[arg(short, long)]
    session: String,

    /// Backend base URL (overrides CAREBRIDGE_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Media server URL (overrides the one the backend returns)
    #[arg(long)]
    media_url: Option<String>,

    /// Account alias; logs in before joining
    #[arg(long, requires = "pin")]
    alias: Option<String>,

    /// Account PIN
    #[arg(long, env = "CAREBRIDGE_PIN", hide_env_values = true)]
    pin: Option<String>,

    /// Mark the session LIVE before joining
    #[arg(long)]
    start: bool,

    /// Join the in-process loopback room without a backend
    #[arg(long, conflicts_with_all = ["api_url", "media_url", "alias", "start"])]
    offline: bool,

    /// Where the login is persisted
    #[arg(long, default_value = ".carebridge/auth.json")]
    token_file: PathBuf,

    /// Log file
    #[arg(long, default_value = "carebridge.log")]
    log_file: PathBuf,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Errors that end the client.
#[derive(Error)]
enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Terminal(#[from] TerminalError),

    #[error("cannot open log file: {0}")]
    Logging(std::io::Error),

    #[error("not logged in; pass --alias and --pin")]
    NotLoggedIn,

    #[error("{0}")]
    SessionEnded(String),
}

// `main` reports errors through `Debug`; show the message instead.
impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let args = Args::parse();
    logging::init(&args.log_file, &args.log_level).map_err(CliError::Logging)?;

    if args.offline {
        tracing::info!(session = %args.session, "joining offline");
        return join(OfflineFetcher::new(), LoopbackRoom::new("me"), &args.session).await;
    }

    let mut config = ClientConfig::from_env();
    if let Some(url) = &args.api_url {
        config = config.with_api_base_url(url);
    }
    if let Some(url) = &args.media_url {
        config = config.with_media_url_override(url);
    }

    let auth = AuthSession::new(Arc::new(FileTokenStore::new(&args.token_file)));
    let api = ApiClient::new(&config, auth.clone())?;

    match (&args.alias, &args.pin) {
        (Some(alias), Some(pin)) => {
            api.login(alias, pin).await?;
        },
        _ => {
            if auth.restore().await?.is_none() {
                return Err(CliError::NotLoggedIn);
            }
        },
    }

    if args.start {
        start_session(&api, &args.session).await;
    }

    let fetcher = HttpCredentialFetcher::new(api, &config);
    join(fetcher, LiveKitRoom::new(), &args.session).await
}

/// Mark the session LIVE unless it already is. Failures are logged and the
/// join goes ahead.
async fn start_session(api: &ApiClient, session_id: &str) {
    let result = async {
        let record = api.get_session(session_id).await?;
        if record.status != SessionStatus::Live {
            api.update_session_status(session_id, SessionStatus::Live).await?;
        }
        Ok::<_, ClientError>(())
    }
    .await;

    if let Err(e) = result {
        tracing::warn!(session_id, error = %e, "could not start session, joining anyway");
    }
}

/// Run the session screen until it exits.
async fn join<F, R>(fetcher: F, room: R, session_id: &str) -> Result<(), CliError>
where
    F: CredentialFetcher,
    R: MediaRoom,
{
    let driver = TerminalDriver::new()?;
    let mut runtime = Runtime::new(driver, fetcher, room, SystemEnv, session_id);
    runtime.run().await?;

    match runtime.driver().last_alert() {
        Some(alert) => Err(CliError::SessionEnded(alert.to_string())),
        None => Ok(()),
    }
}
