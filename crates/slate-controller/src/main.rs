//! Slate controller entry point.
//!
//! Wires together the auth session, the state store, and the sync service,
//! then runs a small line-oriented console so the controller can be driven
//! without a touch UI.
//!
//! # Usage
//!
//! ```text
//! slate-controller [OPTIONS]
//!
//! Options:
//!   --host       <URL>    Host API base URL, e.g. http://192.168.1.20:8000
//!   --url        <URL>    Launch URL; may carry ?qrToken=<pairing token>
//!   --config     <PATH>   Config file [default: platform config dir]
//!   --token-file <PATH>   Session token file [default: next to the config]
//!   --log-level  <LEVEL>  error | warn | info | debug | trace
//!   --write-config        Save the merged config to the config path and exit
//! ```
//!
//! # Console commands
//!
//! | input           | effect                                   |
//! |-----------------|------------------------------------------|
//! | `press <id>`    | `BUTTON_PRESSED`                         |
//! | `profile <id>`  | `SWITCH_PROFILE`                         |
//! | `buttons`       | `GET_BUTTONS`                            |
//! | `profiles`      | `GET_PROFILES`                           |
//! | `suspend`       | foreground lost (no reconnects)          |
//! | `resume`        | foreground regained (reconnect now)      |
//! | `state`         | print the current state as JSON          |
//! | `quit`          | close and exit                           |
//!
//! # Startup order
//!
//! The pairing-token exchange runs to completion *before* the first
//! connect, so the `HELLO` carries the freshest session token.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

use slate_controller::application::auth_session::{
    AuthSession, LocationBar, PairingExchange, TokenStore,
};
use slate_controller::application::state_store::StateStore;
use slate_controller::infrastructure::config::{
    config_file_path, load_config, save_config, token_file_path, ControllerConfig,
};
use slate_controller::infrastructure::host_api::HostApi;
use slate_controller::infrastructure::location::LaunchUrl;
use slate_controller::infrastructure::network::{SyncConfig, SyncHandle, SyncService};
use slate_controller::infrastructure::token_store::FileTokenStore;
use slate_core::AppState;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Slate controller: keeps a live copy of a Slate host's buttons and
/// profiles over a WebSocket.
#[derive(Debug, Parser)]
#[command(name = "slate-controller", version)]
struct Cli {
    /// Host API base URL.  Overrides `[host] base_url` from the config.
    #[arg(long, env = "SLATE_HOST")]
    host: Option<String>,

    /// URL the controller was launched with.
    ///
    /// When it carries `?qrToken=...` the pairing token is exchanged for a
    /// session token before connecting.
    #[arg(long, env = "SLATE_LAUNCH_URL")]
    url: Option<String>,

    /// Path of the TOML config file.
    #[arg(long, env = "SLATE_CONFIG")]
    config: Option<PathBuf>,

    /// Path of the session token file.
    #[arg(long, env = "SLATE_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    /// Log level used when `RUST_LOG` is unset.  Overrides the config.
    #[arg(long, env = "SLATE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Write the config (file values plus CLI overrides) back to the config
    /// path and exit.
    #[arg(long)]
    write_config: bool,
}

/// Everything `main` needs after CLI and config have been merged.
struct Settings {
    config: ControllerConfig,
    config_path: PathBuf,
    write_config: bool,
    launch_url: Url,
    token_file: PathBuf,
}

impl Cli {
    /// Loads the config file and applies CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be read, or if `--host` or
    /// `--url` is not a valid URL.
    fn into_settings(self) -> anyhow::Result<Settings> {
        let config_path = match self.config {
            Some(path) => path,
            None => config_file_path().context("locating config file")?,
        };
        let mut config = load_config(&config_path)
            .with_context(|| format!("loading config from {}", config_path.display()))?;

        if let Some(host) = self.host {
            config.host.base_url = host;
        }
        if let Some(level) = self.log_level {
            config.controller.log_level = level;
        }

        let base_url = config.base_url().context("invalid host URL")?;
        let launch_url = match self.url {
            Some(raw) => Url::parse(&raw).with_context(|| format!("invalid launch URL: {raw}"))?,
            None => base_url,
        };

        let token_file = match self.token_file {
            Some(path) => path,
            None => token_file_path().context("locating session token file")?,
        };

        Ok(Settings {
            config,
            config_path,
            write_config: self.write_config,
            launch_url,
            token_file,
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Cli::parse().into_settings()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.config.controller.log_level)),
        )
        .init();

    if settings.write_config {
        save_config(&settings.config_path, &settings.config)
            .with_context(|| format!("writing config to {}", settings.config_path.display()))?;
        println!("{}", settings.config_path.display());
        return Ok(());
    }

    info!("Slate controller starting");
    let config = settings.config;

    // ── Collaborators ─────────────────────────────────────────────────────────
    let token_file = FileTokenStore::new(&settings.token_file);
    info!("session token file: {}", token_file.path().display());
    let tokens: Arc<dyn TokenStore> = Arc::new(token_file);
    let location = Arc::new(LaunchUrl::new(settings.launch_url));
    let host_api = HostApi::new(config.base_url()?, config.request_timeout());
    let exchanger: Arc<dyn PairingExchange> = Arc::new(host_api);
    let auth = Arc::new(AuthSession::new(
        Arc::clone(&tokens),
        exchanger,
        Arc::clone(&location) as Arc<dyn LocationBar>,
    ));
    let store = Arc::new(StateStore::new(Arc::clone(&tokens)));

    // ── Pairing, then connect ─────────────────────────────────────────────────
    if auth.exchange_pairing_token().await {
        info!("paired with host; launch URL is now {}", location.current());
    } else if location.replacements() > 0 {
        warn!("pairing token could not be exchanged; fetch a fresh one from the host");
    }

    let sync_config = SyncConfig {
        ws_url: config.ws_url()?,
        backoff: config.backoff(),
        connect_timeout: config.request_timeout(),
    };
    let (handle, service) = SyncService::spawn(sync_config, auth, store);
    handle.connect().await?;

    tokio::spawn(log_state_changes(handle.clone()));

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let ctrl_c_handle = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            let _ = ctrl_c_handle.shutdown().await;
        }
    });

    // ── Console ───────────────────────────────────────────────────────────────
    let console_handle = handle.clone();
    let console = tokio::spawn(async move { run_console(console_handle).await });

    service.await.context("sync service task failed")?;
    console.abort();
    info!("Slate controller stopped");
    Ok(())
}

/// Reads console commands until `quit` or end of input.
async fn run_console(handle: SyncHandle) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let mut words = line.split_whitespace();
        let result = match (words.next(), words.next()) {
            (Some("press"), Some(id)) => handle.press_button(id).await,
            (Some("profile"), Some(id)) => handle.switch_profile(id).await,
            (Some("buttons"), None) => handle.refresh_buttons().await,
            (Some("profiles"), None) => handle.refresh_profiles().await,
            (Some("suspend"), None) => handle.suspend().await,
            (Some("resume"), None) => handle.resume().await,
            (Some("state"), None) => {
                println!("{}", serde_json::to_string_pretty(&handle.snapshot())?);
                Ok(())
            }
            (Some("quit"), None) => break,
            (None, _) => continue,
            _ => {
                println!("commands: press <id> | profile <id> | buttons | profiles | suspend | resume | state | quit");
                continue;
            }
        };
        result.context("sync service is gone")?;
    }

    handle.shutdown().await.ok();
    Ok(())
}

/// Logs connection and auth transitions at `info`, everything else at `debug`.
async fn log_state_changes(handle: SyncHandle) {
    let mut rx = handle.state();
    let mut previous = AppState::default();

    while rx.changed().await.is_ok() {
        let current = rx.borrow_and_update().clone();
        if current.connection != previous.connection || current.auth != previous.auth {
            info!("connection={:?} auth={:?}", current.connection, current.auth);
        }
        if current.active_profile_id != previous.active_profile_id {
            info!("active profile: {:?}", current.active_profile_id);
        }
        if current.buttons != previous.buttons {
            debug!("{} buttons", current.buttons.len());
        }
        if let Some(result) = current.last_result.as_ref() {
            if previous.last_result.as_ref() != Some(result) {
                info!("{} → {:?}: {}", result.button_id, result.status, result.message);
            }
        }
        previous = current;
    }
}
