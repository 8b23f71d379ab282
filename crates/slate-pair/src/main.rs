//! Slate pairing panel: entry point.
//!
//! Prints the URL a controller opens to pair with a host, and keeps
//! printing a fresh one shortly before each pairing token expires.
//!
//! # Usage
//!
//! ```text
//! slate-pair [OPTIONS]
//!
//! Options:
//!   --host                <URL>   Host API base URL [default: http://127.0.0.1:8000]
//!   --refresh-margin-secs <SECS>  Refresh this long before expiry [default: 5]
//!   --once                        Print one pairing URL and exit
//!   --probe                       Check /health and exit
//! ```
//!
//! | Variable               | Default                 |
//! |------------------------|-------------------------|
//! | `SLATE_HOST`           | `http://127.0.0.1:8000` |
//! | `SLATE_REFRESH_MARGIN` | `5`                     |

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

use slate_controller::infrastructure::host_api::HostApi;
use slate_pair::application::pairing_ticket::{PairingTicket, PairingTokenSource};
use slate_pair::domain::PairConfig;
use slate_pair::infrastructure::panel::PanelService;
use slate_pair::infrastructure::probe::probe;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Slate pairing panel.
#[derive(Debug, Parser)]
#[command(name = "slate-pair", version)]
struct Cli {
    /// Host API base URL.
    #[arg(long, default_value = "http://127.0.0.1:8000", env = "SLATE_HOST")]
    host: String,

    /// Fetch the next pairing token this many seconds before the current
    /// one expires.
    #[arg(long, default_value_t = 5, env = "SLATE_REFRESH_MARGIN")]
    refresh_margin_secs: u64,

    /// Print a single pairing URL and exit.
    #[arg(long, conflicts_with = "probe")]
    once: bool,

    /// Probe the host's /health endpoint and exit.
    #[arg(long)]
    probe: bool,
}

impl Cli {
    /// # Errors
    ///
    /// Returns an error if `--host` is not a valid URL.
    fn to_pair_config(&self) -> anyhow::Result<PairConfig> {
        let host =
            Url::parse(&self.host).with_context(|| format!("invalid host URL: '{}'", self.host))?;
        Ok(PairConfig {
            host,
            refresh_margin: Duration::from_secs(self.refresh_margin_secs),
            ..PairConfig::default()
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.to_pair_config()?;
    let api = HostApi::new(config.host.clone(), config.request_timeout);

    if cli.probe {
        let report = probe(&api).await;
        println!("{report}");
        if !report.is_healthy() {
            bail!("host at {} is not healthy", config.host);
        }
        return Ok(());
    }

    if cli.once {
        let info = api.server_info().await.context("fetching server info")?;
        let issued = api
            .issue_pairing_token()
            .await
            .context("fetching pairing token")?;
        let ticket = PairingTicket::new(issued, &info, tokio::time::Instant::now())?;
        println!("{}", ticket.pairing_url);
        return Ok(());
    }

    let source: Arc<dyn PairingTokenSource> = Arc::new(api);
    let (panel, task) = PanelService::spawn(source, config.refresh_margin, config.retry_delay);

    // ── Ctrl-C closes the panel ───────────────────────────────────────────────
    let closer = panel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            closer.close().await;
        }
    });

    let mut tickets = panel.tickets();
    while tickets.changed().await.is_ok() {
        let current = tickets.borrow_and_update().clone();
        match current {
            Some(ticket) => println!("{}", ticket.pairing_url),
            None => break,
        }
    }

    task.await.context("pairing panel task failed")?;
    Ok(())
}
