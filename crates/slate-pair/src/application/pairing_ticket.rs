//! Pairing tickets.
//!
//! A [`PairingTicket`] is one pairing token as issued by the host, the URL
//! a controller opens to redeem it, and the moment it was issued.  The
//! panel replaces the ticket shortly before it expires:
//!
//! ```text
//! issued ─────────────── ttl ───────────────▶ expires
//!                        refresh ◀─ margin ─▶
//! refresh_delay = max(ttl − margin, 1 s)
//! ```
//!
//! The delay never drops below 1 s, however short the TTL.

use std::time::Duration;

use async_trait::async_trait;
use slate_core::protocol::http::{PairingTokenResponse, ServerInfo, PAIRING_TOKEN_PARAM};
use thiserror::Error;
use tokio::time::Instant;
use url::Url;

/// Smallest delay between two refreshes.
pub const MIN_REFRESH_DELAY: Duration = Duration::from_secs(1);

/// Errors while obtaining a ticket.
#[derive(Debug, Error)]
pub enum PairError {
    /// The host could not be reached or answered with an error.
    #[error("host request failed: {0}")]
    Host(String),
    /// The host's address does not form a valid URL.
    #[error("cannot build pairing URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Where pairing tokens and the host's LAN address come from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PairingTokenSource: Send + Sync {
    /// `GET /api/auth/qr-token`.
    async fn issue_pairing_token(&self) -> Result<PairingTokenResponse, PairError>;
    /// `GET /api/server-info`.
    async fn server_info(&self) -> Result<ServerInfo, PairError>;
}

/// One issued pairing token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingTicket {
    pub token: String,
    pub ttl: Duration,
    pub issued_at: Instant,
    /// What the controller opens, e.g. `http://192.168.1.20:5173/?qrToken=...`.
    pub pairing_url: Url,
}

impl PairingTicket {
    /// Builds a ticket from the host's two answers.
    ///
    /// # Errors
    ///
    /// [`PairError::Url`] if `info.ip` cannot form a URL host.
    pub fn new(
        issued: PairingTokenResponse,
        info: &ServerInfo,
        issued_at: Instant,
    ) -> Result<Self, PairError> {
        let pairing_url = pairing_url(info, &issued.qr_token)?;
        Ok(Self {
            token: issued.qr_token,
            ttl: Duration::from_secs(issued.ttl_seconds),
            issued_at,
            pairing_url,
        })
    }

    /// How long after issue the next ticket should be fetched.
    pub fn refresh_delay(&self, margin: Duration) -> Duration {
        self.ttl.saturating_sub(margin).max(MIN_REFRESH_DELAY)
    }

    /// When the next ticket should be fetched.
    pub fn refresh_at(&self, margin: Duration) -> Instant {
        self.issued_at + self.refresh_delay(margin)
    }

    pub fn expires_at(&self) -> Instant {
        self.issued_at + self.ttl
    }
}

/// `http://{ip}:{clientPort}/?qrToken={token}`
///
/// # Errors
///
/// Returns the parse error if `info.ip` is not a valid host.
pub fn pairing_url(info: &ServerInfo, token: &str) -> Result<Url, url::ParseError> {
    let host = if info.ip.contains(':') && !info.ip.starts_with('[') {
        format!("[{}]", info.ip)
    } else {
        info.ip.clone()
    };
    let mut url = Url::parse(&format!("http://{host}:{}/", info.client_port))?;
    url.query_pairs_mut().append_pair(PAIRING_TOKEN_PARAM, token);
    Ok(url)
}
