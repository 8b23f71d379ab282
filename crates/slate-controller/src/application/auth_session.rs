//! Auth Session: resolves and persists the credential the controller
//! presents in its handshake.
//!
//! # Two ways to prove identity (for beginners)
//!
//! 1. **Session token** – a long-lived opaque string the host issued earlier.
//!    It is persisted locally and sent in every `HELLO`.
//! 2. **Pairing token** – a short-lived, single-use string the host shows as
//!    a QR code.  Scanning it opens the controller with `?qrToken=...` in the
//!    URL.  The controller trades it for a session token over HTTP once.
//!
//! ```text
//! launch URL ?qrToken=abc&theme=dark
//!   │
//!   ├─ strip qrToken from the visible URL   (always, before the request)
//!   ├─ POST /api/auth/exchange?qrToken=abc
//!   │     200 {sessionToken} → persist, return true
//!   │     anything else      → return false, store untouched
//!   ▼
//! connect + HELLO {version, token}
//! ```
//!
//! # Seams
//!
//! Persistence, the HTTP exchange, and the visible URL are all traits so
//! the session can run against a file, a browser store, or an in-memory
//! fake without changing this module.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::Url;

use slate_core::protocol::http::PAIRING_TOKEN_PARAM;

// ── Seams ─────────────────────────────────────────────────────────────────────

/// Errors from a [`TokenStore`] backend.
#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("token store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("token store is corrupt: {0}")]
    Corrupt(String),
}

/// Key-value persistence for the single session token.
///
/// Each call is one atomic operation; no transactions are needed because
/// connect and auth flows are serialized.
pub trait TokenStore: Send + Sync {
    /// Reads the token.  `Ok(None)` means "no session".
    fn load(&self) -> Result<Option<String>, TokenStoreError>;
    /// Writes (or overwrites) the token.
    fn store(&self, token: &str) -> Result<(), TokenStoreError>;
    /// Deletes the token.  Deleting a missing token is not an error.
    fn erase(&self) -> Result<(), TokenStoreError>;
}

/// Why a pairing-token exchange failed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExchangeError {
    /// The host answered with a non-success status (expired, used, unknown).
    #[error("host rejected pairing token (HTTP {status})")]
    Rejected { status: u16 },
    /// The host answered 2xx but the body had no usable session token.
    #[error("malformed exchange response: {0}")]
    Malformed(String),
    /// The request never completed.
    #[error("exchange request failed: {0}")]
    Network(String),
}

/// Trades a pairing token for a session token.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PairingExchange: Send + Sync {
    async fn exchange(&self, pairing_token: &str) -> Result<String, ExchangeError>;
}

/// The URL the user currently sees.
///
/// `replace` must rewrite the current history entry, never push a new one,
/// so the pairing token cannot be recovered with "back".
pub trait LocationBar: Send + Sync {
    fn current(&self) -> Url;
    fn replace(&self, url: Url);
}

// ── Auth session ──────────────────────────────────────────────────────────────

/// Resolves the credential used to authenticate the sync connection.
pub struct AuthSession {
    tokens: Arc<dyn TokenStore>,
    exchanger: Arc<dyn PairingExchange>,
    location: Arc<dyn LocationBar>,
}

impl AuthSession {
    pub fn new(
        tokens: Arc<dyn TokenStore>,
        exchanger: Arc<dyn PairingExchange>,
        location: Arc<dyn LocationBar>,
    ) -> Self {
        Self {
            tokens,
            exchanger,
            location,
        }
    }

    /// Returns the persisted session token, if any.
    ///
    /// A store failure is logged and reported as "no token".
    pub fn get_token(&self) -> Option<String> {
        match self.tokens.load() {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                error!("failed to read session token: {e}");
                None
            }
        }
    }

    /// Persists a session token.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the write fails.
    pub fn save_token(&self, token: &str) -> Result<(), TokenStoreError> {
        self.tokens.store(token)?;
        info!("session token saved ({})", token_prefix(token));
        Ok(())
    }

    /// Forgets the persisted session token.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the delete fails.
    pub fn clear_token(&self) -> Result<(), TokenStoreError> {
        self.tokens.erase()?;
        info!("session token cleared");
        Ok(())
    }

    /// Exchanges a pairing token found in the launch URL for a session token.
    ///
    /// Returns `false` immediately, with no side effects, when the URL has no
    /// (or an empty) pairing token.  Otherwise the token is stripped from
    /// the visible URL *before* the request is made, and the result of the
    /// exchange decides the return value.  Nothing is persisted on failure.
    pub async fn exchange_pairing_token(&self) -> bool {
        let current = self.location.current();
        let Some((pairing_token, stripped)) = take_query_param(&current, PAIRING_TOKEN_PARAM)
        else {
            debug!("no pairing token in launch URL");
            return false;
        };

        // Strip first, synchronously, regardless of what the exchange does.
        self.location.replace(stripped);

        match self.exchanger.exchange(&pairing_token).await {
            Ok(session_token) if !session_token.is_empty() => {
                match self.save_token(&session_token) {
                    Ok(()) => {
                        info!("pairing token {} exchanged", token_prefix(&pairing_token));
                        true
                    }
                    Err(e) => {
                        error!("exchange succeeded but the session token could not be saved: {e}");
                        false
                    }
                }
            }
            Ok(_) => {
                warn!("pairing exchange returned an empty session token");
                false
            }
            Err(e) => {
                warn!("pairing exchange failed: {e}");
                false
            }
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Removes one query parameter from `url`.
///
/// Returns the parameter's value and the rewritten URL, or `None` if the
/// parameter is absent or empty.  The path, fragment, and every other
/// parameter (in order) are preserved; an emptied query is dropped
/// entirely so no dangling `?` remains.
pub fn take_query_param(url: &Url, name: &str) -> Option<(String, Url)> {
    let value = url
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())?;

    let remaining: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != name)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut stripped = url.clone();
    if remaining.is_empty() {
        stripped.set_query(None);
    } else {
        stripped
            .query_pairs_mut()
            .clear()
            .extend_pairs(remaining.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }

    Some((value, stripped))
}

/// First eight characters of a token, for logs.
pub(crate) fn token_prefix(token: &str) -> String {
    let prefix: String = token.chars().take(8).collect();
    format!("{prefix}…")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
