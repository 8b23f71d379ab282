//! HTTP client for the host's REST endpoints.
//!
//! The sync channel is a WebSocket, but a few things happen over plain
//! HTTP:
//!
//! - trading a pairing token for a session token (controller),
//! - issuing a fresh pairing token and discovering the LAN address (pairing
//!   panel),
//! - the `/health` identity probe (discovery tooling).
//!
//! Every request carries the per-request timeout from the config.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;

use slate_core::protocol::http::{
    ExchangeResponse, HealthResponse, PairingTokenResponse, ServerInfo, EXCHANGE_PATH,
    HEALTH_PATH, PAIRING_TOKEN_PARAM, PAIRING_TOKEN_PATH, SERVER_INFO_PATH,
};

use crate::application::auth_session::{ExchangeError, PairingExchange};

/// Errors from a host REST call.
#[derive(Debug, Error)]
pub enum HostApiError {
    /// The configured base URL cannot be joined with an endpoint path.
    #[error("invalid host URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The request failed before a status was received, or the body could
    /// not be decoded.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The host answered with a non-success status.
    #[error("{path} returned HTTP {status}")]
    Status { path: &'static str, status: u16 },
}

/// Thin typed wrapper over the host's HTTP surface.
#[derive(Debug, Clone)]
pub struct HostApi {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl HostApi {
    pub fn new(base_url: Url, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            timeout,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `POST /api/auth/exchange?qrToken=<token>` → session token.
    ///
    /// # Errors
    ///
    /// [`HostApiError::Status`] when the host rejects the token (401 for an
    /// expired, used, or unknown token).
    pub async fn exchange_pairing_token(&self, pairing_token: &str) -> Result<String, HostApiError> {
        let url = self.endpoint(EXCHANGE_PATH)?;
        debug!("POST {EXCHANGE_PATH}");
        let resp = self
            .client
            .post(url)
            .query(&[(PAIRING_TOKEN_PARAM, pairing_token)])
            .timeout(self.timeout)
            .send()
            .await?;
        let body: ExchangeResponse = Self::decode(EXCHANGE_PATH, resp).await?;
        Ok(body.session_token)
    }

    /// `GET /api/auth/qr-token` → a fresh pairing token and its TTL.
    ///
    /// # Errors
    ///
    /// Any [`HostApiError`].
    pub async fn issue_pairing_token(&self) -> Result<PairingTokenResponse, HostApiError> {
        self.get(PAIRING_TOKEN_PATH).await
    }

    /// `GET /api/server-info` → LAN address and ports.
    ///
    /// # Errors
    ///
    /// Any [`HostApiError`].
    pub async fn server_info(&self) -> Result<ServerInfo, HostApiError> {
        self.get(SERVER_INFO_PATH).await
    }

    /// `GET /health` → host identity.
    ///
    /// # Errors
    ///
    /// Any [`HostApiError`].
    pub async fn health(&self) -> Result<HealthResponse, HostApiError> {
        self.get(HEALTH_PATH).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &'static str) -> Result<T, HostApiError> {
        let url = self.endpoint(path)?;
        debug!("GET {path}");
        let resp = self.client.get(url).timeout(self.timeout).send().await?;
        Self::decode(path, resp).await
    }

    async fn decode<T: DeserializeOwned>(
        path: &'static str,
        resp: reqwest::Response,
    ) -> Result<T, HostApiError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(HostApiError::Status {
                path,
                status: status.as_u16(),
            });
        }
        Ok(resp.json::<T>().await?)
    }

    fn endpoint(&self, path: &str) -> Result<Url, HostApiError> {
        Ok(self.base_url.join(path)?)
    }
}

#[async_trait]
impl PairingExchange for HostApi {
    async fn exchange(&self, pairing_token: &str) -> Result<String, ExchangeError> {
        match self.exchange_pairing_token(pairing_token).await {
            Ok(token) => Ok(token),
            Err(HostApiError::Status { status, .. }) => Err(ExchangeError::Rejected { status }),
            Err(HostApiError::Request(e)) if e.is_decode() => {
                Err(ExchangeError::Malformed(e.to_string()))
            }
            Err(e) => Err(ExchangeError::Network(e.to_string())),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
