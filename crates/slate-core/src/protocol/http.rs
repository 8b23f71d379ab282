//! JSON bodies and paths of the host's HTTP surface.
//!
//! The sync channel itself is a WebSocket, but pairing and discovery go
//! through a handful of REST endpoints:
//!
//! | method | path                                  | response            |
//! |--------|---------------------------------------|---------------------|
//! | POST   | `/api/auth/exchange?qrToken=<token>`  | [`ExchangeResponse`]|
//! | GET    | `/api/auth/qr-token`                  | [`PairingTokenResponse`] |
//! | GET    | `/api/server-info`                    | [`ServerInfo`]      |
//! | GET    | `/health`                             | [`HealthResponse`]  |

use serde::{Deserialize, Serialize};

/// Query parameter that carries a pairing token, both on the exchange
/// endpoint and on the controller's launch URL.
pub const PAIRING_TOKEN_PARAM: &str = "qrToken";

pub const EXCHANGE_PATH: &str = "/api/auth/exchange";
pub const PAIRING_TOKEN_PATH: &str = "/api/auth/qr-token";
pub const SERVER_INFO_PATH: &str = "/api/server-info";
pub const HEALTH_PATH: &str = "/health";
/// Path of the WebSocket sync endpoint.
pub const WS_PATH: &str = "/ws";

/// Successful pairing-token exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeResponse {
    pub session_token: String,
}

/// A freshly issued pairing token and how long it stays valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingTokenResponse {
    pub qr_token: String,
    pub ttl_seconds: u64,
}

/// Where a controller can reach the host on the LAN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub ip: String,
    /// Port of the API and WebSocket server.
    pub port: u16,
    /// Port that serves the controller web app.
    pub client_port: u16,
}

/// Host identity returned by the health probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub app: String,
    pub owner: String,
    pub env: String,
    pub pid: u32,
}

impl HealthResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}
