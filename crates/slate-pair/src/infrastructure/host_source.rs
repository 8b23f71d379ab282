//! `PairingTokenSource` over the host's REST API.

use async_trait::async_trait;
use slate_controller::infrastructure::host_api::HostApi;
use slate_core::protocol::http::{PairingTokenResponse, ServerInfo};

use crate::application::pairing_ticket::{PairError, PairingTokenSource};

#[async_trait]
impl PairingTokenSource for HostApi {
    async fn issue_pairing_token(&self) -> Result<PairingTokenResponse, PairError> {
        HostApi::issue_pairing_token(self)
            .await
            .map_err(|e| PairError::Host(e.to_string()))
    }

    async fn server_info(&self) -> Result<ServerInfo, PairError> {
        HostApi::server_info(self)
            .await
            .map_err(|e| PairError::Host(e.to_string()))
    }
}
