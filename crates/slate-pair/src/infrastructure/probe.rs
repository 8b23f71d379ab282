//! Host discovery probe.
//!
//! `GET /health` answers with the host's identity:
//!
//! ```json
//! {"status":"ok","app":"slate-server","owner":"standalone","env":"dev","pid":4242}
//! ```
//!
//! Discovery tooling uses it to tell a running Slate host apart from some
//! other service on the same port, and to see which instance answered.

use std::fmt;

use slate_controller::infrastructure::host_api::HostApi;
use slate_core::protocol::http::HealthResponse;
use tracing::debug;
use url::Url;

/// What the probe found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// `status == "ok"`.
    Healthy(HealthResponse),
    /// The host answered but reported a status other than `ok`.
    Degraded(HealthResponse),
    /// No usable answer.
    Unreachable(String),
}

/// Result of probing one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub base_url: Url,
    pub outcome: ProbeOutcome,
}

impl ProbeReport {
    pub fn is_healthy(&self) -> bool {
        matches!(self.outcome, ProbeOutcome::Healthy(_))
    }
}

impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            ProbeOutcome::Healthy(h) => write!(
                f,
                "{} is up: {} (owner {}, env {}, pid {})",
                self.base_url, h.app, h.owner, h.env, h.pid
            ),
            ProbeOutcome::Degraded(h) => write!(
                f,
                "{} answered with status {:?}: {} (owner {}, env {}, pid {})",
                self.base_url, h.status, h.app, h.owner, h.env, h.pid
            ),
            ProbeOutcome::Unreachable(reason) => {
                write!(f, "{} is unreachable: {reason}", self.base_url)
            }
        }
    }
}

/// Probes the host behind `api`.
pub async fn probe(api: &HostApi) -> ProbeReport {
    let outcome = match api.health().await {
        Ok(health) if health.is_ok() => ProbeOutcome::Healthy(health),
        Ok(health) => ProbeOutcome::Degraded(health),
        Err(e) => {
            debug!("health probe failed: {e}");
            ProbeOutcome::Unreachable(e.to_string())
        }
    };
    ProbeReport {
        base_url: api.base_url().clone(),
        outcome,
    }
}
