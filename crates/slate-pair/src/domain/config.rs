//! Pairing panel configuration.
//!
//! [`PairConfig`] is built once in `main.rs` from CLI arguments and handed to
//! the infrastructure layer.  Nothing in here reads the environment.

use std::time::Duration;

use url::Url;

/// Runtime settings for the pairing panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairConfig {
    /// Base URL of the host's API server.
    pub host: Url,
    /// How long before a pairing token expires the panel fetches the next.
    pub refresh_margin: Duration,
    /// Per-request timeout for host REST calls.
    pub request_timeout: Duration,
    /// Wait after a failed fetch before trying again.
    pub retry_delay: Duration,
}

impl Default for PairConfig {
    /// | Field            | Default                  |
    /// |------------------|--------------------------|
    /// | host             | `http://127.0.0.1:8000/` |
    /// | refresh_margin   | 5 seconds                |
    /// | request_timeout  | 10 seconds               |
    /// | retry_delay      | 5 seconds                |
    fn default() -> Self {
        Self {
            // Compile-time-constant URL; parsing cannot fail.
            host: Url::parse("http://127.0.0.1:8000/").expect("valid default host URL"),
            refresh_margin: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            retry_delay: Duration::from_secs(5),
        }
    }
}
