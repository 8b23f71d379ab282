//! The pairing panel's refresh loop.
//!
//! [`PanelService`] runs on its own task while the panel is open.  It keeps
//! at most one refresh timer armed:
//!
//! - Opening the panel fetches a ticket immediately.
//! - Every fetch, timed or manual, cancels the pending timer and arms a new
//!   one from the new ticket's TTL.
//! - A failed fetch arms a retry after `retry_delay` instead.
//! - Closing the panel cancels the timer and publishes `None`.
//!
//! The current ticket is published on a `watch` channel; the binary
//! prints each new pairing URL as it arrives.

use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use crate::application::pairing_ticket::{PairError, PairingTicket, PairingTokenSource};

/// Commands accepted by the panel task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelCommand {
    /// Fetch a new ticket now, replacing the pending refresh.
    Refresh,
    /// Cancel the refresh timer and stop.
    Close,
}

/// Cloneable handle to a running [`PanelService`].
#[derive(Debug, Clone)]
pub struct PanelHandle {
    commands: mpsc::Sender<PanelCommand>,
    tickets: watch::Receiver<Option<PairingTicket>>,
}

impl PanelHandle {
    /// Requests an immediate refresh.  Returns `false` if the panel is closed.
    pub async fn refresh(&self) -> bool {
        self.commands.send(PanelCommand::Refresh).await.is_ok()
    }

    /// Closes the panel.  Closing twice is harmless.
    pub async fn close(&self) {
        let _ = self.commands.send(PanelCommand::Close).await;
    }

    /// Observes every new ticket (and `None` once closed).
    pub fn tickets(&self) -> watch::Receiver<Option<PairingTicket>> {
        self.tickets.clone()
    }

    pub fn current(&self) -> Option<PairingTicket> {
        self.tickets.borrow().clone()
    }
}

/// Keeps a fresh pairing ticket available while the panel is open.
pub struct PanelService {
    source: Arc<dyn PairingTokenSource>,
    refresh_margin: Duration,
    retry_delay: Duration,
    refresh_at: Option<Instant>,
    tickets: watch::Sender<Option<PairingTicket>>,
    commands: mpsc::Receiver<PanelCommand>,
}

impl PanelService {
    /// Opens the panel: spawns the task, which fetches the first ticket
    /// right away.
    pub fn spawn(
        source: Arc<dyn PairingTokenSource>,
        refresh_margin: Duration,
        retry_delay: Duration,
    ) -> (PanelHandle, JoinHandle<()>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (ticket_tx, ticket_rx) = watch::channel(None);
        let service = Self {
            source,
            refresh_margin,
            retry_delay,
            refresh_at: None,
            tickets: ticket_tx,
            commands: cmd_rx,
        };
        let task = tokio::spawn(service.run());
        (
            PanelHandle {
                commands: cmd_tx,
                tickets: ticket_rx,
            },
            task,
        )
    }

    async fn run(mut self) {
        info!("pairing panel opened");
        self.refresh().await;

        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(PanelCommand::Refresh) => self.refresh().await,
                    Some(PanelCommand::Close) | None => break,
                },
                () = sleep_until_opt(self.refresh_at) => self.refresh().await,
            }
        }

        self.refresh_at = None;
        self.tickets.send_replace(None);
        info!("pairing panel closed");
    }

    async fn refresh(&mut self) {
        // Cancel first so a failure never leaves the old timer behind.
        self.refresh_at = None;

        match self.fetch().await {
            Ok(ticket) => {
                let delay = ticket.refresh_delay(self.refresh_margin);
                info!(
                    "new pairing URL {} (valid {:?}, refresh in {delay:?})",
                    ticket.pairing_url, ticket.ttl
                );
                self.refresh_at = Some(ticket.refresh_at(self.refresh_margin));
                self.tickets.send_replace(Some(ticket));
            }
            Err(e) => {
                warn!("could not fetch pairing token: {e}; retrying in {:?}", self.retry_delay);
                self.refresh_at = Some(Instant::now() + self.retry_delay);
            }
        }
    }

    async fn fetch(&self) -> Result<PairingTicket, PairError> {
        let info = self.source.server_info().await?;
        let issued = self.source.issue_pairing_token().await?;
        debug!("issued pairing token with ttl {}s", issued.ttl_seconds);
        PairingTicket::new(issued, &info, Instant::now())
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => time::sleep_until(at).await,
        None => pending().await,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::pairing_ticket::MockPairingTokenSource;
    use slate_core::protocol::http::{PairingTokenResponse, ServerInfo};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const MARGIN: Duration = Duration::from_secs(5);
    const RETRY: Duration = Duration::from_secs(5);

    fn server_info() -> ServerInfo {
        ServerInfo {
            ip: "192.168.1.20".to_string(),
            port: 8000,
            client_port: 5173,
        }
    }

    /// A source that issues `t0`, `t1`, ... with a 60 s TTL.
    fn counting_source(calls: Arc<AtomicUsize>) -> MockPairingTokenSource {
        let mut source = MockPairingTokenSource::new();
        source.expect_server_info().returning(|| Ok(server_info()));
        source.expect_issue_pairing_token().returning(move || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            Ok(PairingTokenResponse {
                qr_token: format!("t{n}"),
                ttl_seconds: 60,
            })
        });
        source
    }

    async fn next_token(rx: &mut watch::Receiver<Option<PairingTicket>>) -> Option<String> {
        rx.changed().await.unwrap();
        let token = rx.borrow_and_update().as_ref().map(|t| t.token.clone());
        token
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticket_is_refreshed_margin_before_expiry() {
        // Arrange
        let start = Instant::now();
        let calls = Arc::new(AtomicUsize::new(0));
        let (handle, _task) =
            PanelService::spawn(Arc::new(counting_source(Arc::clone(&calls))), MARGIN, RETRY);
        let mut rx = handle.tickets();

        // Act / Assert – first ticket immediately
        assert_eq!(next_token(&mut rx).await.as_deref(), Some("t0"));
        assert!(start.elapsed() < Duration::from_secs(1));

        // Act / Assert – second ticket at ttl − margin
        assert_eq!(next_token(&mut rx).await.as_deref(), Some("t1"));
        assert_eq!(start.elapsed(), Duration::from_secs(55));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_refresh_replaces_pending_timer() {
        // Arrange
        let start = Instant::now();
        let calls = Arc::new(AtomicUsize::new(0));
        let (handle, _task) =
            PanelService::spawn(Arc::new(counting_source(Arc::clone(&calls))), MARGIN, RETRY);
        let mut rx = handle.tickets();
        assert_eq!(next_token(&mut rx).await.as_deref(), Some("t0"));

        // Act – refresh by hand 30 s in
        time::advance(Duration::from_secs(30)).await;
        assert!(handle.refresh().await);
        assert_eq!(next_token(&mut rx).await.as_deref(), Some("t1"));

        // Assert – the old 55 s timer is gone; the next one is 30 + 55 s
        assert_eq!(next_token(&mut rx).await.as_deref(), Some("t2"));
        assert_eq!(start.elapsed(), Duration::from_secs(85));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_cancels_refresh_and_clears_ticket() {
        // Arrange
        let calls = Arc::new(AtomicUsize::new(0));
        let (handle, task) =
            PanelService::spawn(Arc::new(counting_source(Arc::clone(&calls))), MARGIN, RETRY);
        let mut rx = handle.tickets();
        assert_eq!(next_token(&mut rx).await.as_deref(), Some("t0"));

        // Act
        handle.close().await;
        task.await.unwrap();
        time::advance(Duration::from_secs(120)).await;

        // Assert
        assert_eq!(handle.current(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!handle.refresh().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_is_retried() {
        // Arrange – the host is down for the first attempt
        let start = Instant::now();
        let attempts = Arc::new(AtomicUsize::new(0));
        let mut source = MockPairingTokenSource::new();
        let seen = Arc::clone(&attempts);
        source.expect_server_info().returning(move || {
            if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(PairError::Host("connection refused".to_string()))
            } else {
                Ok(server_info())
            }
        });
        source.expect_issue_pairing_token().returning(|| {
            Ok(PairingTokenResponse {
                qr_token: "late".to_string(),
                ttl_seconds: 60,
            })
        });
        let (handle, _task) = PanelService::spawn(Arc::new(source), MARGIN, RETRY);
        let mut rx = handle.tickets();

        // Act / Assert
        assert_eq!(next_token(&mut rx).await.as_deref(), Some("late"));
        assert_eq!(start.elapsed(), RETRY);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
