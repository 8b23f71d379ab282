//! Network infrastructure: the sync service.
//!
//! Owns the single WebSocket to the host and drives it with the
//! application-layer [`ConnectionMachine`].
//!
//! Architecture:
//! - [`SyncService`] is an actor running on one Tokio task.  It exclusively
//!   owns the socket, the pending open, and both timers (reconnect and
//!   result-clear).  No other component holds a reference to the socket.
//! - [`SyncHandle`] is the cheap, cloneable front door.  Commands go in
//!   over an `mpsc` channel; state comes out over the store's `watch`
//!   channel.
//! - Inbound frames are processed strictly one at a time, in arrival order:
//!   `handle_frame` → `StateStore::apply` → effects.  Mutations from frame
//!   N are published before frame N+1 is read.
//!
//! # The event loop (for beginners)
//!
//! ```text
//!            ┌──────────── tokio::select! ────────────┐
//! commands ──┤ Connect / Close / Suspend / Resume /   │
//!            │ Send / Shutdown                        │
//! opening  ──┤ connect_async finished (ok / error)    ├─▶ ConnectionMachine
//! socket   ──┤ next frame (text / close / error)      │      │ Directives
//! timers   ──┤ reconnect due / clear result due       │      ▼
//!            └────────────────────────────────────────┘   execute()
//! ```
//!
//! A branch whose resource is absent (no socket, no timer armed) waits on a
//! future that never completes, so `select!` simply never picks it.

use std::future::{pending, Future};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use slate_core::protocol::handler::Dispatch;
use slate_core::{
    encode_frame, handle_frame, AppState, AuthStatus, BackoffPolicy, ClientMessage,
    ConnectionStatus, Effect, StateMutation,
};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::application::auth_session::{token_prefix, AuthSession};
use crate::application::connection::{CloseReason, ConnectionMachine, Directive};
use crate::application::state_store::StateStore;

/// The WebSocket type used for the sync channel.
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

type OpenFuture = Pin<Box<dyn Future<Output = Result<WsStream, SyncError>> + Send>>;

/// How long a graceful close may take before the socket is just dropped.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Capacity of the command channel.
const COMMAND_CAPACITY: usize = 64;

/// Errors that can occur in the sync layer.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The WebSocket handshake or an established socket failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] WsError),
    /// Opening the socket took longer than the configured timeout.
    #[error("connection attempt timed out after {0:?}")]
    ConnectTimeout(Duration),
    /// The service task is gone; the handle can no longer issue commands.
    #[error("sync service has stopped")]
    ServiceStopped,
}

/// Configuration for the sync service.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Full WebSocket URL, e.g. `ws://192.168.1.20:8000/ws`.
    pub ws_url: Url,
    /// Reconnect delay curve.
    pub backoff: BackoffPolicy,
    /// Upper bound on a single open attempt.
    pub connect_timeout: Duration,
}

/// Commands accepted by the sync service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    Connect,
    Close(CloseReason),
    /// Foreground lost.
    Suspend,
    /// Foreground regained.
    Resume,
    /// Send a frame if connected; silently skipped otherwise.
    Send(ClientMessage),
    /// Close with [`CloseReason::Unmount`] and stop the task.
    Shutdown,
}

// ── Handle ────────────────────────────────────────────────────────────────────

/// Cloneable front door to a running [`SyncService`].
#[derive(Debug, Clone)]
pub struct SyncHandle {
    commands: mpsc::Sender<ControlCommand>,
    state: watch::Receiver<AppState>,
}

impl SyncHandle {
    pub async fn connect(&self) -> Result<(), SyncError> {
        self.command(ControlCommand::Connect).await
    }

    pub async fn close(&self, reason: CloseReason) -> Result<(), SyncError> {
        self.command(ControlCommand::Close(reason)).await
    }

    pub async fn suspend(&self) -> Result<(), SyncError> {
        self.command(ControlCommand::Suspend).await
    }

    pub async fn resume(&self) -> Result<(), SyncError> {
        self.command(ControlCommand::Resume).await
    }

    pub async fn press_button(&self, button_id: impl Into<String>) -> Result<(), SyncError> {
        self.send(ClientMessage::ButtonPressed {
            button_id: button_id.into(),
        })
        .await
    }

    pub async fn switch_profile(&self, profile_id: impl Into<String>) -> Result<(), SyncError> {
        self.send(ClientMessage::SwitchProfile {
            profile_id: profile_id.into(),
        })
        .await
    }

    pub async fn refresh_buttons(&self) -> Result<(), SyncError> {
        self.send(ClientMessage::GetButtons {}).await
    }

    pub async fn refresh_profiles(&self) -> Result<(), SyncError> {
        self.send(ClientMessage::GetProfiles {}).await
    }

    pub async fn send(&self, msg: ClientMessage) -> Result<(), SyncError> {
        self.command(ControlCommand::Send(msg)).await
    }

    pub async fn shutdown(&self) -> Result<(), SyncError> {
        self.command(ControlCommand::Shutdown).await
    }

    /// A receiver that observes every state change.
    pub fn state(&self) -> watch::Receiver<AppState> {
        self.state.clone()
    }

    /// The current state.
    pub fn snapshot(&self) -> AppState {
        self.state.borrow().clone()
    }

    async fn command(&self, cmd: ControlCommand) -> Result<(), SyncError> {
        self.commands
            .send(cmd)
            .await
            .map_err(|_| SyncError::ServiceStopped)
    }
}

// ── Service ───────────────────────────────────────────────────────────────────

/// The actor that owns the sync connection.
pub struct SyncService {
    config: SyncConfig,
    machine: ConnectionMachine,
    auth: Arc<AuthSession>,
    store: Arc<StateStore>,
    commands: mpsc::Receiver<ControlCommand>,
    socket: Option<WsStream>,
    opening: Option<OpenFuture>,
    reconnect_at: Option<Instant>,
    clear_at: Option<Instant>,
}

impl SyncService {
    /// Spawns the service on the current runtime.
    ///
    /// The service starts Disconnected; call [`SyncHandle::connect`] once
    /// the pairing-token exchange (if any) has finished.
    pub fn spawn(
        config: SyncConfig,
        auth: Arc<AuthSession>,
        store: Arc<StateStore>,
    ) -> (SyncHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
        let handle = SyncHandle {
            commands: tx,
            state: store.subscribe(),
        };
        let service = SyncService {
            machine: ConnectionMachine::new(config.backoff),
            config,
            auth,
            store,
            commands: rx,
            socket: None,
            opening: None,
            reconnect_at: None,
            clear_at: None,
        };
        let task = tokio::spawn(service.run());
        (handle, task)
    }

    async fn run(mut self) {
        info!("sync service started for {}", self.config.ws_url);

        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(ControlCommand::Shutdown) | None => break,
                    Some(cmd) => self.on_command(cmd).await,
                },

                opened = poll_opening(&mut self.opening) => {
                    self.opening = None;
                    self.on_opened(opened).await;
                }

                frame = next_frame(&mut self.socket) => self.on_frame(frame).await,

                () = sleep_until_opt(self.reconnect_at) => {
                    self.reconnect_at = None;
                    let directives = self.machine.reconnect_due();
                    self.execute(directives).await;
                }

                () = sleep_until_opt(self.clear_at) => {
                    self.clear_at = None;
                    self.store.apply_one(StateMutation::ClearLastResult);
                }
            }
        }

        let directives = self.machine.close(CloseReason::Unmount);
        self.execute(directives).await;
        self.clear_at = None;
        info!("sync service stopped");
    }

    async fn on_command(&mut self, cmd: ControlCommand) {
        debug!("command {cmd:?} while {:?}", self.machine.phase());
        let directives = match cmd {
            ControlCommand::Connect => self.machine.connect(),
            ControlCommand::Close(reason) => self.machine.close(reason),
            ControlCommand::Suspend => self.machine.suspend(),
            ControlCommand::Resume => self.machine.resume(),
            ControlCommand::Send(msg) => {
                self.send(msg).await;
                return;
            }
            ControlCommand::Shutdown => return,
        };
        self.execute(directives).await;
    }

    async fn on_opened(&mut self, opened: Result<WsStream, SyncError>) {
        let directives = match opened {
            Ok(ws) => {
                info!("connected to {}", self.config.ws_url);
                self.socket = Some(ws);
                self.machine.on_open()
            }
            Err(e) => {
                warn!("could not connect to {}: {e}", self.config.ws_url);
                self.store
                    .apply_one(StateMutation::SetConnection(ConnectionStatus::Disconnected));
                self.machine.on_open_failed()
            }
        };
        self.execute(directives).await;
    }

    async fn on_frame(&mut self, frame: Option<Result<Message, WsError>>) {
        match frame {
            Some(Ok(Message::Text(text))) => self.on_text(&text).await,
            Some(Ok(Message::Close(close))) => {
                info!("host closed the connection ({close:?})");
                self.flush_close_reply().await;
                self.on_socket_closed(CloseReason::ServerClose).await;
            }
            // Binary, ping, and pong frames carry nothing for us; tungstenite
            // answers pings itself.
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                warn!("connection error: {e}");
                self.on_socket_closed(CloseReason::Error).await;
            }
            None => {
                info!("connection ended");
                self.on_socket_closed(CloseReason::ServerClose).await;
            }
        }
    }

    async fn on_text(&mut self, text: &str) {
        let Dispatch { mutations, effects } = handle_frame(text);
        self.store.apply(&mutations);
        for effect in effects {
            self.run_effect(effect).await;
        }
    }

    async fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::SendPong => self.send(ClientMessage::Pong {}).await,
            Effect::RequestButtons => self.send(ClientMessage::GetButtons {}).await,
            Effect::ClearResult { .. } => {
                // One timer: a newer result re-arms it.
                self.clear_at = effect.delay().map(|d| Instant::now() + d);
            }
        }
    }

    /// tungstenite queues the close reply when it reads a close frame; it
    /// only reaches the host once the sink is flushed.
    async fn flush_close_reply(&mut self) {
        if let Some(ws) = self.socket.as_mut() {
            match time::timeout(CLOSE_GRACE, ws.flush()).await {
                Ok(Ok(())) => debug!("close reply sent"),
                Ok(Err(e)) => debug!("close reply not sent: {e}"),
                Err(_) => debug!("close reply timed out"),
            }
        }
    }

    async fn on_socket_closed(&mut self, observed: CloseReason) {
        self.socket = None;
        self.store
            .apply_one(StateMutation::SetConnection(ConnectionStatus::Disconnected));
        let directives = self.machine.on_closed(observed);
        self.execute(directives).await;
    }

    async fn execute(&mut self, directives: Vec<Directive>) {
        for directive in directives {
            match directive {
                Directive::CancelReconnect => self.reconnect_at = None,
                Directive::Open => self.open(),
                Directive::SendHandshake => self.handshake().await,
                Directive::Close => self.close_socket().await,
                Directive::ArmReconnect(delay) => {
                    info!(
                        "reconnecting in {delay:?} (attempt {})",
                        self.machine.reconnect_attempt()
                    );
                    self.reconnect_at = Some(Instant::now() + delay);
                }
            }
        }
    }

    fn open(&mut self) {
        // A stale handle from an earlier connection is discarded, never reused.
        self.socket = None;
        self.store.apply(&[
            StateMutation::SetConnection(ConnectionStatus::Connecting),
            StateMutation::SetAuth(AuthStatus::Pending),
        ]);

        let url = self.config.ws_url.to_string();
        let timeout = self.config.connect_timeout;
        debug!("opening {url}");
        self.opening = Some(Box::pin(async move {
            match time::timeout(timeout, connect_async(url)).await {
                Ok(Ok((ws, _response))) => Ok(ws),
                Ok(Err(e)) => Err(SyncError::WebSocket(e)),
                Err(_) => Err(SyncError::ConnectTimeout(timeout)),
            }
        }));
    }

    async fn handshake(&mut self) {
        self.store
            .apply_one(StateMutation::SetConnection(ConnectionStatus::Connected));
        let token = self.auth.get_token();
        match token.as_deref() {
            Some(t) => info!("sending HELLO with session token {}", token_prefix(t)),
            None => info!("sending HELLO without a session token"),
        }
        self.send(ClientMessage::hello(token)).await;
    }

    async fn close_socket(&mut self) {
        self.opening = None;
        if let Some(mut ws) = self.socket.take() {
            match time::timeout(CLOSE_GRACE, ws.close(None)).await {
                Ok(Ok(())) => debug!("socket closed"),
                Ok(Err(e)) => debug!("close handshake failed: {e}"),
                Err(_) => debug!("close handshake timed out"),
            }
        }
        self.store
            .apply_one(StateMutation::SetConnection(ConnectionStatus::Disconnected));
        info!("disconnected ({:?})", self.machine.close_reason());
    }

    /// Writes a frame if the connection is open; otherwise skips it.
    async fn send(&mut self, msg: ClientMessage) {
        let message_type = msg.message_type();
        let Some(ws) = self.socket.as_mut().filter(|_| self.machine.is_connected()) else {
            debug!("not connected; skipping {message_type}");
            return;
        };
        let text = match encode_frame(&msg) {
            Ok(text) => text,
            Err(e) => {
                error!("{e}");
                return;
            }
        };
        debug!("sending {message_type}");
        if let Err(e) = ws.send(Message::Text(text)).await {
            // The read side observes the failure and runs the close path.
            warn!("failed to send {message_type}: {e}");
        }
    }
}

// ── select! helpers ───────────────────────────────────────────────────────────

async fn poll_opening(opening: &mut Option<OpenFuture>) -> Result<WsStream, SyncError> {
    match opening {
        Some(fut) => fut.as_mut().await,
        None => pending().await,
    }
}

async fn next_frame(socket: &mut Option<WsStream>) -> Option<Result<Message, WsError>> {
    match socket {
        Some(ws) => ws.next().await,
        None => pending().await,
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
    use crate::application::auth_session::{ExchangeError, LocationBar, PairingExchange, TokenStore};
    use crate::infrastructure::location::LaunchUrl;
    use crate::infrastructure::token_store::MemoryTokenStore;
    use async_trait::async_trait;

    struct NoExchange;

    #[async_trait]
    impl PairingExchange for NoExchange {
        async fn exchange(&self, _pairing_token: &str) -> Result<String, ExchangeError> {
            Err(ExchangeError::Network("offline".to_string()))
        }
    }

    fn spawn_offline() -> (SyncHandle, JoinHandle<()>) {
        let tokens: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::default());
        let location: Arc<dyn LocationBar> =
            Arc::new(LaunchUrl::new(Url::parse("http://127.0.0.1/").unwrap()));
        let auth = Arc::new(AuthSession::new(
            Arc::clone(&tokens),
            Arc::new(NoExchange),
            location,
        ));
        let store = Arc::new(StateStore::new(tokens));
        let config = SyncConfig {
            ws_url: Url::parse("ws://127.0.0.1:1/ws").unwrap(),
            backoff: BackoffPolicy::default(),
            connect_timeout: Duration::from_secs(1),
        };
        SyncService::spawn(config, auth, store)
    }

    #[tokio::test]
    async fn test_service_starts_disconnected() {
        let (handle, _task) = spawn_offline();
        assert_eq!(handle.snapshot().connection, ConnectionStatus::Disconnected);
        assert_eq!(handle.snapshot().auth, AuthStatus::Pending);
    }

    #[tokio::test]
    async fn test_send_while_disconnected_is_skipped_silently() {
        let (handle, _task) = spawn_offline();
        assert!(handle.press_button("b1").await.is_ok());
        assert!(handle.refresh_profiles().await.is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_stops_task_and_handle_reports_stopped() {
        // Arrange
        let (handle, task) = spawn_offline();

        // Act
        handle.shutdown().await.unwrap();
        task.await.unwrap();

        // Assert
        assert!(matches!(
            handle.connect().await,
            Err(SyncError::ServiceStopped)
        ));
    }

    #[tokio::test]
    async fn test_suspend_then_connect_stays_disconnected() {
        let (handle, _task) = spawn_offline();
        let mut rx = handle.state();
        rx.mark_unchanged();

        handle.suspend().await.unwrap();
        handle.connect().await.unwrap();
        time::sleep(Duration::from_millis(50)).await;

        assert!(!rx.has_changed().unwrap());
        assert_eq!(handle.snapshot().connection, ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_unreachable_host_goes_back_to_disconnected() {
        // Arrange
        let (handle, _task) = spawn_offline();
        let mut rx = handle.state();

        // Act
        handle.connect().await.unwrap();

        // Assert – the attempt is published, then the refused open lands
        // back in Disconnected with a reconnect armed
        rx.changed().await.unwrap();
        rx.wait_for(|s| s.connection == ConnectionStatus::Disconnected)
            .await
            .unwrap();
    }
}
