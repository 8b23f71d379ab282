//! The connection lifecycle as a pure state machine.
//!
//! [`ConnectionMachine`] owns no socket and no timer.  Each input
//! (`connect`, an observed close, a suspend signal, ...) returns the
//! [`Directive`]s the network service must carry out.  This keeps every
//! reconnect decision testable without a runtime.
//!
//! # States (for beginners)
//!
//! ```text
//!                connect()              on_open()
//!  Disconnected ───────────▶ Connecting ─────────▶ Connected
//!       ▲                        │                     │
//!       │   on_open_failed()     │     on_closed(..)   │
//!       └────────────────────────┴─────────────────────┘
//!          + ArmReconnect(delay) unless the close was intentional
//! ```
//!
//! # Close reasons
//!
//! | reason         | set by                        | reconnect? |
//! |----------------|-------------------------------|------------|
//! | `None`         | a clean open                  | yes        |
//! | `Error`        | failed open / socket error    | yes        |
//! | `ServerClose`  | host closed the socket        | yes        |
//! | `Unmount`      | `close(Unmount)`              | no         |
//! | `Background`   | `suspend()`                   | no         |
//!
//! An intentional reason stays in effect until [`ConnectionMachine::resume`]
//! clears it, so a late close event cannot re-arm a timer.

use std::time::Duration;

use slate_core::BackoffPolicy;
use tracing::debug;

/// Where the connection is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Why the last connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloseReason {
    #[default]
    None,
    /// The controller is being torn down.
    Unmount,
    /// The controller lost foreground visibility.
    Background,
    Error,
    ServerClose,
}

impl CloseReason {
    /// Intentional closes suppress reconnection.
    pub fn is_intentional(self) -> bool {
        matches!(self, CloseReason::Unmount | CloseReason::Background)
    }
}

/// An action the network service must perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Cancel any armed reconnect timer.
    CancelReconnect,
    /// Drop any stale socket and start opening a new one.
    Open,
    /// Send the `HELLO` handshake on the freshly opened socket.
    SendHandshake,
    /// Close the current socket (or abandon the pending open).
    Close,
    /// Call [`ConnectionMachine::reconnect_due`] after this delay.
    ArmReconnect(Duration),
}

/// Connection lifecycle state machine.
#[derive(Debug, Clone, Default)]
pub struct ConnectionMachine {
    phase: Phase,
    close_reason: CloseReason,
    reconnect_attempt: u32,
    reconnect_armed: bool,
    backoff: BackoffPolicy,
}

impl ConnectionMachine {
    pub fn new(backoff: BackoffPolicy) -> Self {
        Self {
            backoff,
            ..Default::default()
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn close_reason(&self) -> CloseReason {
        self.close_reason
    }

    pub fn reconnect_attempt(&self) -> u32 {
        self.reconnect_attempt
    }

    pub fn is_reconnect_armed(&self) -> bool {
        self.reconnect_armed
    }

    pub fn is_connected(&self) -> bool {
        self.phase == Phase::Connected
    }

    /// Starts a connection attempt unless one is active or suspended.
    pub fn connect(&mut self) -> Vec<Directive> {
        if self.phase != Phase::Disconnected {
            debug!("connect ignored: already {:?}", self.phase);
            return Vec::new();
        }
        if self.close_reason.is_intentional() {
            debug!("connect ignored: suspended ({:?})", self.close_reason);
            return Vec::new();
        }

        let mut directives = self.cancel_reconnect();
        self.phase = Phase::Connecting;
        directives.push(Directive::Open);
        directives
    }

    /// The socket finished opening.
    pub fn on_open(&mut self) -> Vec<Directive> {
        if self.phase != Phase::Connecting {
            return Vec::new();
        }
        self.phase = Phase::Connected;
        self.reconnect_attempt = 0;
        self.close_reason = CloseReason::None;
        vec![Directive::SendHandshake]
    }

    /// The socket could not be opened.
    pub fn on_open_failed(&mut self) -> Vec<Directive> {
        self.on_closed(CloseReason::Error)
    }

    /// The socket closed without us asking (or after we asked).
    ///
    /// `observed` is only recorded if no reason was set yet, so an
    /// intentional close is never overwritten by the close event it causes.
    pub fn on_closed(&mut self, observed: CloseReason) -> Vec<Directive> {
        if self.phase == Phase::Disconnected {
            return Vec::new();
        }
        if self.close_reason == CloseReason::None {
            self.close_reason = observed;
        }
        self.phase = Phase::Disconnected;
        self.schedule_reconnect()
    }

    /// Closes the connection and records why.
    pub fn close(&mut self, reason: CloseReason) -> Vec<Directive> {
        self.close_reason = reason;
        let mut directives = self.cancel_reconnect();
        if self.phase != Phase::Disconnected {
            self.phase = Phase::Disconnected;
            directives.push(Directive::Close);
        }
        directives.extend(self.schedule_reconnect());
        directives
    }

    /// Foreground lost.
    pub fn suspend(&mut self) -> Vec<Directive> {
        self.close(CloseReason::Background)
    }

    /// Foreground regained: forget the suspension and the backoff history.
    pub fn resume(&mut self) -> Vec<Directive> {
        self.close_reason = CloseReason::None;
        self.reconnect_attempt = 0;
        self.connect()
    }

    /// The armed reconnect timer fired.
    pub fn reconnect_due(&mut self) -> Vec<Directive> {
        if !self.reconnect_armed {
            return Vec::new();
        }
        self.reconnect_armed = false;
        self.connect()
    }

    fn cancel_reconnect(&mut self) -> Vec<Directive> {
        if self.reconnect_armed {
            self.reconnect_armed = false;
            vec![Directive::CancelReconnect]
        } else {
            Vec::new()
        }
    }

    fn schedule_reconnect(&mut self) -> Vec<Directive> {
        if self.close_reason.is_intentional() {
            return Vec::new();
        }
        let delay = self.backoff.delay(self.reconnect_attempt);
        self.reconnect_attempt = self.reconnect_attempt.saturating_add(1);
        self.reconnect_armed = true;
        vec![Directive::ArmReconnect(delay)]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn connected() -> ConnectionMachine {
        let mut m = ConnectionMachine::default();
        m.connect();
        m.on_open();
        m
    }

    #[test]
    fn test_connect_from_disconnected_opens() {
        // Arrange
        let mut m = ConnectionMachine::default();

        // Act
        let directives = m.connect();

        // Assert
        assert_eq!(directives, vec![Directive::Open]);
        assert_eq!(m.phase(), Phase::Connecting);
    }

    #[test]
    fn test_connect_is_ignored_while_connecting_or_connected() {
        let mut m = ConnectionMachine::default();
        m.connect();
        assert!(m.connect().is_empty());

        m.on_open();
        assert!(m.connect().is_empty());
        assert_eq!(m.phase(), Phase::Connected);
    }

    #[test]
    fn test_open_sends_handshake_and_resets_backoff() {
        // Arrange – fail twice so the attempt counter is non-zero
        let mut m = ConnectionMachine::default();
        m.connect();
        m.on_open_failed();
        m.reconnect_due();
        m.on_open_failed();
        assert_eq!(m.reconnect_attempt(), 2);

        // Act
        m.reconnect_due();
        let directives = m.on_open();

        // Assert
        assert_eq!(directives, vec![Directive::SendHandshake]);
        assert_eq!(m.reconnect_attempt(), 0);
        assert_eq!(m.close_reason(), CloseReason::None);
    }

    #[test]
    fn test_server_close_schedules_backoff_sequence() {
        let mut m = connected();

        assert_eq!(
            m.on_closed(CloseReason::ServerClose),
            vec![Directive::ArmReconnect(ms(1000))]
        );
        assert_eq!(m.reconnect_due(), vec![Directive::Open]);
        assert_eq!(
            m.on_open_failed(),
            vec![Directive::ArmReconnect(ms(2000))]
        );
        m.reconnect_due();
        assert_eq!(
            m.on_open_failed(),
            vec![Directive::ArmReconnect(ms(4000))]
        );
        assert_eq!(m.reconnect_attempt(), 3);
    }

    #[test]
    fn test_unmount_never_arms_reconnect() {
        // Arrange
        let mut m = connected();

        // Act
        let directives = m.close(CloseReason::Unmount);
        let late_close = m.on_closed(CloseReason::ServerClose);

        // Assert
        assert_eq!(directives, vec![Directive::Close]);
        assert!(late_close.is_empty());
        assert!(!m.is_reconnect_armed());
        assert!(m.connect().is_empty(), "unmount suppresses connect");
    }

    #[test]
    fn test_background_cancels_armed_reconnect() {
        // Arrange – a reconnect is pending
        let mut m = connected();
        m.on_closed(CloseReason::Error);
        assert!(m.is_reconnect_armed());

        // Act
        let directives = m.suspend();

        // Assert – the timer is cancelled and firing it later does nothing
        assert_eq!(directives, vec![Directive::CancelReconnect]);
        assert!(m.reconnect_due().is_empty());
        assert_eq!(m.phase(), Phase::Disconnected);
    }

    #[test]
    fn test_resume_resets_and_reconnects() {
        let mut m = connected();
        m.on_closed(CloseReason::Error);
        m.reconnect_due();
        m.on_open_failed();
        m.suspend();

        let directives = m.resume();

        assert_eq!(directives, vec![Directive::Open]);
        assert_eq!(m.reconnect_attempt(), 0);
        assert_eq!(m.close_reason(), CloseReason::None);
    }

    #[test]
    fn test_resume_while_connected_is_noop() {
        let mut m = connected();
        assert!(m.resume().is_empty());
        assert!(m.is_connected());
    }

    #[test]
    fn test_close_with_error_reason_reconnects() {
        let mut m = connected();
        let directives = m.close(CloseReason::Error);
        assert_eq!(
            directives,
            vec![Directive::Close, Directive::ArmReconnect(ms(1000))]
        );
    }

    #[test]
    fn test_close_while_connecting_abandons_open() {
        let mut m = ConnectionMachine::default();
        m.connect();

        let directives = m.close(CloseReason::Unmount);

        assert_eq!(directives, vec![Directive::Close]);
        assert!(m.on_open().is_empty(), "a late open must not reconnect");
    }

    #[test]
    fn test_connect_cancels_armed_timer() {
        let mut m = connected();
        m.on_closed(CloseReason::ServerClose);

        let directives = m.connect();

        assert_eq!(directives, vec![Directive::CancelReconnect, Directive::Open]);
        assert!(m.reconnect_due().is_empty());
    }

    #[test]
    fn test_backoff_caps_at_max() {
        let mut m = ConnectionMachine::default();
        m.connect();
        let mut last = Duration::ZERO;
        for _ in 0..12 {
            let directives = m.on_open_failed();
            match directives.as_slice() {
                [Directive::ArmReconnect(d)] => {
                    assert!(*d >= last);
                    last = *d;
                }
                other => panic!("unexpected directives: {other:?}"),
            }
            m.reconnect_due();
        }
        assert_eq!(last, ms(30_000));
    }
}
