//! slate-controller library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does slate-controller do? (for beginners)
//!
//! The *controller* is the touch-panel side of Slate.  It holds a WebSocket
//! open to the *host* (the desktop that actually executes actions) and keeps
//! a live copy of the host's buttons, profiles, and system statistics.
//!
//! The controller:
//!
//! 1. Trades a one-time pairing token from its launch URL for a long-lived
//!    session token (`AuthSession`).
//! 2. Opens the WebSocket, sends `HELLO` with the session token, and
//!    reconnects with exponential backoff when the link drops
//!    (`ConnectionMachine` + the network service).
//! 3. Decodes every host frame with `slate_core::handle_frame` and applies
//!    the resulting mutations to its state (`StateStore`).
//! 4. Sends `BUTTON_PRESSED`, `SWITCH_PROFILE`, and list requests on behalf
//!    of the user.

/// Application layer: auth session, connection state machine, state store.
pub mod application;

/// Infrastructure layer: WebSocket driver, HTTP client, token storage, config.
pub mod infrastructure;
