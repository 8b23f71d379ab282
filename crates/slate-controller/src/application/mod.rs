//! Application layer for the controller.
//!
//! # What use cases does the controller have?
//!
//! - **`auth_session`** – Resolves the credential for the handshake.  Reads
//!   and writes the persisted session token, and exchanges a pairing token
//!   from the launch URL for a session token.  Storage, HTTP, and the
//!   visible URL are injected as traits.
//!
//! - **`connection`** – The connection lifecycle as a pure state machine.
//!   It decides *when* to open, close, send the handshake, or arm a
//!   reconnect timer; the network service in `infrastructure` carries the
//!   decisions out.
//!
//! - **`state_store`** – Owns the [`slate_core::AppState`] and publishes
//!   every change to subscribers.  Credential mutations are routed to the
//!   token store instead of the view.

pub mod auth_session;
pub mod connection;
pub mod state_store;
