//! # slate-core
//!
//! Shared library for the Slate remote-control surface.  It contains the
//! JSON wire protocol spoken between a controller and its host, the pure
//! inbound message handler, and the domain types that make up the
//! controller's synchronized view.
//!
//! This crate has zero dependencies on sockets, timers, or storage.
//!
//! # Architecture overview (for beginners)
//!
//! Slate turns a phone or tablet (the *controller*) into a grid of buttons
//! that trigger actions on a desktop machine (the *host*).  The controller
//! keeps one WebSocket open to the host and mirrors what the host tells it:
//! which profiles exist, which buttons belong to the active profile, what
//! happened when a button was pressed, and live CPU/RAM/GPU numbers.
//!
//! - **`protocol`** – How frames look on the wire (`{"type": ..., "payload": ...}`),
//!   how they are decoded into typed messages, and how each inbound message
//!   turns into state mutations plus *effects* the connection layer performs.
//!
//! - **`domain`** – Plain data: buttons, profiles, the application state
//!   store, the effect values, and the reconnect backoff policy.
//!
//! Nothing in here executes an effect.  The handler only *describes* what
//! should happen; `slate-controller` owns the socket and the timers.

pub mod domain;
pub mod protocol;

pub use domain::backoff::BackoffPolicy;
pub use domain::effect::Effect;
pub use domain::state::{AppState, AuthStatus, ConnectionStatus, StateMutation};
pub use protocol::codec::{decode_frame, encode_frame, ProtocolError};
pub use protocol::handler::{handle_frame, Dispatch};
pub use protocol::messages::{ClientMessage, ServerMessage, PROTOCOL_VERSION};
