//! Infrastructure layer for the controller.
//!
//! Contains the adapters behind the application-layer traits plus the
//! WebSocket driver.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `slate_core`, but MUST NOT be imported by the `application` layer
//! (tests excepted).
//!
//! # Sub-modules
//!
//! - **`config`** – `ControllerConfig` TOML persistence in the platform
//!   config directory.
//!
//! - **`host_api`** – `reqwest` client for the host's REST endpoints.  It
//!   implements `PairingExchange` for the auth session.
//!
//! - **`location`** – `LaunchUrl`, the controller's visible location bar.
//!
//! - **`network`** – The sync service: owns the single WebSocket, runs the
//!   `ConnectionMachine` directives, feeds frames through the handler, and
//!   executes effects.
//!
//! - **`token_store`** – In-memory and TOML-file `TokenStore` backends.

pub mod config;
pub mod host_api;
pub mod location;
pub mod network;
pub mod token_store;
