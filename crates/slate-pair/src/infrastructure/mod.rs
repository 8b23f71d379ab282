//! Infrastructure layer for the pairing panel.
//!
//! - **`host_source`** – `PairingTokenSource` backed by the controller
//!   crate's `HostApi`.
//! - **`panel`** – `PanelService`, the task that keeps exactly one refresh
//!   timer armed while the panel is open.
//! - **`probe`** – `/health` discovery probe.

pub mod host_source;
pub mod panel;
pub mod probe;
