//! slate-pair library entry point.
//!
//! # What does slate-pair do? (for beginners)
//!
//! Before a controller can talk to a host it needs a session token, and the
//! only way to get one is to present a *pairing token* the host issued
//! moments earlier.  `slate-pair` is the panel that shows that token:
//!
//! 1. It asks the host for a fresh pairing token (`GET /api/auth/qr-token`)
//!    and for the host's LAN address (`GET /api/server-info`).
//! 2. It combines them into the URL a controller opens:
//!    `http://{ip}:{clientPort}/?qrToken={token}`.
//! 3. Pairing tokens expire (60 s by default), so it fetches a new one a few
//!    seconds before the old one runs out, for as long as the panel is open.
//!
//! It also offers `--probe`, which hits `/health` to tell whether a host is
//! reachable and which instance answered.
//!
//! # Layers
//!
//! - **`domain`** – `PairConfig`.
//! - **`application`** – `PairingTicket` arithmetic and the
//!   `PairingTokenSource` seam.
//! - **`infrastructure`** – the refresh loop (`PanelService`), the `HostApi`
//!   adapter, and the health probe.

pub mod application;
pub mod domain;
pub mod infrastructure;
