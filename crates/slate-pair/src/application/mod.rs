//! Application layer for the pairing panel.
//!
//! - **`pairing_ticket`** – One issued pairing token, the URL a controller
//!   opens to use it, and when to replace it.  Also declares the
//!   `PairingTokenSource` trait the refresh loop fetches tickets through.

pub mod pairing_ticket;
