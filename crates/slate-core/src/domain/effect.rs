//! Effects: side-effecting work the connection layer performs after an
//! inbound message has been handled.
//!
//! # Why effects are data (for beginners)
//!
//! The inbound handler decides *what* should happen ("reply with a pong",
//! "clear the action result in 1.5 s") but never touches a socket or a timer
//! itself.  It returns [`Effect`] values instead, and the connection driver
//! in `slate-controller` executes them against the live connection.  That
//! keeps the handler a pure function that tests can call with a string and
//! inspect the result of.
//!
//! Effects serialise with a `type` discriminant so they read naturally in
//! logs:
//!
//! ```json
//! {"type":"SEND_PONG"}
//! {"type":"CLEAR_RESULT","delayMs":1500}
//! ```

use std::time::Duration;

use serde::Serialize;

/// How long an `ACTION_RESULT` stays visible before it is cleared.
pub const ACTION_RESULT_CLEAR_DELAY_MS: u64 = 1500;

/// A side effect requested by the inbound handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Effect {
    /// Reply to a host `PING` with a `PONG`.  Skipped if the connection is
    /// no longer open.
    SendPong,
    /// Ask the host for the button list of the (newly) active profile.
    RequestButtons,
    /// Clear the last action result after the given delay.
    ClearResult {
        #[serde(rename = "delayMs")]
        delay_ms: u64,
    },
}

impl Effect {
    /// The standard delayed clear that follows every action result.
    pub fn clear_result() -> Self {
        Effect::ClearResult {
            delay_ms: ACTION_RESULT_CLEAR_DELAY_MS,
        }
    }

    /// Returns the timer duration for [`Effect::ClearResult`], `None` otherwise.
    pub fn delay(&self) -> Option<Duration> {
        match self {
            Effect::ClearResult { delay_ms } => Some(Duration::from_millis(*delay_ms)),
            _ => None,
        }
    }
}
