//! Domain types shared by the controller and the pairing panel.
//!
//! Everything here is plain data with no I/O, so it can be constructed and
//! inspected freely in tests.

pub mod backoff;
pub mod effect;
pub mod model;
pub mod state;

pub use backoff::BackoffPolicy;
pub use effect::Effect;
pub use model::{ActionResult, ActionStatus, ActionType, Button, Profile, SystemStats};
pub use state::{ActiveProfileUpdate, AppState, AuthStatus, ConnectionStatus, StateMutation};
