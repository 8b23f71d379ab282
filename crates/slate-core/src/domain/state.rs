//! The controller's synchronized view of the host, and the mutations that
//! change it.
//!
//! [`AppState`] is a plain value.  It is only ever changed by applying a
//! [`StateMutation`], which is what the inbound handler produces for each
//! frame.  The connection driver owns the state and publishes every change
//! to the rendering layer.
//!
//! # Credential mutations
//!
//! Two mutations, [`StateMutation::StoreSessionToken`] and
//! [`StateMutation::ForgetSessionToken`], target the persisted credential
//! rather than this struct.  [`AppState::apply`] ignores them; the
//! controller's state store routes them to its token store.

use serde::{Deserialize, Serialize};

use super::model::{ActionResult, Button, Profile, SystemStats};

/// Whether the host has accepted this controller's credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStatus {
    /// Handshake sent, no verdict yet.  Reset on every connection attempt.
    #[default]
    Pending,
    Authenticated,
    /// The host rejected (or never received) a credential; the user must
    /// pair again.
    Unauthenticated,
}

/// Transport-level status shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Everything the rendering layer needs to draw the controller.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub connection: ConnectionStatus,
    pub auth: AuthStatus,
    pub buttons: Vec<Button>,
    pub profiles: Vec<Profile>,
    pub active_profile_id: Option<String>,
    pub last_result: Option<ActionResult>,
    pub system_stats: Option<SystemStats>,
}

/// How a message changes the active profile selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveProfileUpdate {
    /// Select this profile only when nothing is selected yet.
    DefaultTo(String),
    /// Select this profile unconditionally (host-confirmed switch).
    SwitchTo(String),
}

impl ActiveProfileUpdate {
    /// Computes the new selector value from the current one.
    pub fn apply(&self, current: Option<&str>) -> Option<String> {
        match (self, current) {
            (ActiveProfileUpdate::DefaultTo(_), Some(existing)) => Some(existing.to_string()),
            (ActiveProfileUpdate::DefaultTo(id), None) => Some(id.clone()),
            (ActiveProfileUpdate::SwitchTo(id), _) => Some(id.clone()),
        }
    }
}

/// One change to the controller's state.
#[derive(Debug, Clone, PartialEq)]
pub enum StateMutation {
    SetAuth(AuthStatus),
    SetConnection(ConnectionStatus),
    ReplaceButtons(Vec<Button>),
    ReplaceProfiles(Vec<Profile>),
    UpdateActiveProfile(ActiveProfileUpdate),
    SetLastResult(ActionResult),
    ClearLastResult,
    ReplaceSystemStats(SystemStats),
    /// Persist a session token issued by the host.
    StoreSessionToken(String),
    /// Drop the persisted session token.
    ForgetSessionToken,
}

impl StateMutation {
    /// Returns `true` for mutations aimed at the credential store.
    pub fn is_credential(&self) -> bool {
        matches!(
            self,
            StateMutation::StoreSessionToken(_) | StateMutation::ForgetSessionToken
        )
    }
}

impl AppState {
    /// Applies a mutation in place and reports whether anything changed.
    ///
    /// Credential mutations are not part of the view and always return
    /// `false` here.
    pub fn apply(&mut self, mutation: &StateMutation) -> bool {
        match mutation {
            StateMutation::SetAuth(status) => replace(&mut self.auth, *status),
            StateMutation::SetConnection(status) => replace(&mut self.connection, *status),
            StateMutation::ReplaceButtons(buttons) => replace(&mut self.buttons, buttons.clone()),
            StateMutation::ReplaceProfiles(profiles) => {
                replace(&mut self.profiles, profiles.clone())
            }
            StateMutation::UpdateActiveProfile(update) => {
                let next = update.apply(self.active_profile_id.as_deref());
                replace(&mut self.active_profile_id, next)
            }
            StateMutation::SetLastResult(result) => {
                replace(&mut self.last_result, Some(result.clone()))
            }
            StateMutation::ClearLastResult => replace(&mut self.last_result, None),
            StateMutation::ReplaceSystemStats(stats) => {
                replace(&mut self.system_stats, Some(*stats))
            }
            StateMutation::StoreSessionToken(_) | StateMutation::ForgetSessionToken => false,
        }
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ActionStatus;

    fn profile(id: &str) -> Profile {
        Profile {
            id: id.to_string(),
            name: format!("Profile {id}"),
        }
    }

    #[test]
    fn test_default_state_is_disconnected_and_pending() {
        let state = AppState::default();
        assert_eq!(state.connection, ConnectionStatus::Disconnected);
        assert_eq!(state.auth, AuthStatus::Pending);
        assert!(state.active_profile_id.is_none());
    }

    #[test]
    fn test_default_to_selects_when_nothing_active() {
        let update = ActiveProfileUpdate::DefaultTo("p1".to_string());
        assert_eq!(update.apply(None), Some("p1".to_string()));
    }

    #[test]
    fn test_default_to_never_overwrites_existing_selection() {
        let update = ActiveProfileUpdate::DefaultTo("p1".to_string());
        assert_eq!(update.apply(Some("p9")), Some("p9".to_string()));
    }

    #[test]
    fn test_switch_to_overwrites_existing_selection() {
        let update = ActiveProfileUpdate::SwitchTo("p2".to_string());
        assert_eq!(update.apply(Some("p9")), Some("p2".to_string()));
    }

    #[test]
    fn test_apply_reports_change_only_when_value_differs() {
        // Arrange
        let mut state = AppState::default();
        let profiles = vec![profile("p1"), profile("p2")];

        // Act
        let first = state.apply(&StateMutation::ReplaceProfiles(profiles.clone()));
        let second = state.apply(&StateMutation::ReplaceProfiles(profiles));

        // Assert
        assert!(first);
        assert!(!second, "identical replacement must not count as a change");
    }

    #[test]
    fn test_clear_last_result() {
        let mut state = AppState::default();
        state.apply(&StateMutation::SetLastResult(ActionResult {
            button_id: "b1".to_string(),
            status: ActionStatus::Success,
            message: "Done".to_string(),
        }));
        assert!(state.last_result.is_some());

        assert!(state.apply(&StateMutation::ClearLastResult));
        assert!(state.last_result.is_none());
    }

    #[test]
    fn test_credential_mutations_leave_view_untouched() {
        let mut state = AppState::default();
        let before = state.clone();
        assert!(!state.apply(&StateMutation::StoreSessionToken("S".to_string())));
        assert!(!state.apply(&StateMutation::ForgetSessionToken));
        assert_eq!(state, before);
        assert!(StateMutation::ForgetSessionToken.is_credential());
        assert!(!StateMutation::ClearLastResult.is_credential());
    }
}
