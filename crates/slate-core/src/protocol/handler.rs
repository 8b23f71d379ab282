//! The inbound message handler.
//!
//! [`handle_frame`] maps one raw text frame to a [`Dispatch`]: the state
//! mutations to apply and the effects to execute, in that order.  It never
//! fails and never performs I/O.  Malformed frames are logged and produce
//! an empty dispatch, so a bad frame can never take the connection down.
//!
//! | type               | mutations                                       | effects           |
//! |--------------------|-------------------------------------------------|-------------------|
//! | `WELCOME`          | auth → authenticated                            |                   |
//! | `AUTH_REQUIRED`    | auth → unauthenticated, forget token            |                   |
//! | `AUTH_RESULT`      | store token (success + token only)              |                   |
//! | `BUTTONS_LIST`     | replace buttons                                 |                   |
//! | `PROFILES_LIST`    | replace profiles, default active to first       |                   |
//! | `PROFILE_SWITCHED` | switch active profile                           | request buttons   |
//! | `ACTION_RESULT`    | set last result                                 | clear in 1500 ms  |
//! | `SYSTEM_STATS`     | replace stats                                   |                   |
//! | `PING`             |                                                 | send pong         |
//! | `ERROR`            | (log only)                                      |                   |

use serde_json::Value;
use tracing::{debug, warn};

use super::codec::{decode_frame, decode_value, InboundFrame, ProtocolError};
use super::messages::{ServerMessage, PROTOCOL_VERSION};
use crate::domain::effect::Effect;
use crate::domain::state::{ActiveProfileUpdate, AuthStatus, StateMutation};

/// The outcome of handling one inbound frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dispatch {
    pub mutations: Vec<StateMutation>,
    pub effects: Vec<Effect>,
}

impl Dispatch {
    /// A dispatch that changes nothing.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty() && self.effects.is_empty()
    }

    fn mutate(mut self, mutation: StateMutation) -> Self {
        self.mutations.push(mutation);
        self
    }

    fn effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Handles one raw text frame from the host.
pub fn handle_frame(raw: &str) -> Dispatch {
    from_decoded(decode_frame(raw))
}

/// Handles a frame that has already been parsed as JSON.
pub fn handle_value(value: Value) -> Dispatch {
    from_decoded(decode_value(value))
}

fn from_decoded(decoded: Result<InboundFrame, ProtocolError>) -> Dispatch {
    match decoded {
        Ok(InboundFrame::Server(msg)) => handle_message(msg),
        Ok(InboundFrame::Ignored(message_type)) => {
            debug!("ignoring client-only message type {message_type}");
            Dispatch::none()
        }
        Ok(InboundFrame::Unknown(type_name)) => {
            debug!("ignoring unknown message type {type_name:?}");
            Dispatch::none()
        }
        Err(e) => {
            warn!("dropping malformed frame: {e}");
            Dispatch::none()
        }
    }
}

/// Maps a decoded host message to its mutations and effects.
pub fn handle_message(msg: ServerMessage) -> Dispatch {
    let dispatch = Dispatch::none();

    match msg {
        ServerMessage::Welcome(welcome) => {
            if let Some(version) = welcome.version.as_deref() {
                if version != PROTOCOL_VERSION {
                    warn!("host protocol version {version} differs from ours ({PROTOCOL_VERSION})");
                }
            }
            dispatch.mutate(StateMutation::SetAuth(AuthStatus::Authenticated))
        }

        ServerMessage::AuthRequired => dispatch
            .mutate(StateMutation::SetAuth(AuthStatus::Unauthenticated))
            .mutate(StateMutation::ForgetSessionToken),

        ServerMessage::AuthResult(result) => match result.token {
            Some(token) if result.success && !token.is_empty() => {
                dispatch.mutate(StateMutation::StoreSessionToken(token))
            }
            _ => {
                warn!("host rejected authentication (success={})", result.success);
                dispatch
            }
        },

        ServerMessage::ButtonsList(list) => {
            dispatch.mutate(StateMutation::ReplaceButtons(list.buttons))
        }

        ServerMessage::ProfilesList(list) => {
            let first = list.profiles.first().map(|p| p.id.clone());
            let dispatch = dispatch.mutate(StateMutation::ReplaceProfiles(list.profiles));
            match first {
                Some(id) => dispatch.mutate(StateMutation::UpdateActiveProfile(
                    ActiveProfileUpdate::DefaultTo(id),
                )),
                None => dispatch,
            }
        }

        ServerMessage::ProfileSwitched(switched) => dispatch
            .mutate(StateMutation::UpdateActiveProfile(
                ActiveProfileUpdate::SwitchTo(switched.profile_id),
            ))
            .effect(Effect::RequestButtons),

        ServerMessage::ActionResult(result) => dispatch
            .mutate(StateMutation::SetLastResult(result))
            .effect(Effect::clear_result()),

        ServerMessage::SystemStats(stats) => {
            dispatch.mutate(StateMutation::ReplaceSystemStats(stats))
        }

        ServerMessage::Ping => dispatch.effect(Effect::SendPong),

        ServerMessage::Error(error) => {
            warn!("host reported error: {}", error.message);
            dispatch
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ActionResult, ActionStatus, Profile, SystemStats};
    use serde_json::json;

    fn active_profile_update(dispatch: &Dispatch) -> &ActiveProfileUpdate {
        dispatch
            .mutations
            .iter()
            .find_map(|m| match m {
                StateMutation::UpdateActiveProfile(u) => Some(u),
                _ => None,
            })
            .expect("dispatch must update the active profile")
    }

    #[test]
    fn test_profiles_list_defaults_active_profile_to_first() {
        // Arrange
        let frame = json!({"type": "PROFILES_LIST",
                           "payload": {"profiles": [{"id": "p1", "name": "Main"},
                                                    {"id": "p2", "name": "Games"}]}});

        // Act
        let dispatch = handle_value(frame);
        let update = active_profile_update(&dispatch);

        // Assert
        assert_eq!(update.apply(None), Some("p1".to_string()));
        assert_eq!(update.apply(Some("p9")), Some("p9".to_string()));
        assert!(dispatch.effects.is_empty());
    }

    #[test]
    fn test_profiles_list_replaces_profiles_wholesale() {
        let dispatch = handle_frame(
            r#"{"type":"PROFILES_LIST","payload":{"profiles":[{"id":"p1","name":"Main"}]}}"#,
        );
        assert_eq!(
            dispatch.mutations[0],
            StateMutation::ReplaceProfiles(vec![Profile {
                id: "p1".to_string(),
                name: "Main".to_string()
            }])
        );
    }

    #[test]
    fn test_empty_profiles_list_does_not_touch_active_profile() {
        let dispatch = handle_frame(r#"{"type":"PROFILES_LIST","payload":{"profiles":[]}}"#);
        assert_eq!(dispatch.mutations, vec![StateMutation::ReplaceProfiles(vec![])]);
    }

    #[test]
    fn test_action_result_stores_result_and_schedules_clear() {
        // Arrange
        let frame = json!({"type": "ACTION_RESULT",
                           "payload": {"buttonId": "b1", "status": "success", "message": "Done"}});

        // Act
        let dispatch = handle_value(frame);

        // Assert
        assert_eq!(
            dispatch.mutations,
            vec![StateMutation::SetLastResult(ActionResult {
                button_id: "b1".to_string(),
                status: ActionStatus::Success,
                message: "Done".to_string(),
            })]
        );
        assert_eq!(dispatch.effects, vec![Effect::ClearResult { delay_ms: 1500 }]);
    }

    #[test]
    fn test_ping_yields_only_send_pong() {
        let dispatch = handle_value(json!({"type": "PING", "payload": {}}));
        assert_eq!(dispatch.effects, vec![Effect::SendPong]);
        assert!(dispatch.mutations.is_empty());
    }

    #[test]
    fn test_malformed_inputs_yield_empty_dispatch() {
        assert!(handle_value(Value::Null).is_empty());
        assert!(handle_value(json!("PING")).is_empty());
        assert!(handle_value(json!({"payload": {}})).is_empty());
        assert!(handle_frame("{{{").is_empty());
    }

    #[test]
    fn test_unknown_and_client_only_types_are_ignored() {
        assert!(handle_frame(r#"{"type":"FUTURE_THING","payload":{"x":1}}"#).is_empty());
        assert!(handle_frame(r#"{"type":"GET_BUTTONS","payload":{}}"#).is_empty());
    }

    #[test]
    fn test_welcome_authenticates() {
        let dispatch = handle_frame(r#"{"type":"WELCOME","payload":{"version":"1.0"}}"#);
        assert_eq!(
            dispatch.mutations,
            vec![StateMutation::SetAuth(AuthStatus::Authenticated)]
        );
    }

    #[test]
    fn test_welcome_with_other_version_still_authenticates() {
        let dispatch = handle_frame(r#"{"type":"WELCOME","payload":{"version":"2.3"}}"#);
        assert_eq!(
            dispatch.mutations,
            vec![StateMutation::SetAuth(AuthStatus::Authenticated)]
        );
    }

    #[test]
    fn test_auth_required_unauthenticates_and_forgets_token() {
        let dispatch = handle_frame(r#"{"type":"AUTH_REQUIRED","payload":{}}"#);
        assert_eq!(
            dispatch.mutations,
            vec![
                StateMutation::SetAuth(AuthStatus::Unauthenticated),
                StateMutation::ForgetSessionToken,
            ]
        );
    }

    #[test]
    fn test_auth_result_success_with_token_persists_it() {
        let dispatch =
            handle_frame(r#"{"type":"AUTH_RESULT","payload":{"success":true,"token":"S"}}"#);
        assert_eq!(
            dispatch.mutations,
            vec![StateMutation::StoreSessionToken("S".to_string())]
        );
    }

    #[test]
    fn test_auth_result_rejection_changes_nothing() {
        assert!(handle_frame(r#"{"type":"AUTH_RESULT","payload":{"success":false}}"#).is_empty());
        assert!(
            handle_frame(r#"{"type":"AUTH_RESULT","payload":{"success":true,"token":null}}"#)
                .is_empty()
        );
    }

    #[test]
    fn test_profile_switched_sets_profile_and_requests_buttons() {
        let dispatch =
            handle_frame(r#"{"type":"PROFILE_SWITCHED","payload":{"profileId":"p2"}}"#);
        assert_eq!(
            dispatch.mutations,
            vec![StateMutation::UpdateActiveProfile(ActiveProfileUpdate::SwitchTo(
                "p2".to_string()
            ))]
        );
        assert_eq!(dispatch.effects, vec![Effect::RequestButtons]);
    }

    #[test]
    fn test_buttons_list_replaces_buttons() {
        let dispatch = handle_frame(
            r#"{"type":"BUTTONS_LIST","payload":{"buttons":[
                {"id":"b1","label":"Mute","icon":"mute","actionType":"VOLUME_MUTE"}]}}"#,
        );
        match &dispatch.mutations[..] {
            [StateMutation::ReplaceButtons(buttons)] => assert_eq!(buttons[0].id, "b1"),
            other => panic!("unexpected mutations: {other:?}"),
        }
    }

    #[test]
    fn test_system_stats_with_null_gpu() {
        let dispatch =
            handle_frame(r#"{"type":"SYSTEM_STATS","payload":{"cpu":5.0,"ram":61.2,"gpu":null}}"#);
        assert_eq!(
            dispatch.mutations,
            vec![StateMutation::ReplaceSystemStats(SystemStats {
                cpu: 5.0,
                ram: 61.2,
                gpu: None
            })]
        );
    }

    #[test]
    fn test_error_frame_is_log_only() {
        assert!(handle_frame(r#"{"type":"ERROR","payload":{"message":"Not authenticated"}}"#)
            .is_empty());
    }
}
