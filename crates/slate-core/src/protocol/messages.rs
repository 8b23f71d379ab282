//! Message types for the controller ↔ host WebSocket protocol.
//!
//! # Frame envelope
//!
//! Every frame is a JSON text message with a `type` discriminant and a
//! `payload` object:
//!
//! ```json
//! {"type":"HELLO","payload":{"version":"1.0","token":"3f9c..."}}
//! {"type":"BUTTONS_LIST","payload":{"buttons":[...]}}
//! {"type":"PING","payload":{}}
//! ```
//!
//! # Why two message enums?
//!
//! The direction of each type is fixed.  [`ClientMessage`] holds the frames
//! a controller may send, [`ServerMessage`] the frames it reacts to.  A
//! controller that receives a client→host type (for example an echoed
//! `PONG`) treats it as well-formed but ignores it.

use serde::{Deserialize, Serialize};

use crate::domain::model::{ActionResult, Button, Profile, SystemStats};

/// Protocol version carried in `HELLO` and expected in `WELCOME`.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Which side of the connection originates a message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ClientToHost,
    HostToClient,
}

/// Every message type in the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    // Handshake
    Hello,
    Welcome,
    // Authentication
    AuthRequired,
    AuthResult,
    // Buttons and actions
    ButtonPressed,
    GetButtons,
    ButtonsList,
    ActionResult,
    Error,
    // Profiles
    GetProfiles,
    ProfilesList,
    SwitchProfile,
    ProfileSwitched,
    // Heartbeat
    Ping,
    Pong,
    // Monitoring
    SystemStats,
}

impl MessageType {
    /// All known types, in protocol order.
    pub const ALL: [MessageType; 16] = [
        MessageType::Hello,
        MessageType::Welcome,
        MessageType::AuthRequired,
        MessageType::AuthResult,
        MessageType::ButtonPressed,
        MessageType::GetButtons,
        MessageType::ButtonsList,
        MessageType::ActionResult,
        MessageType::Error,
        MessageType::GetProfiles,
        MessageType::ProfilesList,
        MessageType::SwitchProfile,
        MessageType::ProfileSwitched,
        MessageType::Ping,
        MessageType::Pong,
        MessageType::SystemStats,
    ];

    /// The `type` string used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::Hello => "HELLO",
            MessageType::Welcome => "WELCOME",
            MessageType::AuthRequired => "AUTH_REQUIRED",
            MessageType::AuthResult => "AUTH_RESULT",
            MessageType::ButtonPressed => "BUTTON_PRESSED",
            MessageType::GetButtons => "GET_BUTTONS",
            MessageType::ButtonsList => "BUTTONS_LIST",
            MessageType::ActionResult => "ACTION_RESULT",
            MessageType::Error => "ERROR",
            MessageType::GetProfiles => "GET_PROFILES",
            MessageType::ProfilesList => "PROFILES_LIST",
            MessageType::SwitchProfile => "SWITCH_PROFILE",
            MessageType::ProfileSwitched => "PROFILE_SWITCHED",
            MessageType::Ping => "PING",
            MessageType::Pong => "PONG",
            MessageType::SystemStats => "SYSTEM_STATS",
        }
    }

    /// Looks up a wire `type` string.  Returns `None` for types this build
    /// does not know.
    pub fn from_wire(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }

    /// Which side sends this type.
    pub fn direction(self) -> Direction {
        match self {
            MessageType::Hello
            | MessageType::ButtonPressed
            | MessageType::GetButtons
            | MessageType::GetProfiles
            | MessageType::SwitchProfile
            | MessageType::Pong => Direction::ClientToHost,
            _ => Direction::HostToClient,
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Controller → Host ─────────────────────────────────────────────────────────

/// Frames the controller sends.
///
/// Serde's adjacent tagging produces the `{"type":..., "payload":...}`
/// envelope directly.  Payload-less messages are empty struct variants so
/// they still carry `"payload":{}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// Handshake: first frame after the connection opens.
    Hello {
        version: String,
        token: Option<String>,
    },
    /// Ask the host to run a button's action.
    ButtonPressed {
        #[serde(rename = "buttonId")]
        button_id: String,
    },
    GetButtons {},
    GetProfiles {},
    SwitchProfile {
        #[serde(rename = "profileId")]
        profile_id: String,
    },
    Pong {},
}

impl ClientMessage {
    /// Builds the handshake for the current protocol version.
    pub fn hello(token: Option<String>) -> Self {
        ClientMessage::Hello {
            version: PROTOCOL_VERSION.to_string(),
            token,
        }
    }

    pub fn message_type(&self) -> MessageType {
        match self {
            ClientMessage::Hello { .. } => MessageType::Hello,
            ClientMessage::ButtonPressed { .. } => MessageType::ButtonPressed,
            ClientMessage::GetButtons {} => MessageType::GetButtons,
            ClientMessage::GetProfiles {} => MessageType::GetProfiles,
            ClientMessage::SwitchProfile { .. } => MessageType::SwitchProfile,
            ClientMessage::Pong {} => MessageType::Pong,
        }
    }
}

// ── Host → Controller ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WelcomePayload {
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResultPayload {
    pub success: bool,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonsListPayload {
    pub buttons: Vec<Button>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilesListPayload {
    pub profiles: Vec<Profile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSwitchedPayload {
    pub profile_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErrorPayload {
    #[serde(default)]
    pub message: String,
}

/// Frames the controller reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    Welcome(WelcomePayload),
    AuthRequired,
    AuthResult(AuthResultPayload),
    ButtonsList(ButtonsListPayload),
    ProfilesList(ProfilesListPayload),
    ProfileSwitched(ProfileSwitchedPayload),
    ActionResult(ActionResult),
    SystemStats(SystemStats),
    Ping,
    Error(ErrorPayload),
}

impl ServerMessage {
    pub fn message_type(&self) -> MessageType {
        match self {
            ServerMessage::Welcome(_) => MessageType::Welcome,
            ServerMessage::AuthRequired => MessageType::AuthRequired,
            ServerMessage::AuthResult(_) => MessageType::AuthResult,
            ServerMessage::ButtonsList(_) => MessageType::ButtonsList,
            ServerMessage::ProfilesList(_) => MessageType::ProfilesList,
            ServerMessage::ProfileSwitched(_) => MessageType::ProfileSwitched,
            ServerMessage::ActionResult(_) => MessageType::ActionResult,
            ServerMessage::SystemStats(_) => MessageType::SystemStats,
            ServerMessage::Ping => MessageType::Ping,
            ServerMessage::Error(_) => MessageType::Error,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hello_serializes_version_and_null_token() {
        // Arrange
        let msg = ClientMessage::hello(None);

        // Act
        let value = serde_json::to_value(&msg).unwrap();

        // Assert
        assert_eq!(
            value,
            json!({"type": "HELLO", "payload": {"version": "1.0", "token": null}})
        );
    }

    #[test]
    fn test_pong_carries_empty_payload_object() {
        let value = serde_json::to_value(ClientMessage::Pong {}).unwrap();
        assert_eq!(value, json!({"type": "PONG", "payload": {}}));
    }

    #[test]
    fn test_switch_profile_uses_camel_case_field() {
        let msg = ClientMessage::SwitchProfile {
            profile_id: "p2".to_string(),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({"type": "SWITCH_PROFILE", "payload": {"profileId": "p2"}})
        );
    }

    #[test]
    fn test_button_pressed_uses_camel_case_field() {
        let msg = ClientMessage::ButtonPressed {
            button_id: "b7".to_string(),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["payload"]["buttonId"], "b7");
    }

    #[test]
    fn test_from_wire_knows_every_type() {
        for t in MessageType::ALL {
            assert_eq!(MessageType::from_wire(t.as_str()), Some(t));
        }
        assert_eq!(MessageType::from_wire("TELEPORT"), None);
    }

    #[test]
    fn test_as_str_matches_serde_name() {
        for t in MessageType::ALL {
            let serde_name = serde_json::to_value(t).unwrap();
            assert_eq!(serde_name, json!(t.as_str()));
        }
    }

    #[test]
    fn test_directions() {
        assert_eq!(MessageType::Hello.direction(), Direction::ClientToHost);
        assert_eq!(MessageType::Pong.direction(), Direction::ClientToHost);
        assert_eq!(MessageType::Ping.direction(), Direction::HostToClient);
        assert_eq!(MessageType::ProfileSwitched.direction(), Direction::HostToClient);
    }

    #[test]
    fn test_client_message_type_names() {
        assert_eq!(ClientMessage::GetButtons {}.message_type(), MessageType::GetButtons);
        assert_eq!(ClientMessage::hello(None).message_type(), MessageType::Hello);
    }
}
