//! Frame encoding and decoding.
//!
//! Outbound frames are plain serde serialisation of [`ClientMessage`].
//! Inbound frames are decoded in two steps so that the three kinds of
//! "not actionable" input stay distinguishable:
//!
//! 1. Parse the text as JSON and require an object with a string `type`.
//!    Anything else is a [`ProtocolError`] (malformed).
//! 2. Look the type up.  Unknown types and client→host types are
//!    well-formed but not for us ([`InboundFrame::Unknown`] /
//!    [`InboundFrame::Ignored`]).  Known host→client types have their
//!    `payload` decoded into the typed struct; a missing or `null` payload
//!    counts as `{}`.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use super::messages::{ClientMessage, Direction, MessageType, ServerMessage};

/// Errors produced while decoding or encoding a frame.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The frame was not valid JSON.
    #[error("frame is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// The frame was JSON but not an object (e.g. `null` or a string).
    #[error("frame is not a JSON object")]
    NotAnObject,

    /// The object had no string `type` field.
    #[error("frame has no string `type` field")]
    MissingType,

    /// A known message type carried a payload of the wrong shape.
    #[error("invalid {message_type} payload: {source}")]
    InvalidPayload {
        message_type: MessageType,
        #[source]
        source: serde_json::Error,
    },

    /// An outbound message could not be serialised.
    #[error("failed to encode {message_type}: {source}")]
    Encode {
        message_type: MessageType,
        #[source]
        source: serde_json::Error,
    },
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// A host→client message this controller acts on.
    Server(ServerMessage),
    /// A known type that only flows client→host; ignored on receipt.
    Ignored(MessageType),
    /// A well-formed frame with a type this build does not know.
    Unknown(String),
}

/// Decodes one text frame.
///
/// # Errors
///
/// Returns [`ProtocolError`] when the frame is not a JSON object with a
/// string `type`, or when a known type carries an undecodable payload.
pub fn decode_frame(raw: &str) -> Result<InboundFrame, ProtocolError> {
    let value: Value = serde_json::from_str(raw).map_err(ProtocolError::InvalidJson)?;
    decode_value(value)
}

/// Decodes an already-parsed JSON value.
///
/// # Errors
///
/// Same as [`decode_frame`], minus [`ProtocolError::InvalidJson`].
pub fn decode_value(value: Value) -> Result<InboundFrame, ProtocolError> {
    let Value::Object(mut object) = value else {
        return Err(ProtocolError::NotAnObject);
    };

    let type_name = match object.get("type") {
        Some(Value::String(s)) => s.clone(),
        _ => return Err(ProtocolError::MissingType),
    };

    let Some(message_type) = MessageType::from_wire(&type_name) else {
        return Ok(InboundFrame::Unknown(type_name));
    };

    if message_type.direction() == Direction::ClientToHost {
        return Ok(InboundFrame::Ignored(message_type));
    }

    let payload = match object.remove("payload") {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(p) => p,
    };

    let message = match message_type {
        MessageType::Welcome => ServerMessage::Welcome(payload_as(message_type, payload)?),
        MessageType::AuthRequired => ServerMessage::AuthRequired,
        MessageType::AuthResult => ServerMessage::AuthResult(payload_as(message_type, payload)?),
        MessageType::ButtonsList => ServerMessage::ButtonsList(payload_as(message_type, payload)?),
        MessageType::ProfilesList => {
            ServerMessage::ProfilesList(payload_as(message_type, payload)?)
        }
        MessageType::ProfileSwitched => {
            ServerMessage::ProfileSwitched(payload_as(message_type, payload)?)
        }
        MessageType::ActionResult => {
            ServerMessage::ActionResult(payload_as(message_type, payload)?)
        }
        MessageType::SystemStats => ServerMessage::SystemStats(payload_as(message_type, payload)?),
        MessageType::Ping => ServerMessage::Ping,
        MessageType::Error => ServerMessage::Error(payload_as(message_type, payload)?),
        // Client→host types returned above.
        MessageType::Hello
        | MessageType::ButtonPressed
        | MessageType::GetButtons
        | MessageType::GetProfiles
        | MessageType::SwitchProfile
        | MessageType::Pong => return Ok(InboundFrame::Ignored(message_type)),
    };

    Ok(InboundFrame::Server(message))
}

/// Encodes an outbound message as a JSON text frame.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if serialisation fails.
pub fn encode_frame(msg: &ClientMessage) -> Result<String, ProtocolError> {
    serde_json::to_string(msg).map_err(|source| ProtocolError::Encode {
        message_type: msg.message_type(),
        source,
    })
}

fn payload_as<T: DeserializeOwned>(
    message_type: MessageType,
    payload: Value,
) -> Result<T, ProtocolError> {
    serde_json::from_value(payload).map_err(|source| ProtocolError::InvalidPayload {
        message_type,
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
