//! Wire protocol for the controller ↔ host sync channel.

pub mod codec;
pub mod handler;
pub mod http;
pub mod messages;

pub use codec::{decode_frame, encode_frame, InboundFrame, ProtocolError};
pub use messages::{ClientMessage, MessageType, ServerMessage, PROTOCOL_VERSION};
