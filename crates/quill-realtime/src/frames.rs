//! Realtime wire frames
//!
//! Client to server:
//! ```json
//! {"type":"select_room","payload":{"room_id":7}}
//! {"type":"send_message","payload":{"text":"hello"}}
//! ```
//!
//! Server to client:
//! ```json
//! {"type":"message","data":{"id":1,"room_id":7,"user_id":3,"text":"hi"},"ts":1700000000000}
//! ```
//! Any other server `type` is accepted on the wire and ignored by the bridge.

use quill_core::ids::RoomId;
use quill_core::types::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frames the client sends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientFrame {
    SelectRoom { room_id: RoomId },
    SendMessage { text: String },
}

impl ClientFrame {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Envelope of every server frame. `data` stays untyped until the frame
/// type is known.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerFrame {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub ts: Option<u64>,
}

/// Typed reading of a server frame
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A chat message
    Message(Message),
    /// Any other frame type; carries the type name for logging
    Other(String),
}

impl ServerFrame {
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Interpret the frame. A `message` frame whose data does not describe a
    /// message is an error.
    pub fn into_inbound(self) -> Result<Inbound, serde_json::Error> {
        match self.kind.as_str() {
            "message" => {
                let data = self.data.unwrap_or(Value::Null);
                Ok(Inbound::Message(serde_json::from_value(data)?))
            }
            _ => Ok(Inbound::Other(self.kind)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::ids::{MessageId, UserId};

    #[test]
    fn client_frames_use_type_and_payload() {
        let json = ClientFrame::SelectRoom { room_id: RoomId(7) }.encode().unwrap();
        assert_eq!(json, r#"{"type":"select_room","payload":{"room_id":7}}"#);

        let json = ClientFrame::SendMessage { text: "hi".into() }.encode().unwrap();
        assert_eq!(json, r#"{"type":"send_message","payload":{"text":"hi"}}"#);
    }

    #[test]
    fn message_frames_decode_with_defaults() {
        let frame = ServerFrame::decode(
            r#"{"type":"message","data":{"id":1,"room_id":7,"user_id":3,"text":"hi"},"ts":5}"#,
        )
        .unwrap();
        assert_eq!(frame.ts, Some(5));
        let Inbound::Message(message) = frame.into_inbound().unwrap() else {
            panic!("expected a message");
        };
        assert_eq!(message.id, MessageId(1));
        assert_eq!(message.user_id, UserId(3));
        assert_eq!(message.avatar, "");
    }

    #[test]
    fn unknown_frame_types_are_not_errors() {
        let frame = ServerFrame::decode(r#"{"type":"typing","data":{"user_id":3}}"#).unwrap();
        assert_eq!(frame.into_inbound().unwrap(), Inbound::Other("typing".into()));
    }

    #[test]
    fn malformed_message_data_is_an_error() {
        let frame = ServerFrame::decode(r#"{"type":"message","data":{"text":5}}"#).unwrap();
        assert!(frame.into_inbound().is_err());
    }
}
