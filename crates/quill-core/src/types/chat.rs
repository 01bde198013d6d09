use crate::ids::{MessageId, RoomId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chat room
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
}

/// Chat message, identical to the realtime wire shape
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub room_id: RoomId,
    pub user_id: UserId,
    #[serde(default)]
    pub avatar: String,
    pub text: String,
    #[serde(default)]
    pub created_at: String,
}

/// Connection state of the realtime channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    /// Never connected, or shut down on purpose
    #[default]
    Disconnected,
    /// A connection attempt is in progress
    Connecting,
    /// Frames can flow in both directions
    Open,
    /// Closed unexpectedly; a reconnect is scheduled
    Closed,
}

impl fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        };
        f.write_str(label)
    }
}
