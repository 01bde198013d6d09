use super::ActionKind;
use crate::ids::{CorrelationId, RoomId};
use crate::types::{ChannelStatus, Failure, Message, Room};
use serde::{Deserialize, Serialize};

/// Rooms, history and the realtime channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChatAction {
    RoomsLoadRequest {
        correlation: CorrelationId,
    },
    RoomsLoadSuccess {
        correlation: CorrelationId,
        rooms: Vec<Room>,
    },
    RoomsLoadFail {
        correlation: CorrelationId,
        failure: Failure,
    },
    /// Picked up by the realtime bridge and the chat store
    RoomSelect {
        room_id: RoomId,
    },
    HistoryRequest {
        correlation: CorrelationId,
        room_id: RoomId,
    },
    HistorySuccess {
        correlation: CorrelationId,
        room_id: RoomId,
        messages: Vec<Message>,
    },
    HistoryFail {
        correlation: CorrelationId,
        room_id: RoomId,
        failure: Failure,
    },
    /// Outbound text for the selected room
    MessageSend {
        text: String,
    },
    /// Server-pushed message for the selected room
    MessageReceived {
        message: Message,
    },
    ChannelStatusChanged {
        status: ChannelStatus,
    },
}

impl ChatAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::RoomsLoadRequest { .. } => ActionKind::RoomsLoadRequest,
            Self::RoomsLoadSuccess { .. } => ActionKind::RoomsLoadSuccess,
            Self::RoomsLoadFail { .. } => ActionKind::RoomsLoadFail,
            Self::RoomSelect { .. } => ActionKind::RoomSelect,
            Self::HistoryRequest { .. } => ActionKind::ChatHistoryRequest,
            Self::HistorySuccess { .. } => ActionKind::ChatHistorySuccess,
            Self::HistoryFail { .. } => ActionKind::ChatHistoryFail,
            Self::MessageSend { .. } => ActionKind::MessageSend,
            Self::MessageReceived { .. } => ActionKind::MessageReceived,
            Self::ChannelStatusChanged { .. } => ActionKind::ChannelStatusChanged,
        }
    }

    pub fn correlation(&self) -> Option<CorrelationId> {
        match self {
            Self::RoomsLoadRequest { correlation }
            | Self::RoomsLoadSuccess { correlation, .. }
            | Self::RoomsLoadFail { correlation, .. }
            | Self::HistoryRequest { correlation, .. }
            | Self::HistorySuccess { correlation, .. }
            | Self::HistoryFail { correlation, .. } => Some(*correlation),
            Self::RoomSelect { .. }
            | Self::MessageSend { .. }
            | Self::MessageReceived { .. }
            | Self::ChannelStatusChanged { .. } => None,
        }
    }
}
