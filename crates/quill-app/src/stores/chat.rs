//! Rooms, the selected room's messages and channel status.

use super::{awaited, route};
use indexmap::IndexMap;
use quill_core::action::{Action, ActionKind};
use quill_core::bus::ActionBus;
use quill_core::ids::{CorrelationId, MessageId, RoomId};
use quill_core::reactive::Store;
use quill_core::types::{ChannelStatus, Message, Room};
use quill_core::ChatAction;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChatState {
    pub rooms: Vec<Room>,
    pub rooms_loading: Option<CorrelationId>,
    pub selected: Option<RoomId>,
    /// Messages of the selected room, one entry per id
    pub messages: IndexMap<MessageId, Message>,
    pub history_loading: Option<CorrelationId>,
    pub status: ChannelStatus,
    pub error: Option<String>,
}

impl ChatState {
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.values()
    }

    pub fn selected_room(&self) -> Option<&Room> {
        let id = self.selected?;
        self.rooms.iter().find(|room| room.id == id)
    }
}

const KINDS: &[ActionKind] = &[
    ActionKind::RoomsLoadRequest,
    ActionKind::RoomsLoadSuccess,
    ActionKind::RoomsLoadFail,
    ActionKind::RoomSelect,
    ActionKind::ChatHistoryRequest,
    ActionKind::ChatHistorySuccess,
    ActionKind::ChatHistoryFail,
    ActionKind::MessageReceived,
    ActionKind::ChannelStatusChanged,
];

fn reduce(state: &ChatState, action: &Action) -> Option<ChatState> {
    let Action::Chat(action) = action else {
        return None;
    };
    match action {
        ChatAction::RoomsLoadRequest { correlation } => Some(ChatState {
            rooms_loading: Some(*correlation),
            error: None,
            ..state.clone()
        }),
        ChatAction::RoomsLoadSuccess { correlation, rooms } => {
            awaited(state.rooms_loading, *correlation).then(|| ChatState {
                rooms: rooms.clone(),
                rooms_loading: None,
                ..state.clone()
            })
        }
        ChatAction::RoomsLoadFail {
            correlation,
            failure,
        } => awaited(state.rooms_loading, *correlation).then(|| ChatState {
            rooms_loading: None,
            error: Some(failure.message.clone()),
            ..state.clone()
        }),
        ChatAction::RoomSelect { room_id } => (state.selected != Some(*room_id)).then(|| ChatState {
            selected: Some(*room_id),
            messages: IndexMap::new(),
            history_loading: None,
            ..state.clone()
        }),
        ChatAction::HistoryRequest {
            correlation,
            room_id,
        } => (state.selected == Some(*room_id)).then(|| ChatState {
            history_loading: Some(*correlation),
            ..state.clone()
        }),
        ChatAction::HistorySuccess {
            correlation,
            room_id,
            messages,
        } => {
            if state.selected != Some(*room_id) || !awaited(state.history_loading, *correlation) {
                return None;
            }
            // History first, then anything that arrived live meanwhile.
            let mut merged: IndexMap<MessageId, Message> =
                messages.iter().map(|m| (m.id, m.clone())).collect();
            for (id, message) in &state.messages {
                merged.entry(*id).or_insert_with(|| message.clone());
            }
            Some(ChatState {
                messages: merged,
                history_loading: None,
                ..state.clone()
            })
        }
        ChatAction::HistoryFail {
            correlation,
            failure,
            ..
        } => awaited(state.history_loading, *correlation).then(|| ChatState {
            history_loading: None,
            error: Some(failure.message.clone()),
            ..state.clone()
        }),
        ChatAction::MessageReceived { message } => {
            if state.selected != Some(message.room_id) || state.messages.contains_key(&message.id) {
                return None;
            }
            let mut next = state.clone();
            next.messages.insert(message.id, message.clone());
            Some(next)
        }
        ChatAction::ChannelStatusChanged { status } => {
            (state.status != *status).then(|| ChatState {
                status: *status,
                ..state.clone()
            })
        }
        ChatAction::MessageSend { .. } => None,
    }
}

#[derive(Clone)]
pub struct ChatStore {
    store: Store<ChatState>,
}

impl ChatStore {
    pub fn new(bus: &ActionBus) -> Self {
        let store = Store::new("chat", ChatState::default());
        route(&store, bus, KINDS, reduce);
        Self { store }
    }

    pub fn state(&self) -> ChatState {
        self.store.get_state()
    }

    pub fn store(&self) -> &Store<ChatState> {
        &self.store
    }
}
