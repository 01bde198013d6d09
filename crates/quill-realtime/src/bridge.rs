//! Realtime channel bridge
//!
//! Owns one persistent connection and translates between it and the bus.
//!
//! ```text
//! Disconnected -> Connecting -> Open -> Closed -> (delay) -> Connecting -> ...
//!                                 \______________ shutdown() -> Disconnected
//! ```
//!
//! Every connection attempt gets a generation number. Socket events carry
//! the generation they were opened under; events from a superseded socket
//! are ignored. The reconnect delay is fixed and retries never stop until
//! `shutdown()`.

use crate::connector::{SocketConnector, SocketHandler, SocketSink};
use crate::frames::{ClientFrame, Inbound, ServerFrame};
use parking_lot::Mutex;
use quill_core::action::{Action, ActionKind, ChatAction};
use quill_core::bus::{ActionBus, BusHandle, SubscriptionId};
use quill_core::config::AppConfig;
use quill_core::effects::TaskSpawner;
use quill_core::ids::RoomId;
use quill_core::types::ChannelStatus;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration for the realtime channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Endpoint to connect to
    pub url: String,
    /// Fixed delay between an unexpected close and the next attempt
    pub reconnect_delay: Duration,
    /// Avatar substituted into inbound messages that carry none
    pub placeholder_avatar: String,
}

impl ChannelConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            url: config.realtime_url.clone(),
            reconnect_delay: config.reconnect_delay(),
            placeholder_avatar: config.placeholder_avatar.clone(),
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default())
    }
}

/// Outcome of `ChannelBridge::send`.
///
/// A message that is not sent is dropped: there is no outbound queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStatus {
    /// Written to the socket
    Sent,
    /// Dropped because no room is selected
    NoRoomSelected,
    /// Dropped because the channel is not open
    NotOpen,
    /// Dropped because the socket refused the write
    Failed,
}

impl SendStatus {
    pub fn is_sent(self) -> bool {
        matches!(self, Self::Sent)
    }
}

/// Statistics for the realtime channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStats {
    /// Connection attempts started
    pub connect_attempts: u64,
    /// Reconnects scheduled after an unexpected close
    pub reconnects_scheduled: u64,
    /// Frames received from the current socket
    pub frames_received: u64,
    /// Chat messages published to the bus
    pub messages_delivered: u64,
    /// Frames ignored (other types, other rooms, undecodable)
    pub discarded_frames: u64,
    /// Frames written to the socket
    pub frames_sent: u64,
    /// `send` calls that dropped their message
    pub dropped_sends: u64,
    /// Events from superseded sockets
    pub stale_events: u64,
}

#[derive(Default)]
struct Counters {
    connect_attempts: AtomicU64,
    reconnects_scheduled: AtomicU64,
    frames_received: AtomicU64,
    messages_delivered: AtomicU64,
    discarded_frames: AtomicU64,
    frames_sent: AtomicU64,
    dropped_sends: AtomicU64,
    stale_events: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

struct State {
    status: ChannelStatus,
    generation: u64,
    sink: Option<Arc<dyn SocketSink>>,
    selected_room: Option<RoomId>,
    shut_down: bool,
    subscriptions: Vec<SubscriptionId>,
}

struct Inner {
    config: ChannelConfig,
    connector: Arc<dyn SocketConnector>,
    spawner: Arc<dyn TaskSpawner>,
    bus: BusHandle,
    state: Mutex<State>,
    counters: Counters,
}

/// Handler bound to one connection generation
struct GenerationHandler {
    bridge: Weak<Inner>,
    generation: u64,
}

impl SocketHandler for GenerationHandler {
    fn handle_open(&self) {
        if let Some(inner) = self.bridge.upgrade() {
            inner.on_open(self.generation);
        }
    }

    fn handle_message(&self, data: &str) {
        if let Some(inner) = self.bridge.upgrade() {
            inner.on_message(self.generation, data);
        }
    }

    fn handle_close(&self, code: u16, reason: &str) {
        if let Some(inner) = self.bridge.upgrade() {
            inner.on_closed(self.generation, code, reason);
        }
    }

    fn handle_error(&self, error: &str) {
        if let Some(inner) = self.bridge.upgrade() {
            inner.on_error(self.generation, error);
        }
    }
}

impl Inner {
    fn connect(self: &Arc<Self>) {
        let generation = {
            let mut state = self.state.lock();
            if state.shut_down {
                return;
            }
            state.generation += 1;
            state.status = ChannelStatus::Connecting;
            state.sink = None;
            state.generation
        };
        bump(&self.counters.connect_attempts);
        info!(url = %self.config.url, generation, "realtime channel connecting");
        self.publish(ChannelStatus::Connecting);

        let handler = Arc::new(GenerationHandler {
            bridge: Arc::downgrade(self),
            generation,
        });
        match self.connector.connect(&self.config.url, handler) {
            Ok(sink) => {
                let (keep, resend) = {
                    let mut state = self.state.lock();
                    if state.generation == generation && !state.shut_down {
                        state.sink = Some(sink.clone());
                        // An open that raced ahead of us could not re-select.
                        let resend = (state.status == ChannelStatus::Open)
                            .then_some(state.selected_room)
                            .flatten();
                        (true, resend)
                    } else {
                        (false, None)
                    }
                };
                if !keep {
                    sink.close();
                } else if let Some(room_id) = resend {
                    self.write(&sink, &ClientFrame::SelectRoom { room_id });
                }
            }
            Err(err) => {
                warn!(url = %self.config.url, generation, error = %err, "realtime connect failed");
                self.on_closed(generation, 1006, &err.to_string());
            }
        }
    }

    fn is_current(&self, state: &State, generation: u64) -> bool {
        if state.generation == generation && !state.shut_down {
            true
        } else {
            bump(&self.counters.stale_events);
            false
        }
    }

    fn on_open(self: &Arc<Self>, generation: u64) {
        let resend = {
            let mut state = self.state.lock();
            if !self.is_current(&state, generation) || state.status != ChannelStatus::Connecting {
                return;
            }
            state.status = ChannelStatus::Open;
            match (&state.sink, state.selected_room) {
                (Some(sink), Some(room_id)) => Some((sink.clone(), room_id)),
                _ => None,
            }
        };
        info!(generation, "realtime channel open");
        if let Some((sink, room_id)) = resend {
            debug!(%room_id, "re-selecting room after open");
            self.write(&sink, &ClientFrame::SelectRoom { room_id });
        }
        self.publish(ChannelStatus::Open);
    }

    fn on_message(&self, generation: u64, data: &str) {
        let selected = {
            let state = self.state.lock();
            if !self.is_current(&state, generation) {
                return;
            }
            state.selected_room
        };
        bump(&self.counters.frames_received);

        let inbound = ServerFrame::decode(data).and_then(ServerFrame::into_inbound);
        let mut message = match inbound {
            Ok(Inbound::Message(message)) => message,
            Ok(Inbound::Other(kind)) => {
                bump(&self.counters.discarded_frames);
                debug!(%kind, "ignoring realtime frame");
                return;
            }
            Err(err) => {
                bump(&self.counters.discarded_frames);
                debug!(error = %err, "discarding undecodable realtime frame");
                return;
            }
        };
        if selected != Some(message.room_id) {
            bump(&self.counters.discarded_frames);
            debug!(room_id = %message.room_id, "discarding message for unselected room");
            return;
        }
        if message.avatar.trim().is_empty() {
            message.avatar = self.config.placeholder_avatar.clone();
        }
        bump(&self.counters.messages_delivered);
        if let Err(err) = self.bus.dispatch(ChatAction::MessageReceived { message }) {
            debug!(error = %err, "message received after bus shutdown");
        }
    }

    fn on_error(self: &Arc<Self>, generation: u64, error: &str) {
        warn!(generation, %error, "realtime channel error");
        let sink = {
            let state = self.state.lock();
            (state.generation == generation)
                .then(|| state.sink.clone())
                .flatten()
        };
        if let Some(sink) = sink {
            sink.close();
        }
        self.on_closed(generation, 1006, error);
    }

    fn on_closed(self: &Arc<Self>, generation: u64, code: u16, reason: &str) {
        let status = {
            let mut state = self.state.lock();
            if !self.is_current(&state, generation)
                || !matches!(
                    state.status,
                    ChannelStatus::Connecting | ChannelStatus::Open
                )
            {
                return;
            }
            state.sink = None;
            state.status = ChannelStatus::Closed;
            state.status
        };
        warn!(
            generation,
            code,
            %reason,
            delay_ms = self.config.reconnect_delay.as_millis() as u64,
            "realtime channel closed, reconnect scheduled"
        );
        self.publish(status);

        bump(&self.counters.reconnects_scheduled);
        let weak = Arc::downgrade(self);
        self.spawner.spawn_after(
            self.config.reconnect_delay,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.reconnect(generation);
                }
            }),
        );
    }

    fn reconnect(self: &Arc<Self>, closed_generation: u64) {
        {
            let state = self.state.lock();
            if state.shut_down
                || state.generation != closed_generation
                || state.status != ChannelStatus::Closed
            {
                return;
            }
        }
        self.connect();
    }

    fn select_room(&self, room_id: RoomId) {
        let sink = {
            let mut state = self.state.lock();
            state.selected_room = Some(room_id);
            if state.status == ChannelStatus::Open {
                state.sink.clone()
            } else {
                None
            }
        };
        match sink {
            Some(sink) => {
                self.write(&sink, &ClientFrame::SelectRoom { room_id });
            }
            None => debug!(%room_id, "room recorded, selection sent on next open"),
        }
    }

    fn send(&self, text: String) -> SendStatus {
        let (room, sink) = {
            let state = self.state.lock();
            let sink = if state.status == ChannelStatus::Open {
                state.sink.clone()
            } else {
                None
            };
            (state.selected_room, sink)
        };
        let status = match (room, sink) {
            (None, _) => SendStatus::NoRoomSelected,
            (Some(_), None) => SendStatus::NotOpen,
            (Some(_), Some(sink)) => {
                if self.write(&sink, &ClientFrame::SendMessage { text }) {
                    SendStatus::Sent
                } else {
                    SendStatus::Failed
                }
            }
        };
        if !status.is_sent() {
            bump(&self.counters.dropped_sends);
            debug!(?status, "chat message dropped");
        }
        status
    }

    fn write(&self, sink: &Arc<dyn SocketSink>, frame: &ClientFrame) -> bool {
        let text = match frame.encode() {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "failed to encode realtime frame");
                return false;
            }
        };
        match sink.send_text(&text) {
            Ok(()) => {
                bump(&self.counters.frames_sent);
                true
            }
            Err(err) => {
                warn!(error = %err, "realtime write failed");
                false
            }
        }
    }

    fn publish(&self, status: ChannelStatus) {
        if let Err(err) = self.bus.dispatch(ChatAction::ChannelStatusChanged { status }) {
            debug!(%status, error = %err, "channel status not published");
        }
    }

    fn stats(&self) -> ChannelStats {
        let c = &self.counters;
        ChannelStats {
            connect_attempts: c.connect_attempts.load(Ordering::Relaxed),
            reconnects_scheduled: c.reconnects_scheduled.load(Ordering::Relaxed),
            frames_received: c.frames_received.load(Ordering::Relaxed),
            messages_delivered: c.messages_delivered.load(Ordering::Relaxed),
            discarded_frames: c.discarded_frames.load(Ordering::Relaxed),
            frames_sent: c.frames_sent.load(Ordering::Relaxed),
            dropped_sends: c.dropped_sends.load(Ordering::Relaxed),
            stale_events: c.stale_events.load(Ordering::Relaxed),
        }
    }
}

/// Bridge between the realtime socket and the action bus.
///
/// Listens for `ROOM_SELECT` and `MESSAGE_SEND` on the bus; publishes
/// `MESSAGE_RECEIVED` and `CHANNEL_STATUS_CHANGED`.
#[derive(Clone)]
pub struct ChannelBridge {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ChannelBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelBridge")
            .field("url", &self.inner.config.url)
            .field("status", &self.status())
            .field("selected_room", &self.selected_room())
            .finish()
    }
}

impl ChannelBridge {
    /// Create the bridge and register its bus handlers. Does not connect.
    pub fn new(
        config: ChannelConfig,
        connector: Arc<dyn SocketConnector>,
        spawner: Arc<dyn TaskSpawner>,
        bus: &ActionBus,
    ) -> Self {
        let inner = Arc::new(Inner {
            config,
            connector,
            spawner,
            bus: bus.handle(),
            state: Mutex::new(State {
                status: ChannelStatus::Disconnected,
                generation: 0,
                sink: None,
                selected_room: None,
                shut_down: false,
                subscriptions: Vec::new(),
            }),
            counters: Counters::default(),
        });

        let weak = Arc::downgrade(&inner);
        let select = bus.register_fn(ActionKind::RoomSelect, move |action| {
            if let (Some(inner), Action::Chat(ChatAction::RoomSelect { room_id })) =
                (weak.upgrade(), action)
            {
                inner.select_room(*room_id);
            }
            Ok(())
        });
        let weak = Arc::downgrade(&inner);
        let send = bus.register_fn(ActionKind::MessageSend, move |action| {
            if let (Some(inner), Action::Chat(ChatAction::MessageSend { text })) =
                (weak.upgrade(), action)
            {
                inner.send(text.clone());
            }
            Ok(())
        });
        inner.state.lock().subscriptions = vec![select, send];

        Self { inner }
    }

    /// Open the first connection.
    pub fn start(&self) {
        self.inner.connect();
    }

    /// Remember `room_id` and tell the server now if the channel is open.
    pub fn select_room(&self, room_id: RoomId) {
        self.inner.select_room(room_id);
    }

    /// Send a chat message to the selected room.
    pub fn send(&self, text: impl Into<String>) -> SendStatus {
        self.inner.send(text.into())
    }

    pub fn status(&self) -> ChannelStatus {
        self.inner.state.lock().status
    }

    pub fn selected_room(&self) -> Option<RoomId> {
        self.inner.state.lock().selected_room
    }

    pub fn stats(&self) -> ChannelStats {
        self.inner.stats()
    }

    /// Close the socket on purpose and stop reconnecting.
    ///
    /// Also unregisters the bridge's bus handlers. Idempotent.
    pub fn shutdown(&self) {
        let (sink, subscriptions, was) = {
            let mut state = self.inner.state.lock();
            if state.shut_down {
                return;
            }
            state.shut_down = true;
            state.generation += 1;
            let was = state.status;
            state.status = ChannelStatus::Disconnected;
            (
                state.sink.take(),
                std::mem::take(&mut state.subscriptions),
                was,
            )
        };
        if let Some(sink) = sink {
            sink.close();
        }
        for id in subscriptions {
            self.inner.bus.unregister(id);
        }
        info!(url = %self.inner.config.url, "realtime channel shut down");
        if was != ChannelStatus::Disconnected {
            self.inner.publish(ChannelStatus::Disconnected);
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(sink) = self.state.get_mut().sink.take() {
            sink.close();
        }
    }
}
