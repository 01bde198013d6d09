//! Quill Realtime - Persistent Chat Channel
//!
//! One duplex connection per client, bridged onto the action bus:
//! - outbound: `ROOM_SELECT` and `MESSAGE_SEND` become `select_room` and
//!   `send_message` frames
//! - inbound: `message` frames for the selected room become
//!   `MESSAGE_RECEIVED`; everything else is discarded here
//! - lifecycle: status changes are published as `CHANNEL_STATUS_CHANGED`;
//!   an unexpected close reconnects after a fixed delay and re-selects the
//!   current room
//!
//! The socket itself sits behind `SocketConnector`. Enable the
//! `tungstenite` feature for a native tokio-tungstenite implementation.

#![allow(missing_docs)]
#![forbid(unsafe_code)]

pub mod bridge;
pub mod connector;
pub mod frames;

#[cfg(feature = "tungstenite")]
pub mod tungstenite;

pub use bridge::{ChannelBridge, ChannelConfig, ChannelStats, SendStatus};
pub use connector::{ChannelError, SocketConnector, SocketHandler, SocketSink};
pub use frames::{ClientFrame, Inbound, ServerFrame};

#[cfg(feature = "tungstenite")]
pub use tungstenite::TungsteniteConnector;
