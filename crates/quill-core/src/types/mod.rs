//! # Domain Types
//!
//! Canonical shapes carried on action payloads. Server payloads arrive with
//! inconsistent field naming; the coordinator's normalizer converts them into
//! these types before they reach the bus, so stores never see raw JSON.

mod chat;
mod content;
mod failure;
mod support;
mod upload;
mod user;

pub use chat::{ChannelStatus, Message, Room};
pub use content::{Comment, Post};
pub use failure::{Failure, FailureKind, FieldErrors};
pub use support::{Ticket, TicketStatus};
pub use upload::Upload;
pub use user::{Profile, User};
