//! Quill Core - Client State Synchronization Foundation
//!
//! This crate holds the runtime-agnostic half of the Quill client core:
//! the bus vocabulary, the bus itself, the store base and the interfaces
//! through which the core reaches its host.
//!
//! # Architecture
//!
//! ## Vocabulary
//! - `Action`: closed tagged union, one nested enum per feature area
//! - `ActionKind`: flat routing key with a stable wire token
//! - `CorrelationId`: pairs a request action with its outcome
//!
//! ## Dispatch
//! - `ActionBus`: synchronous fan-out, depth-first re-entrancy, isolated
//!   handler failures, one effects entry point that sees every action
//! - `Store<S>`: immutable snapshots replaced by bus-driven reducers
//!
//! ## Effect Interfaces
//! - `HttpTransport`, `TaskSpawner`, `Clock`, `KeyValueStorage`
//!
//! Nothing in this crate performs I/O on its own.

#![allow(missing_docs)]
#![forbid(unsafe_code)]

/// Bus vocabulary
pub mod action;

/// Synchronous action bus
pub mod bus;

/// Application configuration
pub mod config;

/// Host effect interfaces
pub mod effects;

/// Unified error handling
pub mod errors;

/// Entity and correlation identifiers
pub mod ids;

/// Store base and liveness tokens
pub mod reactive;

/// Canonical domain types
pub mod types;

pub use action::{
    Action, ActionKind, ChatAction, CommentAction, FeedAction, ProfileAction, SessionAction,
    SupportAction,
};
pub use bus::{
    ActionBus, ActionEffects, ActionHandler, BusError, BusHandle, BusStats, DispatchReport,
    HandlerResult, ScopedSubscription, SubscriptionId,
};
pub use config::{AppConfig, ConfigError, ThrottleConfig};
pub use errors::{QuillError, QuillResult};
pub use ids::{CommentId, CorrelationId, MessageId, PostId, RoomId, TicketId, UserId};
pub use reactive::{ListenerId, LiveToken, Liveness, Store, StoreSubscription};
