//! # Feature Stores
//!
//! Each store wraps a `Store<S>` and routes the action kinds it cares about
//! through one pure reducer, `fn(&S, &Action) -> Option<S>`. Outcomes whose
//! correlation id does not match the request a store is waiting for are
//! superseded and ignored, so duplicate or late responses change nothing.

mod chat;
mod comments;
mod feed;
mod profile;
mod session;
mod support;

pub use chat::{ChatState, ChatStore};
pub use comments::{CommentState, CommentStore};
pub use feed::{FeedState, FeedStore};
pub use profile::{ProfileState, ProfileStore};
pub use session::{SessionState, SessionStore, SESSION_SAVED_AT_KEY, SESSION_USER_KEY};
pub use support::{SupportState, SupportStore};

use quill_core::action::{Action, ActionKind};
use quill_core::bus::{ActionBus, SubscriptionId};
use quill_core::reactive::Store;
use quill_core::ids::CorrelationId;

/// Route every kind in `kinds` through `reducer`.
pub(crate) fn route<S>(
    store: &Store<S>,
    bus: &ActionBus,
    kinds: &[ActionKind],
    reducer: fn(&S, &Action) -> Option<S>,
) -> Vec<SubscriptionId>
where
    S: Clone + Send + Sync + 'static,
{
    kinds
        .iter()
        .map(|kind| store.on(bus, *kind, reducer))
        .collect()
}

/// True when `correlation` is the outcome `slot` is waiting for.
pub(crate) fn awaited(slot: Option<CorrelationId>, correlation: CorrelationId) -> bool {
    if slot == Some(correlation) {
        true
    } else {
        tracing::debug!(%correlation, "Superseded outcome ignored");
        false
    }
}
