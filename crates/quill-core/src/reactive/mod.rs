//! # Reactive Primitives
//!
//! `Store<S>` is the base for every feature store: one immutable snapshot,
//! replaced wholesale by reducers registered on the action bus.
//! `Liveness` lets deferred work detect that its owner is gone.

mod liveness;
mod store;

pub use liveness::{LiveToken, Liveness};
pub use store::{ListenerId, Store, StoreSubscription};
