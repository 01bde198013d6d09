//! Store<S> - an observable state container fed by the action bus
//!
//! A store holds one immutable snapshot. Updates build the complete next
//! state and swap it in atomically, then notify every listener in
//! registration order. Outside code only ever receives owned copies.
//!
//! Two observation styles are available:
//! - push: `add_listener` callbacks, invoked synchronously after each swap
//! - poll: `subscribe()` returns a `StoreSubscription` tracking the version it
//!   last saw, for async consumers that coalesce rapid updates

use crate::action::{Action, ActionKind};
use crate::bus::{ActionBus, SubscriptionId};
use parking_lot::RwLock;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{error, trace};

/// Identifies one store listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Listener {
    id: ListenerId,
    active: AtomicBool,
    callback: Box<dyn Fn() + Send + Sync>,
}

struct StoreInner<S> {
    name: &'static str,
    state: RwLock<Arc<S>>,
    version: AtomicU64,
    listeners: RwLock<Vec<Arc<Listener>>>,
    next_listener: AtomicU64,
}

impl<S> StoreInner<S> {
    fn replace(&self, next: S) {
        *self.state.write() = Arc::new(next);
        let version = self.version.fetch_add(1, Ordering::AcqRel) + 1;
        trace!(store = self.name, version, "state replaced");
        self.notify();
    }

    fn notify(&self) {
        let listeners = self.listeners.read().clone();
        for listener in listeners {
            if !listener.active.load(Ordering::Acquire) {
                continue;
            }
            if panic::catch_unwind(AssertUnwindSafe(|| (listener.callback)())).is_err() {
                error!(store = self.name, listener = listener.id.0, "store listener panicked");
            }
        }
    }
}

/// Observable holder of one piece of application state.
///
/// Cloning shares the same underlying store.
pub struct Store<S> {
    inner: Arc<StoreInner<S>>,
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: Clone + Send + Sync + 'static> Store<S> {
    /// Create a store with an initial state.
    pub fn new(name: &'static str, initial: S) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                name,
                state: RwLock::new(Arc::new(initial)),
                version: AtomicU64::new(0),
                listeners: RwLock::new(Vec::new()),
                next_listener: AtomicU64::new(1),
            }),
        }
    }

    /// Store name used in logs
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Owned copy of the current state.
    pub fn get_state(&self) -> S {
        (**self.inner.state.read()).clone()
    }

    /// Shared handle to the current snapshot, without copying.
    ///
    /// The snapshot is immutable; later updates replace it rather than
    /// modifying it.
    pub fn snapshot(&self) -> Arc<S> {
        self.inner.state.read().clone()
    }

    /// Number of replacements so far
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Acquire)
    }

    /// Replace the state and notify listeners.
    ///
    /// Listeners are notified even when `next` equals the current state.
    pub fn set_state(&self, next: S) {
        self.inner.replace(next);
    }

    /// Build the next state from the current one and swap it in.
    ///
    /// If `f` panics the state is left untouched.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&S) -> S,
    {
        let current = self.snapshot();
        let next = f(&current);
        self.inner.replace(next);
    }

    /// Register a no-argument change callback.
    pub fn add_listener<F>(&self, callback: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = ListenerId(self.inner.next_listener.fetch_add(1, Ordering::Relaxed));
        self.inner.listeners.write().push(Arc::new(Listener {
            id,
            active: AtomicBool::new(true),
            callback: Box::new(callback),
        }));
        id
    }

    /// Remove a listener. Unknown ids are a no-op.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.write();
        match listeners.iter().position(|l| l.id == id) {
            Some(pos) => {
                let listener = listeners.remove(pos);
                listener.active.store(false, Ordering::Release);
                true
            }
            None => false,
        }
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.read().len()
    }

    /// Poll-based subscription starting at the current version.
    pub fn subscribe(&self) -> StoreSubscription<S> {
        StoreSubscription {
            source: self.inner.clone(),
            last_version: self.version(),
        }
    }

    /// Route actions of `kind` through `reducer`.
    ///
    /// The reducer returns the complete next state, or `None` when the action
    /// does not concern this store. The bus holds only a weak reference, so
    /// the registration goes quiet once every `Store` clone is dropped.
    pub fn on<F>(&self, bus: &ActionBus, kind: ActionKind, reducer: F) -> SubscriptionId
    where
        F: Fn(&S, &Action) -> Option<S> + Send + Sync + 'static,
    {
        let weak: Weak<StoreInner<S>> = Arc::downgrade(&self.inner);
        bus.register_fn(kind, move |action| {
            let Some(inner) = weak.upgrade() else {
                return Ok(());
            };
            let current = inner.state.read().clone();
            if let Some(next) = reducer(&current, action) {
                inner.replace(next);
            }
            Ok(())
        })
    }
}

impl<S: Clone + Send + Sync + Default + 'static> Default for Store<S> {
    fn default() -> Self {
        Self::new("store", S::default())
    }
}

impl<S: Clone + Send + Sync + std::fmt::Debug + 'static> std::fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.inner.name)
            .field("state", &self.snapshot())
            .field("version", &self.version())
            .finish()
    }
}

/// Poll-based view of a store.
pub struct StoreSubscription<S> {
    source: Arc<StoreInner<S>>,
    last_version: u64,
}

impl<S: Clone + Send + Sync + 'static> StoreSubscription<S> {
    /// Whether the store changed since the last poll
    pub fn has_changed(&self) -> bool {
        self.source.version.load(Ordering::Acquire) > self.last_version
    }

    /// New state if the store changed since the last poll.
    ///
    /// Several updates between polls are observed as one.
    pub fn poll(&mut self) -> Option<S> {
        let current_version = self.source.version.load(Ordering::Acquire);
        if current_version > self.last_version {
            self.last_version = current_version;
            Some((**self.source.state.read()).clone())
        } else {
            None
        }
    }

    /// Current state regardless of change
    pub fn get(&self) -> S {
        (**self.source.state.read()).clone()
    }

    /// Last version this subscription observed
    pub fn last_observed_version(&self) -> u64 {
        self.last_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ChatAction;
    use crate::ids::RoomId;
    use parking_lot::Mutex;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Counter {
        hits: u32,
        tags: Vec<String>,
    }

    #[test]
    fn test_get_state_is_a_defensive_copy() {
        let store = Store::new("counter", Counter::default());
        let mut copy = store.get_state();
        copy.hits = 99;
        copy.tags.push("mutated".into());

        assert_eq!(store.get_state(), Counter::default());
    }

    #[test]
    fn test_set_state_always_notifies() {
        let store = Store::new("counter", Counter::default());
        let calls = Arc::new(AtomicU64::new(0));
        {
            let calls = calls.clone();
            store.add_listener(move || {
                calls.fetch_add(1, Ordering::SeqCst);
            });
        }

        store.set_state(Counter::default());
        store.set_state(Counter::default());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.version(), 2);
    }

    #[test]
    fn test_listeners_in_insertion_order() {
        let store = Store::new("counter", 0u32);
        let log = Arc::new(Mutex::new(Vec::new()));
        for n in 0..3 {
            let log = log.clone();
            store.add_listener(move || log.lock().push(n));
        }
        store.set_state(1);
        assert_eq!(*log.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_listener_removed_during_notify_is_skipped() {
        let store = Store::new("counter", 0u32);
        let second_ran = Arc::new(AtomicBool::new(false));
        let second_id = Arc::new(Mutex::new(None));

        {
            let store2 = store.clone();
            let second_id = second_id.clone();
            store.add_listener(move || {
                if let Some(id) = second_id.lock().take() {
                    store2.remove_listener(id);
                }
            });
        }
        let id = {
            let second_ran = second_ran.clone();
            store.add_listener(move || second_ran.store(true, Ordering::SeqCst))
        };
        *second_id.lock() = Some(id);

        store.set_state(1);
        assert!(!second_ran.load(Ordering::SeqCst));
        assert_eq!(store.listener_count(), 1);
    }

    #[test]
    fn test_panicking_update_leaves_state_untouched() {
        let store = Store::new("counter", 5u32);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            store.update(|_| panic!("reducer bug"));
        }));
        assert!(result.is_err());
        assert_eq!(store.get_state(), 5);
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn test_subscription_coalesces() {
        let store = Store::new("counter", 0u32);
        let mut sub = store.subscribe();
        assert_eq!(sub.poll(), None);

        store.set_state(1);
        store.set_state(2);
        assert!(sub.has_changed());
        assert_eq!(sub.poll(), Some(2));
        assert_eq!(sub.poll(), None);
        assert_eq!(sub.last_observed_version(), 2);
    }

    #[test]
    fn test_on_routes_actions_through_reducer() {
        let bus = ActionBus::new();
        let store = Store::new("rooms", Vec::<RoomId>::new());
        store.on(&bus, ActionKind::RoomSelect, |rooms, action| match action {
            Action::Chat(ChatAction::RoomSelect { room_id }) => {
                let mut next = rooms.clone();
                next.push(*room_id);
                Some(next)
            }
            _ => None,
        });

        bus.dispatch(ChatAction::RoomSelect { room_id: RoomId(1) })
            .unwrap();
        bus.dispatch(ChatAction::RoomSelect { room_id: RoomId(2) })
            .unwrap();
        assert_eq!(store.get_state(), vec![RoomId(1), RoomId(2)]);
    }

    #[test]
    fn test_reducer_returning_none_does_not_notify() {
        let bus = ActionBus::new();
        let store = Store::new("noop", 0u32);
        store.on(&bus, ActionKind::RoomSelect, |_, _| None);
        bus.dispatch(ChatAction::RoomSelect { room_id: RoomId(1) })
            .unwrap();
        assert_eq!(store.version(), 0);
    }
}
