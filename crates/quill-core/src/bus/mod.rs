//! # Action Bus
//!
//! The single synchronous publish/subscribe hub through which every state
//! change is announced.
//!
//! ```text
//! dispatch(action)
//!   ├─ observers (diagnostic taps, every action)
//!   ├─ effects.on_action(action)      coordinator entry point, always
//!   └─ handlers[action.kind()]        registration order, isolated failures
//! ```
//!
//! ## Re-entrancy
//!
//! A handler may dispatch. Nested dispatches run depth-first to completion
//! before the outer fan-out continues. The nesting depth is bounded by
//! `max_depth`; a dispatch beyond it is refused with
//! [`BusError::DepthExceeded`] so a feedback loop between stores terminates.
//!
//! ## Failure isolation
//!
//! A handler that returns `Err` or panics is logged and skipped; later
//! handlers in the same fan-out still run. No lock is held while a handler
//! or the effects entry point runs, so handlers may register, unregister and
//! dispatch freely.

mod subscription;

pub use subscription::{ScopedSubscription, SubscriptionId};

use crate::action::{Action, ActionKind};
use crate::errors::QuillError;
use parking_lot::RwLock;
use std::cell::Cell;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{error, trace, warn};

/// Default bound on nested dispatch depth
pub const DEFAULT_MAX_DISPATCH_DEPTH: usize = 32;

/// Result returned by action handlers
pub type HandlerResult = Result<(), QuillError>;

/// Receives actions of the kinds it was registered for.
pub trait ActionHandler: Send + Sync {
    /// Handle one action.
    fn handle(&self, action: &Action) -> HandlerResult;
}

impl<F> ActionHandler for F
where
    F: Fn(&Action) -> HandlerResult + Send + Sync,
{
    fn handle(&self, action: &Action) -> HandlerResult {
        self(action)
    }
}

/// The side-effect entry point, invoked for every dispatched action.
pub trait ActionEffects: Send + Sync {
    /// Inspect an action and start any asynchronous work it requires.
    ///
    /// Must not block. Outcomes are dispatched later as new actions.
    fn on_action(&self, action: &Action);
}

/// Bus errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    /// Nested dispatch exceeded the configured depth
    #[error("dispatch of {kind} refused at depth {depth} (max {max})")]
    DepthExceeded {
        /// Kind of the refused action
        kind: ActionKind,
        /// Depth the dispatch would have run at
        depth: usize,
        /// Configured maximum
        max: usize,
    },
    /// The bus behind a weak handle has been dropped
    #[error("action bus is gone")]
    Closed,
}

/// What happened during one dispatch (not counting nested dispatches)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    /// Kind that was dispatched
    pub kind: ActionKind,
    /// Handlers invoked
    pub invoked: usize,
    /// Handlers that returned an error or panicked
    pub failed: usize,
}

/// Counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    /// Actions dispatched
    pub dispatched: u64,
    /// Handler invocations that failed
    pub handler_failures: u64,
    /// Dispatches refused by the depth guard
    pub depth_rejections: u64,
}

struct Entry {
    id: SubscriptionId,
    active: AtomicBool,
    handler: Arc<dyn ActionHandler>,
}

impl Entry {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

#[derive(Default)]
struct Registry {
    by_kind: HashMap<ActionKind, Vec<Arc<Entry>>>,
    observers: Vec<Arc<Entry>>,
    index: HashMap<SubscriptionId, Option<ActionKind>>,
}

pub(crate) struct BusInner {
    registry: RwLock<Registry>,
    effects: RwLock<Option<Arc<dyn ActionEffects>>>,
    next_id: AtomicU64,
    max_depth: usize,
    dispatched: AtomicU64,
    handler_failures: AtomicU64,
    depth_rejections: AtomicU64,
}

thread_local! {
    static DISPATCH_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Restores the dispatch depth even if a handler unwinds through us.
struct DepthGuard;

impl DepthGuard {
    fn enter() -> (Self, usize) {
        let depth = DISPATCH_DEPTH.with(|d| {
            let next = d.get() + 1;
            d.set(next);
            next
        });
        (DepthGuard, depth)
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DISPATCH_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

fn current_depth() -> usize {
    DISPATCH_DEPTH.with(Cell::get)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Process-wide action bus. Cloning shares the same bus.
#[derive(Clone)]
pub struct ActionBus {
    inner: Arc<BusInner>,
}

impl Default for ActionBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ActionBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionBus")
            .field("max_depth", &self.inner.max_depth)
            .field("stats", &self.stats())
            .finish()
    }
}

impl ActionBus {
    /// Create a bus with the default depth bound.
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DISPATCH_DEPTH)
    }

    /// Create a bus with an explicit nested-dispatch bound.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            inner: Arc::new(BusInner {
                registry: RwLock::new(Registry::default()),
                effects: RwLock::new(None),
                next_id: AtomicU64::new(1),
                max_depth: max_depth.max(1),
                dispatched: AtomicU64::new(0),
                handler_failures: AtomicU64::new(0),
                depth_rejections: AtomicU64::new(0),
            }),
        }
    }

    /// Install the side-effect entry point, replacing any previous one.
    pub fn install_effects(&self, effects: Arc<dyn ActionEffects>) {
        *self.inner.effects.write() = Some(effects);
    }

    /// Weak handle for components that must not keep the bus alive.
    pub fn handle(&self) -> BusHandle {
        BusHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Append `handler` to the subscriber list for `kind`.
    ///
    /// No deduplication: registering the same handler twice yields two
    /// invocations per dispatch.
    pub fn register(&self, kind: ActionKind, handler: Arc<dyn ActionHandler>) -> SubscriptionId {
        let entry = self.new_entry(handler);
        let id = entry.id;
        let mut registry = self.inner.registry.write();
        registry.by_kind.entry(kind).or_default().push(entry);
        registry.index.insert(id, Some(kind));
        trace!(%kind, ?id, "handler registered");
        id
    }

    /// Register a closure.
    pub fn register_fn<F>(&self, kind: ActionKind, f: F) -> SubscriptionId
    where
        F: Fn(&Action) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(kind, Arc::new(f))
    }

    /// Register a closure that is unregistered when the guard drops.
    pub fn register_scoped<F>(&self, kind: ActionKind, f: F) -> ScopedSubscription
    where
        F: Fn(&Action) -> HandlerResult + Send + Sync + 'static,
    {
        let id = self.register_fn(kind, f);
        ScopedSubscription::new(self.handle(), id)
    }

    /// Register a tap that sees every action, before the effects entry point.
    pub fn observe(&self, handler: Arc<dyn ActionHandler>) -> SubscriptionId {
        let entry = self.new_entry(handler);
        let id = entry.id;
        let mut registry = self.inner.registry.write();
        registry.observers.push(entry);
        registry.index.insert(id, None);
        id
    }

    /// Remove a registration. Unknown ids are a no-op; returns whether
    /// something was removed.
    pub fn unregister(&self, id: SubscriptionId) -> bool {
        self.inner.unregister(id)
    }

    /// Number of live handlers for `kind`
    pub fn handler_count(&self, kind: ActionKind) -> usize {
        self.inner
            .registry
            .read()
            .by_kind
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// Publish an action.
    ///
    /// Runs observers, then the effects entry point, then every handler
    /// registered for the action's kind, all before returning.
    pub fn dispatch(&self, action: impl Into<Action>) -> Result<DispatchReport, BusError> {
        self.inner.dispatch(action.into())
    }

    /// Snapshot of the diagnostic counters
    pub fn stats(&self) -> BusStats {
        BusStats {
            dispatched: self.inner.dispatched.load(Ordering::Relaxed),
            handler_failures: self.inner.handler_failures.load(Ordering::Relaxed),
            depth_rejections: self.inner.depth_rejections.load(Ordering::Relaxed),
        }
    }

    fn new_entry(&self, handler: Arc<dyn ActionHandler>) -> Arc<Entry> {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        Arc::new(Entry {
            id,
            active: AtomicBool::new(true),
            handler,
        })
    }
}

impl BusInner {
    fn unregister(&self, id: SubscriptionId) -> bool {
        let mut registry = self.registry.write();
        let Some(kind) = registry.index.remove(&id) else {
            return false;
        };
        let list = match kind {
            Some(kind) => registry.by_kind.get_mut(&kind),
            None => Some(&mut registry.observers),
        };
        if let Some(list) = list {
            if let Some(pos) = list.iter().position(|e| e.id == id) {
                // A fan-out in progress holds its own snapshot; the flag
                // keeps it from invoking this entry after removal.
                let entry = list.remove(pos);
                entry.active.store(false, Ordering::Release);
            }
        }
        trace!(?id, "handler unregistered");
        true
    }

    fn dispatch(&self, action: Action) -> Result<DispatchReport, BusError> {
        let kind = action.kind();
        let depth = current_depth() + 1;
        if depth > self.max_depth {
            self.depth_rejections.fetch_add(1, Ordering::Relaxed);
            error!(%kind, depth, max = self.max_depth, "dispatch depth exceeded, action dropped");
            return Err(BusError::DepthExceeded {
                kind,
                depth,
                max: self.max_depth,
            });
        }
        let (_guard, depth) = DepthGuard::enter();
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        trace!(%action, depth, "dispatch");

        let (observers, handlers) = {
            let registry = self.registry.read();
            (
                registry.observers.clone(),
                registry.by_kind.get(&kind).cloned().unwrap_or_default(),
            )
        };

        for entry in &observers {
            if entry.is_active() {
                self.invoke(entry, &action);
            }
        }

        let effects = self.effects.read().clone();
        if let Some(effects) = effects {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| effects.on_action(&action)));
            if let Err(payload) = outcome {
                error!(%kind, panic = %panic_message(payload.as_ref()), "effects entry point panicked");
            }
        }

        let mut report = DispatchReport {
            kind,
            invoked: 0,
            failed: 0,
        };
        for entry in &handlers {
            if !entry.is_active() {
                continue;
            }
            report.invoked += 1;
            if !self.invoke(entry, &action) {
                report.failed += 1;
            }
        }
        Ok(report)
    }

    fn invoke(&self, entry: &Entry, action: &Action) -> bool {
        let kind = action.kind();
        match panic::catch_unwind(AssertUnwindSafe(|| entry.handler.handle(action))) {
            Ok(Ok(())) => true,
            Ok(Err(err)) => {
                self.handler_failures.fetch_add(1, Ordering::Relaxed);
                warn!(%kind, id = ?entry.id, error = %err, "action handler failed");
                false
            }
            Err(payload) => {
                self.handler_failures.fetch_add(1, Ordering::Relaxed);
                error!(
                    %kind,
                    id = ?entry.id,
                    panic = %panic_message(payload.as_ref()),
                    "action handler panicked"
                );
                false
            }
        }
    }
}

/// Weak reference to the bus, held by long-lived producers (coordinator
/// workflows, bridges, stores that re-dispatch).
#[derive(Clone)]
pub struct BusHandle {
    inner: Weak<BusInner>,
}

impl std::fmt::Debug for BusHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusHandle")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl BusHandle {
    /// Dispatch through the bus if it still exists.
    pub fn dispatch(&self, action: impl Into<Action>) -> Result<DispatchReport, BusError> {
        let inner = self.inner.upgrade().ok_or(BusError::Closed)?;
        inner.dispatch(action.into())
    }

    /// Unregister through the bus if it still exists.
    pub fn unregister(&self, id: SubscriptionId) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|inner| inner.unregister(id))
    }

    /// Upgrade to a strong bus reference.
    pub fn upgrade(&self) -> Option<ActionBus> {
        self.inner.upgrade().map(|inner| ActionBus { inner })
    }
}
