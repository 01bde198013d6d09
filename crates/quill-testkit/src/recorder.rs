//! Bus tap recording every dispatched action.

use parking_lot::Mutex;
use quill_core::action::{Action, ActionKind};
use quill_core::bus::{ActionBus, HandlerResult, SubscriptionId};
use std::sync::Arc;

/// Records every action dispatched on a bus, in dispatch order
#[derive(Clone)]
pub struct ActionRecorder {
    actions: Arc<Mutex<Vec<Action>>>,
    subscription: SubscriptionId,
}

impl ActionRecorder {
    /// Start recording.
    pub fn attach(bus: &ActionBus) -> Self {
        let actions = Arc::new(Mutex::new(Vec::new()));
        let sink = actions.clone();
        let subscription = bus.observe(Arc::new(move |action: &Action| -> HandlerResult {
            sink.lock().push(action.clone());
            Ok(())
        }));
        Self {
            actions,
            subscription,
        }
    }

    pub fn subscription(&self) -> SubscriptionId {
        self.subscription
    }

    pub fn actions(&self) -> Vec<Action> {
        self.actions.lock().clone()
    }

    pub fn kinds(&self) -> Vec<ActionKind> {
        self.actions.lock().iter().map(Action::kind).collect()
    }

    /// Recorded actions of one kind
    pub fn of_kind(&self, kind: ActionKind) -> Vec<Action> {
        self.actions
            .lock()
            .iter()
            .filter(|a| a.kind() == kind)
            .cloned()
            .collect()
    }

    pub fn count(&self, kind: ActionKind) -> usize {
        self.actions
            .lock()
            .iter()
            .filter(|a| a.kind() == kind)
            .count()
    }

    /// Position of the first action of `kind`
    pub fn position(&self, kind: ActionKind) -> Option<usize> {
        self.actions.lock().iter().position(|a| a.kind() == kind)
    }

    pub fn clear(&self) {
        self.actions.lock().clear();
    }
}
