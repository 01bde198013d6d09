//! Support tickets submitted through the embedded widget.

use super::{awaited, route};
use indexmap::IndexMap;
use quill_core::action::{Action, ActionKind};
use quill_core::bus::ActionBus;
use quill_core::ids::{CorrelationId, TicketId};
use quill_core::reactive::Store;
use quill_core::types::{FieldErrors, Ticket};
use quill_core::SupportAction;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SupportState {
    /// Newest first
    pub tickets: IndexMap<TicketId, Ticket>,
    pub submitting: Option<CorrelationId>,
    pub loading: Option<CorrelationId>,
    pub last_submitted: Option<TicketId>,
    pub error: Option<String>,
    pub field_errors: FieldErrors,
}

const KINDS: &[ActionKind] = &[
    ActionKind::TicketSubmitRequest,
    ActionKind::TicketSubmitSuccess,
    ActionKind::TicketSubmitFail,
    ActionKind::TicketHistoryRequest,
    ActionKind::TicketHistorySuccess,
    ActionKind::TicketHistoryFail,
];

fn reduce(state: &SupportState, action: &Action) -> Option<SupportState> {
    let Action::Support(action) = action else {
        return None;
    };
    match action {
        SupportAction::TicketSubmitRequest { correlation, .. } => Some(SupportState {
            submitting: Some(*correlation),
            error: None,
            field_errors: FieldErrors::default(),
            ..state.clone()
        }),
        SupportAction::TicketSubmitSuccess {
            correlation,
            ticket,
        } => awaited(state.submitting, *correlation).then(|| {
            let mut next = state.clone();
            next.tickets.shift_insert(0, ticket.id, ticket.clone());
            next.submitting = None;
            next.last_submitted = Some(ticket.id);
            next
        }),
        SupportAction::TicketSubmitFail {
            correlation,
            failure,
        } => awaited(state.submitting, *correlation).then(|| SupportState {
            submitting: None,
            error: Some(failure.message.clone()),
            field_errors: failure.field_errors.clone(),
            ..state.clone()
        }),
        SupportAction::HistoryRequest { correlation } => Some(SupportState {
            loading: Some(*correlation),
            ..state.clone()
        }),
        SupportAction::HistorySuccess {
            correlation,
            tickets,
        } => awaited(state.loading, *correlation).then(|| SupportState {
            tickets: tickets.iter().map(|t| (t.id, t.clone())).collect(),
            loading: None,
            ..state.clone()
        }),
        SupportAction::HistoryFail {
            correlation,
            failure,
        } => awaited(state.loading, *correlation).then(|| SupportState {
            loading: None,
            error: Some(failure.message.clone()),
            ..state.clone()
        }),
    }
}

#[derive(Clone)]
pub struct SupportStore {
    store: Store<SupportState>,
}

impl SupportStore {
    pub fn new(bus: &ActionBus) -> Self {
        let store = Store::new("support", SupportState::default());
        route(&store, bus, KINDS, reduce);
        Self { store }
    }

    pub fn state(&self) -> SupportState {
        self.store.get_state()
    }

    pub fn store(&self) -> &Store<SupportState> {
        &self.store
    }

    /// Tickets, newest first
    pub fn tickets(&self) -> Vec<Ticket> {
        self.store.snapshot().tickets.values().cloned().collect()
    }
}
