//! Host side of the messaging bridge
//!
//! The host page owns the embedded support surface. For every incoming
//! message it checks, in order:
//!
//! 1. origin equals our own origin
//! 2. the data parses as an envelope with `source: "embedded"`
//! 3. a surface is open and `instanceId` matches it
//! 4. the type is one the embedded side may send
//!
//! Anything that fails a check is dropped, counted in `BridgeStats` and
//! logged at debug level. Valid requests become bus actions; their outcomes
//! are pushed back to the embedded side.
//!
//! Nothing is pushed before the embedded side has sent `ready`. Pushes
//! requested earlier are held and flushed when it arrives.

use crate::envelope::{
    Envelope, EnvelopeError, EnvelopeType, FailurePayload, HistoryPayload, InitPayload,
    InstanceId, Source, SubmitTicketPayload,
};
use crate::port::MessagePort;
use crate::stats::{bump, BridgeStats, Counters};
use crate::throttle::Throttle;
use parking_lot::Mutex;
use quill_core::action::{Action, ActionKind, SupportAction};
use quill_core::bus::{ActionBus, BusHandle};
use quill_core::config::AppConfig;
use quill_core::effects::{Clock, TaskSpawner};
use quill_core::ids::CorrelationId;
use quill_core::types::Failure;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Host bridge settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// Our own origin; the only origin accepted and the post target
    pub origin: String,
    pub submit_ticket_ms: u64,
    pub reload_history_ms: u64,
}

impl HostConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            origin: config.host_origin.clone(),
            submit_ticket_ms: config.throttle.submit_ticket_ms,
            reload_history_ms: config.throttle.reload_history_ms,
        }
    }
}

struct SessionState {
    port: Option<Arc<dyn MessagePort>>,
    ready: bool,
    closed: bool,
    held: Vec<Envelope>,
    throttle: Throttle,
    submits: HashSet<CorrelationId>,
    history_in_flight: Option<CorrelationId>,
    history_pending: u32,
    follow_up_scheduled: bool,
}

/// One open of the embedded surface
struct Session {
    instance: InstanceId,
    state: Mutex<SessionState>,
}

/// What to do about history after releasing the session lock
enum HistoryStep {
    Start(CorrelationId),
    Schedule(u64),
    Nothing,
}

impl SessionState {
    fn start_history(&mut self, now_ms: u64) -> CorrelationId {
        let correlation = CorrelationId::new();
        self.throttle.record(EnvelopeType::ReloadHistory, now_ms);
        self.history_in_flight = Some(correlation);
        self.history_pending = 0;
        correlation
    }

    /// Decide how to serve coalesced reloads once nothing is in flight.
    fn follow_up(&mut self, now_ms: u64) -> HistoryStep {
        if self.closed || self.history_in_flight.is_some() || self.history_pending == 0 {
            return HistoryStep::Nothing;
        }
        match self.throttle.remaining(EnvelopeType::ReloadHistory, now_ms) {
            0 => HistoryStep::Start(self.start_history(now_ms)),
            _ if self.follow_up_scheduled => HistoryStep::Nothing,
            wait => {
                self.follow_up_scheduled = true;
                HistoryStep::Schedule(wait)
            }
        }
    }
}

struct HostInner {
    config: HostConfig,
    clock: Arc<dyn Clock>,
    spawner: Arc<dyn TaskSpawner>,
    bus: BusHandle,
    next_instance: AtomicU64,
    current: Mutex<Option<Arc<Session>>>,
    counters: Counters,
}

impl HostInner {
    fn current(&self) -> Option<Arc<Session>> {
        self.current.lock().clone()
    }

    fn envelope(&self, session: &Session, kind: EnvelopeType) -> Envelope {
        Envelope::new(kind, Source::Host, session.instance)
    }

    fn post(&self, port: &Arc<dyn MessagePort>, envelope: &Envelope) {
        let result = envelope
            .encode()
            .and_then(|data| port.post(&data, &self.config.origin));
        match result {
            Ok(()) => bump(&self.counters.posted),
            Err(err) => warn!(kind = %envelope.kind, error = %err, "failed to post envelope"),
        }
    }

    /// Send now if the handshake is complete, otherwise hold.
    fn push(&self, session: &Session, envelope: Envelope) -> Result<(), EnvelopeError> {
        let port = {
            let mut state = session.state.lock();
            if state.closed {
                return Err(EnvelopeError::PortClosed);
            }
            if !state.ready {
                if envelope.kind == EnvelopeType::Init {
                    state.held.retain(|held| held.kind != EnvelopeType::Init);
                }
                state.held.push(envelope);
                bump(&self.counters.held_until_ready);
                debug!(instance = %session.instance, "push held until ready");
                return Ok(());
            }
            state.port.clone()
        };
        match port {
            Some(port) => {
                self.post(&port, &envelope);
                Ok(())
            }
            None => Err(EnvelopeError::PortClosed),
        }
    }

    fn dispatch(&self, action: impl Into<Action>) {
        if let Err(err) = self.bus.dispatch(action) {
            warn!(error = %err, "embedded request not dispatched");
        }
    }

    fn receive(self: &Arc<Self>, origin: &str, data: &str) {
        bump(&self.counters.received);
        if origin != self.config.origin {
            bump(&self.counters.wrong_origin);
            debug!(%origin, "dropping message from foreign origin");
            return;
        }
        let envelope = match Envelope::parse(data) {
            Ok(envelope) => envelope,
            Err(err) => {
                self.counters.reject(&err);
                debug!(error = %err, "dropping invalid envelope");
                return;
            }
        };
        if envelope.source != Source::Embedded {
            bump(&self.counters.invalid_source);
            debug!(kind = %envelope.kind, "dropping envelope not sent by the embedded side");
            return;
        }
        let Some(session) = self.current() else {
            bump(&self.counters.after_close);
            debug!(kind = %envelope.kind, "dropping envelope, no embedded surface open");
            return;
        };
        if envelope.instance_id != Some(session.instance) {
            bump(&self.counters.stale_instance);
            debug!(
                kind = %envelope.kind,
                expected = %session.instance,
                got = ?envelope.instance_id,
                "dropping envelope from stale instance"
            );
            return;
        }
        if envelope.kind.sender() != Source::Embedded {
            bump(&self.counters.unexpected_type);
            debug!(kind = %envelope.kind, "dropping host-only envelope type");
            return;
        }
        bump(&self.counters.accepted);

        match envelope.kind {
            EnvelopeType::Ready => self.on_ready(&session),
            EnvelopeType::SubmitTicket => self.on_submit(&session, &envelope),
            EnvelopeType::ReloadHistory => self.on_reload(&session),
            _ => {}
        }
    }

    fn on_ready(&self, session: &Session) {
        let (port, held) = {
            let mut state = session.state.lock();
            if state.closed {
                return;
            }
            if state.ready {
                debug!(instance = %session.instance, "duplicate ready ignored");
                return;
            }
            state.ready = true;
            (state.port.clone(), std::mem::take(&mut state.held))
        };
        info!(instance = %session.instance, held = held.len(), "embedded context ready");
        if let Some(port) = port {
            for envelope in &held {
                self.post(&port, envelope);
            }
        }
    }

    fn on_submit(&self, session: &Session, envelope: &Envelope) {
        let payload: SubmitTicketPayload = match envelope.payload_as() {
            Ok(payload) => payload,
            Err(err) => {
                bump(&self.counters.invalid_payload);
                debug!(error = %err, "dropping submit_ticket with bad payload");
                return;
            }
        };
        let now = self.clock.now_ms();
        let correlation = {
            let mut state = session.state.lock();
            let acquired = state.throttle.try_acquire(EnvelopeType::SubmitTicket, now);
            if let Err(wait_ms) = acquired {
                drop(state);
                bump(&self.counters.throttled);
                warn!(instance = %session.instance, wait_ms, "ticket submission throttled");
                return;
            }
            let correlation = CorrelationId::new();
            state.submits.insert(correlation);
            correlation
        };
        self.dispatch(SupportAction::TicketSubmitRequest {
            correlation,
            subject: payload.subject,
            body: payload.body,
        });
    }

    fn on_reload(self: &Arc<Self>, session: &Arc<Session>) {
        let now = self.clock.now_ms();
        let step = {
            let mut state = session.state.lock();
            let wait = state.throttle.remaining(EnvelopeType::ReloadHistory, now);
            if state.history_in_flight.is_none() && wait == 0 {
                HistoryStep::Start(state.start_history(now))
            } else {
                state.history_pending += 1;
                bump(&self.counters.coalesced);
                debug!(
                    instance = %session.instance,
                    pending = state.history_pending,
                    "history reload coalesced"
                );
                if state.history_in_flight.is_none() && !state.follow_up_scheduled {
                    state.follow_up_scheduled = true;
                    HistoryStep::Schedule(wait)
                } else {
                    HistoryStep::Nothing
                }
            }
        };
        self.run_history_step(session, step);
    }

    fn run_history_step(self: &Arc<Self>, session: &Arc<Session>, step: HistoryStep) {
        match step {
            HistoryStep::Start(correlation) => {
                self.dispatch(SupportAction::HistoryRequest { correlation });
            }
            HistoryStep::Schedule(wait_ms) => {
                let host = Arc::downgrade(self);
                let weak_session = Arc::downgrade(session);
                self.spawner.spawn_after(
                    Duration::from_millis(wait_ms),
                    Box::new(move || {
                        if let (Some(host), Some(session)) = (host.upgrade(), weak_session.upgrade())
                        {
                            host.fire_follow_up(&session);
                        }
                    }),
                );
            }
            HistoryStep::Nothing => {}
        }
    }

    fn fire_follow_up(self: &Arc<Self>, session: &Arc<Session>) {
        let now = self.clock.now_ms();
        let step = {
            let mut state = session.state.lock();
            state.follow_up_scheduled = false;
            state.follow_up(now)
        };
        self.run_history_step(session, step);
    }

    fn on_history_outcome(self: &Arc<Self>, action: &Action) {
        let (correlation, envelope_for) = match action {
            Action::Support(SupportAction::HistorySuccess {
                correlation,
                tickets,
            }) => (
                *correlation,
                Outcome::HistoryLoaded(HistoryPayload {
                    tickets: tickets.clone(),
                }),
            ),
            Action::Support(SupportAction::HistoryFail {
                correlation,
                failure,
            }) => (*correlation, Outcome::Failed(EnvelopeType::HistoryFailed, failure.clone())),
            _ => return,
        };
        let Some(session) = self.current() else {
            return;
        };
        let now = self.clock.now_ms();
        let step = {
            let mut state = session.state.lock();
            if state.history_in_flight != Some(correlation) {
                return;
            }
            state.history_in_flight = None;
            state.follow_up(now)
        };
        self.push_outcome(&session, envelope_for);
        self.run_history_step(&session, step);
    }

    fn on_submit_outcome(&self, action: &Action) {
        let (correlation, outcome) = match action {
            Action::Support(SupportAction::TicketSubmitSuccess {
                correlation,
                ticket,
            }) => (*correlation, Outcome::Submitted(ticket.clone())),
            Action::Support(SupportAction::TicketSubmitFail {
                correlation,
                failure,
            }) => (*correlation, Outcome::Failed(EnvelopeType::TicketFailed, failure.clone())),
            _ => return,
        };
        let Some(session) = self.current() else {
            return;
        };
        if !session.state.lock().submits.remove(&correlation) {
            return;
        }
        self.push_outcome(&session, outcome);
    }

    fn push_outcome(&self, session: &Session, outcome: Outcome) {
        let envelope = match outcome {
            Outcome::Submitted(ticket) => self
                .envelope(session, EnvelopeType::TicketSubmitted)
                .with_payload(&ticket),
            Outcome::HistoryLoaded(payload) => self
                .envelope(session, EnvelopeType::HistoryLoaded)
                .with_payload(&payload),
            Outcome::Failed(kind, failure) => self.envelope(session, kind).with_payload(
                &FailurePayload {
                    message: failure.message,
                    field_errors: failure.field_errors,
                },
            ),
        };
        let result = envelope.and_then(|envelope| self.push(session, envelope));
        if let Err(err) = result {
            debug!(instance = %session.instance, error = %err, "outcome not pushed");
        }
    }
}

enum Outcome {
    Submitted(quill_core::types::Ticket),
    HistoryLoaded(HistoryPayload),
    Failed(EnvelopeType, Failure),
}

/// Host bridge for the embedded support surface.
#[derive(Clone)]
pub struct EmbedHost {
    inner: Arc<HostInner>,
}

impl std::fmt::Debug for EmbedHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbedHost")
            .field("origin", &self.inner.config.origin)
            .field("instance", &self.current_instance())
            .finish()
    }
}

impl EmbedHost {
    /// Create the host bridge and subscribe to ticket outcomes on the bus.
    pub fn new(
        config: HostConfig,
        clock: Arc<dyn Clock>,
        spawner: Arc<dyn TaskSpawner>,
        bus: &ActionBus,
    ) -> Self {
        let inner = Arc::new(HostInner {
            config,
            clock,
            spawner,
            bus: bus.handle(),
            next_instance: AtomicU64::new(0),
            current: Mutex::new(None),
            counters: Counters::default(),
        });

        for kind in [ActionKind::TicketHistorySuccess, ActionKind::TicketHistoryFail] {
            let weak: Weak<HostInner> = Arc::downgrade(&inner);
            bus.register_fn(kind, move |action| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_history_outcome(action);
                }
                Ok(())
            });
        }
        for kind in [ActionKind::TicketSubmitSuccess, ActionKind::TicketSubmitFail] {
            let weak: Weak<HostInner> = Arc::downgrade(&inner);
            bus.register_fn(kind, move |action| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_submit_outcome(action);
                }
                Ok(())
            });
        }

        Self { inner }
    }

    /// Open a new embedded surface, closing any previous one.
    ///
    /// Returns the new instance id, which the embedded side must put on
    /// every envelope.
    pub fn open(&self, port: Arc<dyn MessagePort>) -> InstanceId {
        self.close();
        let instance = InstanceId(self.inner.next_instance.fetch_add(1, Ordering::Relaxed) + 1);
        let throttle = Throttle::new()
            .with_interval(EnvelopeType::SubmitTicket, self.inner.config.submit_ticket_ms)
            .with_interval(EnvelopeType::ReloadHistory, self.inner.config.reload_history_ms);
        let session = Arc::new(Session {
            instance,
            state: Mutex::new(SessionState {
                port: Some(port),
                ready: false,
                closed: false,
                held: Vec::new(),
                throttle,
                submits: HashSet::new(),
                history_in_flight: None,
                history_pending: 0,
                follow_up_scheduled: false,
            }),
        });
        *self.inner.current.lock() = Some(session);
        info!(%instance, "embedded surface opened");
        instance
    }

    /// Message listener entry point: `origin` is the sender's origin as
    /// reported by the platform, `data` the raw message.
    pub fn receive(&self, origin: &str, data: &str) {
        self.inner.receive(origin, data);
    }

    /// Push initial data, held until the embedded side is ready.
    pub fn push_init(&self, payload: &InitPayload) -> Result<(), EnvelopeError> {
        let session = self.inner.current().ok_or(EnvelopeError::PortClosed)?;
        let envelope = self
            .inner
            .envelope(&session, EnvelopeType::Init)
            .with_payload(payload)?;
        self.inner.push(&session, envelope)
    }

    /// Tear down the current surface.
    ///
    /// Sends `cleanup`, then detaches and drops every reference to the
    /// surface without waiting for an acknowledgement. Idempotent.
    pub fn close(&self) {
        let Some(session) = self.inner.current.lock().take() else {
            return;
        };
        let port = {
            let mut state = session.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            state.held.clear();
            state.submits.clear();
            state.history_in_flight = None;
            state.history_pending = 0;
            state.port.take()
        };
        if let Some(port) = port {
            let cleanup = self.inner.envelope(&session, EnvelopeType::Cleanup);
            self.inner.post(&port, &cleanup);
        }
        info!(instance = %session.instance, "embedded surface closed");
    }

    pub fn current_instance(&self) -> Option<InstanceId> {
        self.inner.current().map(|s| s.instance)
    }

    /// Whether the current surface has completed the handshake
    pub fn is_ready(&self) -> bool {
        self.inner
            .current()
            .is_some_and(|s| s.state.lock().ready)
    }

    /// Reloads waiting for a follow-up on the current surface
    pub fn history_pending(&self) -> u32 {
        self.inner
            .current()
            .map_or(0, |s| s.state.lock().history_pending)
    }

    pub fn stats(&self) -> BridgeStats {
        self.inner.counters.snapshot()
    }
}
