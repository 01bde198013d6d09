//! Embedded side of the messaging bridge
//!
//! Runs inside the sandboxed support widget. Announces `ready` exactly once
//! after its own initialization, sends requests tagged with its instance
//! id, and accepts only host envelopes addressed to that instance. A
//! `cleanup` envelope tears the client down for good.

use crate::envelope::{
    Envelope, EnvelopeError, EnvelopeType, FailurePayload, HistoryPayload, InitPayload,
    InstanceId, Source, SubmitTicketPayload,
};
use crate::port::MessagePort;
use crate::stats::{bump, BridgeStats, Counters};
use parking_lot::Mutex;
use quill_core::types::Ticket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// A validated message from the host
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Init(InitPayload),
    TicketSubmitted(Ticket),
    TicketFailed(FailurePayload),
    HistoryLoaded(Vec<Ticket>),
    HistoryFailed(FailurePayload),
    /// The host is tearing the surface down
    Cleanup,
}

/// Embedded-side bridge client
pub struct EmbeddedClient {
    instance: InstanceId,
    host_origin: String,
    port: Mutex<Option<Arc<dyn MessagePort>>>,
    ready_sent: AtomicBool,
    counters: Counters,
}

impl std::fmt::Debug for EmbeddedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedClient")
            .field("instance", &self.instance)
            .field("ready_sent", &self.ready_sent.load(Ordering::Relaxed))
            .field("torn_down", &self.is_torn_down())
            .finish()
    }
}

impl EmbeddedClient {
    /// `instance` is the id the host assigned when opening this surface.
    pub fn new(
        instance: InstanceId,
        host_origin: impl Into<String>,
        port: Arc<dyn MessagePort>,
    ) -> Self {
        Self {
            instance,
            host_origin: host_origin.into(),
            port: Mutex::new(Some(port)),
            ready_sent: AtomicBool::new(false),
            counters: Counters::default(),
        }
    }

    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    fn send(&self, envelope: &Envelope) -> Result<(), EnvelopeError> {
        let port = self.port.lock().clone().ok_or(EnvelopeError::PortClosed)?;
        port.post(&envelope.encode()?, &self.host_origin)?;
        bump(&self.counters.posted);
        Ok(())
    }

    fn request(&self, kind: EnvelopeType) -> Envelope {
        Envelope::new(kind, Source::Embedded, self.instance)
    }

    /// Send `ready`. Returns `Ok(false)` if it was already sent.
    pub fn announce_ready(&self) -> Result<bool, EnvelopeError> {
        if self.ready_sent.swap(true, Ordering::AcqRel) {
            return Ok(false);
        }
        if let Err(err) = self.send(&self.request(EnvelopeType::Ready)) {
            self.ready_sent.store(false, Ordering::Release);
            return Err(err);
        }
        info!(instance = %self.instance, "embedded context announced ready");
        Ok(true)
    }

    pub fn submit_ticket(
        &self,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<(), EnvelopeError> {
        let envelope = self
            .request(EnvelopeType::SubmitTicket)
            .with_payload(&SubmitTicketPayload {
                subject: subject.into(),
                body: body.into(),
            })?;
        self.send(&envelope)
    }

    pub fn reload_history(&self) -> Result<(), EnvelopeError> {
        self.send(&self.request(EnvelopeType::ReloadHistory))
    }

    /// Validate an incoming message. Returns `None` for anything dropped.
    pub fn receive(&self, origin: &str, data: &str) -> Option<HostEvent> {
        bump(&self.counters.received);
        if self.is_torn_down() {
            bump(&self.counters.after_close);
            return None;
        }
        if origin != self.host_origin {
            bump(&self.counters.wrong_origin);
            debug!(%origin, "dropping message from foreign origin");
            return None;
        }
        let envelope = match Envelope::parse(data) {
            Ok(envelope) => envelope,
            Err(err) => {
                self.counters.reject(&err);
                debug!(error = %err, "dropping invalid envelope");
                return None;
            }
        };
        if envelope.source != Source::Host {
            bump(&self.counters.invalid_source);
            return None;
        }
        if envelope.instance_id != Some(self.instance) {
            bump(&self.counters.stale_instance);
            debug!(got = ?envelope.instance_id, "dropping envelope for another instance");
            return None;
        }
        if envelope.kind.sender() != Source::Host {
            bump(&self.counters.unexpected_type);
            return None;
        }

        let event = match envelope.kind {
            EnvelopeType::Init => envelope.payload_as().map(HostEvent::Init),
            EnvelopeType::TicketSubmitted => envelope.payload_as().map(HostEvent::TicketSubmitted),
            EnvelopeType::TicketFailed => envelope.payload_as().map(HostEvent::TicketFailed),
            EnvelopeType::HistoryLoaded => envelope
                .payload_as::<HistoryPayload>()
                .map(|p| HostEvent::HistoryLoaded(p.tickets)),
            EnvelopeType::HistoryFailed => envelope.payload_as().map(HostEvent::HistoryFailed),
            EnvelopeType::Cleanup => Ok(HostEvent::Cleanup),
            EnvelopeType::Ready | EnvelopeType::SubmitTicket | EnvelopeType::ReloadHistory => {
                return None
            }
        };
        match event {
            Ok(HostEvent::Cleanup) => {
                bump(&self.counters.accepted);
                self.port.lock().take();
                info!(instance = %self.instance, "embedded context cleaned up");
                Some(HostEvent::Cleanup)
            }
            Ok(event) => {
                bump(&self.counters.accepted);
                Some(event)
            }
            Err(err) => {
                bump(&self.counters.invalid_payload);
                debug!(error = %err, "dropping host envelope with bad payload");
                None
            }
        }
    }

    /// Whether `cleanup` has been received
    pub fn is_torn_down(&self) -> bool {
        self.port.lock().is_none()
    }

    pub fn stats(&self) -> BridgeStats {
        self.counters.snapshot()
    }
}
