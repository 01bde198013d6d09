//! Drop and delivery counters for the messaging bridge.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics for one side of the messaging bridge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeStats {
    /// Raw messages seen by the listener
    pub received: u64,
    /// Envelopes that passed validation
    pub accepted: u64,
    /// Dropped: sender origin differs from ours
    pub wrong_origin: u64,
    /// Dropped: not a JSON object
    pub malformed: u64,
    /// Dropped: `source` missing, invalid, or from our own side
    pub invalid_source: u64,
    /// Dropped: `type` not part of the protocol
    pub unknown_type: u64,
    /// Dropped: known type sent by the wrong side
    pub unexpected_type: u64,
    /// Dropped: `instanceId` missing or not the current instance
    pub stale_instance: u64,
    /// Dropped: payload does not decode for its type
    pub invalid_payload: u64,
    /// Dropped: a request arrived inside its throttle window
    pub throttled: u64,
    /// History reloads folded into a pending follow-up
    pub coalesced: u64,
    /// Dropped: arrived after teardown
    pub after_close: u64,
    /// Envelopes posted to the other side
    pub posted: u64,
    /// Pushes held until the handshake completed
    pub held_until_ready: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub received: AtomicU64,
    pub accepted: AtomicU64,
    pub wrong_origin: AtomicU64,
    pub malformed: AtomicU64,
    pub invalid_source: AtomicU64,
    pub unknown_type: AtomicU64,
    pub unexpected_type: AtomicU64,
    pub stale_instance: AtomicU64,
    pub invalid_payload: AtomicU64,
    pub throttled: AtomicU64,
    pub coalesced: AtomicU64,
    pub after_close: AtomicU64,
    pub posted: AtomicU64,
    pub held_until_ready: AtomicU64,
}

pub(crate) fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl Counters {
    pub fn snapshot(&self) -> BridgeStats {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        BridgeStats {
            received: load(&self.received),
            accepted: load(&self.accepted),
            wrong_origin: load(&self.wrong_origin),
            malformed: load(&self.malformed),
            invalid_source: load(&self.invalid_source),
            unknown_type: load(&self.unknown_type),
            unexpected_type: load(&self.unexpected_type),
            stale_instance: load(&self.stale_instance),
            invalid_payload: load(&self.invalid_payload),
            throttled: load(&self.throttled),
            coalesced: load(&self.coalesced),
            after_close: load(&self.after_close),
            posted: load(&self.posted),
            held_until_ready: load(&self.held_until_ready),
        }
    }

    /// Count a parse rejection under its reason.
    pub fn reject(&self, err: &crate::envelope::EnvelopeError) {
        use crate::envelope::EnvelopeError;
        let counter = match err {
            EnvelopeError::Malformed(_) => &self.malformed,
            EnvelopeError::InvalidSource => &self.invalid_source,
            EnvelopeError::UnknownType(_) => &self.unknown_type,
            EnvelopeError::InvalidInstance => &self.stale_instance,
            EnvelopeError::InvalidPayload { .. } => &self.invalid_payload,
            EnvelopeError::PortClosed => &self.after_close,
        };
        bump(counter);
    }
}

impl BridgeStats {
    /// Total envelopes dropped for any reason
    pub fn dropped(&self) -> u64 {
        self.wrong_origin
            + self.malformed
            + self.invalid_source
            + self.unknown_type
            + self.unexpected_type
            + self.stale_instance
            + self.invalid_payload
            + self.throttled
            + self.after_close
    }
}
