//! Recording message port for cross-context tests.

use parking_lot::Mutex;
use quill_embed::{Envelope, EnvelopeError, EnvelopeType, MessagePort};
use std::sync::atomic::{AtomicBool, Ordering};

/// Captures every posted message with its target origin
#[derive(Default)]
pub struct RecordingPort {
    posted: Mutex<Vec<(String, String)>>,
    closed: AtomicBool,
}

impl RecordingPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make later posts fail as if the window were gone.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Raw `(data, target_origin)` pairs
    pub fn posted(&self) -> Vec<(String, String)> {
        self.posted.lock().clone()
    }

    /// Posted messages parsed as envelopes
    pub fn envelopes(&self) -> Vec<Envelope> {
        self.posted
            .lock()
            .iter()
            .filter_map(|(data, _)| Envelope::parse(data).ok())
            .collect()
    }

    /// Types of posted envelopes, in order
    pub fn kinds(&self) -> Vec<EnvelopeType> {
        self.envelopes().into_iter().map(|e| e.kind).collect()
    }

    /// Remove and return everything posted so far.
    pub fn take(&self) -> Vec<Envelope> {
        self.take_raw()
            .into_iter()
            .filter_map(|(data, _)| Envelope::parse(&data).ok())
            .collect()
    }

    /// Remove and return the raw `(data, target_origin)` pairs, for
    /// forwarding to the other side of a bridge.
    pub fn take_raw(&self) -> Vec<(String, String)> {
        std::mem::take(&mut *self.posted.lock())
    }
}

impl MessagePort for RecordingPort {
    fn post(&self, data: &str, target_origin: &str) -> Result<(), EnvelopeError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(EnvelopeError::PortClosed);
        }
        self.posted
            .lock()
            .push((data.to_string(), target_origin.to_string()));
        Ok(())
    }
}
