//! Outbound side of a window-to-window message channel.

use crate::envelope::EnvelopeError;

/// Posts serialized envelopes to the other context (`postMessage`).
pub trait MessagePort: Send + Sync {
    /// Deliver `data` to the other side, restricted to `target_origin`.
    fn post(&self, data: &str, target_origin: &str) -> Result<(), EnvelopeError>;
}
