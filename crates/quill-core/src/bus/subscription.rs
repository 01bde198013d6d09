//! Bus subscription handles.

use super::BusHandle;
use std::fmt;

/// Identifies one registration on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

impl SubscriptionId {
    /// Raw value, for logging
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Unregisters its handler when dropped.
///
/// Holds only a weak handle, so a guard outliving the bus is harmless.
#[must_use = "dropping the guard unregisters the handler immediately"]
pub struct ScopedSubscription {
    handle: BusHandle,
    id: SubscriptionId,
    detached: bool,
}

impl ScopedSubscription {
    pub(crate) fn new(handle: BusHandle, id: SubscriptionId) -> Self {
        Self {
            handle,
            id,
            detached: false,
        }
    }

    /// The registration this guard owns
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Keep the handler registered for the life of the bus.
    pub fn detach(mut self) -> SubscriptionId {
        self.detached = true;
        self.id
    }
}

impl fmt::Debug for ScopedSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedSubscription")
            .field("id", &self.id)
            .field("detached", &self.detached)
            .finish()
    }
}

impl Drop for ScopedSubscription {
    fn drop(&mut self) {
        if !self.detached {
            self.handle.unregister(self.id);
        }
    }
}
