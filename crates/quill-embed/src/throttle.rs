//! Per-kind minimum request intervals.

use crate::envelope::EnvelopeType;
use std::collections::HashMap;

/// Tracks the last accepted request per envelope type.
#[derive(Debug, Clone, Default)]
pub struct Throttle {
    intervals: HashMap<EnvelopeType, u64>,
    last_accepted: HashMap<EnvelopeType, u64>,
}

impl Throttle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require at least `interval_ms` between accepted requests of `kind`.
    pub fn with_interval(mut self, kind: EnvelopeType, interval_ms: u64) -> Self {
        self.intervals.insert(kind, interval_ms);
        self
    }

    /// Milliseconds until `kind` may be accepted again; zero when allowed now.
    pub fn remaining(&self, kind: EnvelopeType, now_ms: u64) -> u64 {
        let (Some(interval), Some(last)) = (self.intervals.get(&kind), self.last_accepted.get(&kind))
        else {
            return 0;
        };
        last.saturating_add(*interval).saturating_sub(now_ms)
    }

    /// Record an accepted request.
    pub fn record(&mut self, kind: EnvelopeType, now_ms: u64) {
        self.last_accepted.insert(kind, now_ms);
    }

    /// Accept and record if allowed; otherwise return the remaining wait.
    pub fn try_acquire(&mut self, kind: EnvelopeType, now_ms: u64) -> Result<(), u64> {
        match self.remaining(kind, now_ms) {
            0 => {
                self.record(kind, now_ms);
                Ok(())
            }
            wait => Err(wait),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intervals_are_per_kind() {
        let mut throttle = Throttle::new()
            .with_interval(EnvelopeType::SubmitTicket, 1_000)
            .with_interval(EnvelopeType::ReloadHistory, 500);

        assert_eq!(throttle.try_acquire(EnvelopeType::SubmitTicket, 10_000), Ok(()));
        assert_eq!(throttle.try_acquire(EnvelopeType::SubmitTicket, 10_400), Err(600));
        assert_eq!(throttle.try_acquire(EnvelopeType::ReloadHistory, 10_400), Ok(()));
        assert_eq!(throttle.try_acquire(EnvelopeType::SubmitTicket, 11_000), Ok(()));
    }

    #[test]
    fn unconfigured_kinds_are_never_throttled() {
        let mut throttle = Throttle::new();
        assert_eq!(throttle.try_acquire(EnvelopeType::Ready, 0), Ok(()));
        assert_eq!(throttle.try_acquire(EnvelopeType::Ready, 0), Ok(()));
    }

    #[test]
    fn huge_interval_saturates_instead_of_overflowing() {
        let mut throttle = Throttle::new().with_interval(EnvelopeType::SubmitTicket, u64::MAX);
        assert_eq!(throttle.try_acquire(EnvelopeType::SubmitTicket, 10), Ok(()));
        assert_eq!(throttle.try_acquire(EnvelopeType::SubmitTicket, 20), Err(u64::MAX - 20));
    }
}
