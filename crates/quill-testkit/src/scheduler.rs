//! Manual task scheduling and time control
//!
//! `ManualScheduler` queues spawned futures and delayed callbacks instead
//! of running them. Tests decide when work happens:
//!
//! - `run_until_idle()` drives every queued future (and anything they spawn)
//!   to completion on the current thread
//! - `advance(d)` moves the shared `ManualClock` forward and fires every
//!   timer that became due, in due order

use futures::future::BoxFuture;
use parking_lot::Mutex;
use quill_core::effects::{Clock, TaskSpawner};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(start_ms),
        }
    }

    pub fn set(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.now_ms
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

struct Timer {
    due_ms: u64,
    seq: u64,
    task: Box<dyn FnOnce() + Send + 'static>,
}

/// Spawner whose work runs only on demand
pub struct ManualScheduler {
    clock: Arc<ManualClock>,
    tasks: Mutex<VecDeque<BoxFuture<'static, ()>>>,
    timers: Mutex<Vec<Timer>>,
    next_seq: AtomicU64,
    spawned: AtomicU64,
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualScheduler {
    /// Scheduler with its own clock starting at a fixed, non-zero instant
    pub fn new() -> Self {
        Self::with_clock(Arc::new(ManualClock::new(1_700_000_000_000)))
    }

    pub fn with_clock(clock: Arc<ManualClock>) -> Self {
        Self {
            clock,
            tasks: Mutex::new(VecDeque::new()),
            timers: Mutex::new(Vec::new()),
            next_seq: AtomicU64::new(0),
            spawned: AtomicU64::new(0),
        }
    }

    pub fn clock(&self) -> Arc<ManualClock> {
        self.clock.clone()
    }

    /// Futures waiting to run
    pub fn pending_tasks(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Timers not yet fired
    pub fn pending_timers(&self) -> usize {
        self.timers.lock().len()
    }

    /// Total futures ever spawned
    pub fn spawned(&self) -> u64 {
        self.spawned.load(Ordering::SeqCst)
    }

    /// Run queued futures, including any spawned while running, until none
    /// remain. Returns how many ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            // Release the queue lock before polling so tasks can spawn.
            let next = self.tasks.lock().pop_front();
            match next {
                Some(fut) => {
                    futures::executor::block_on(fut);
                    ran += 1;
                }
                None => return ran,
            }
        }
    }

    /// Move time forward, firing due timers in order and draining spawned
    /// work after each one.
    pub fn advance(&self, by: Duration) {
        let target = self.clock.now_ms() + by.as_millis() as u64;
        loop {
            let next = {
                let mut timers = self.timers.lock();
                let due = timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due_ms <= target)
                    .min_by_key(|(_, t)| (t.due_ms, t.seq))
                    .map(|(i, _)| i);
                due.map(|i| timers.swap_remove(i))
            };
            let Some(timer) = next else {
                break;
            };
            if timer.due_ms > self.clock.now_ms() {
                self.clock.set(timer.due_ms);
            }
            (timer.task)();
            self.run_until_idle();
        }
        self.clock.set(target);
        self.run_until_idle();
    }
}

impl TaskSpawner for ManualScheduler {
    fn spawn(&self, fut: BoxFuture<'static, ()>) {
        self.spawned.fetch_add(1, Ordering::SeqCst);
        self.tasks.lock().push_back(fut);
    }

    fn spawn_after(&self, delay: Duration, task: Box<dyn FnOnce() + Send + 'static>) {
        let timer = Timer {
            due_ms: self.clock.now_ms() + delay.as_millis() as u64,
            seq: self.next_seq.fetch_add(1, Ordering::SeqCst),
            task,
        };
        self.timers.lock().push(timer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn spawned_work_waits_for_run() {
        let scheduler = ManualScheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        scheduler.spawn(Box::pin(async move {
            h.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.run_until_idle(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn timers_fire_in_due_order() {
        let scheduler = ManualScheduler::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for (delay, label) in [(300, "c"), (100, "a"), (200, "b")] {
            let log = log.clone();
            scheduler.spawn_after(
                Duration::from_millis(delay),
                Box::new(move || log.lock().push(label)),
            );
        }
        scheduler.advance(Duration::from_millis(150));
        assert_eq!(*log.lock(), vec!["a"]);
        scheduler.advance(Duration::from_millis(200));
        assert_eq!(*log.lock(), vec!["a", "b", "c"]);
        assert_eq!(scheduler.pending_timers(), 0);
    }

    #[test]
    fn clock_moves_with_advance() {
        let scheduler = ManualScheduler::new();
        let clock = scheduler.clock();
        let start = clock.now_ms();
        scheduler.advance(Duration::from_secs(2));
        assert_eq!(clock.now_ms(), start + 2_000);
    }
}
