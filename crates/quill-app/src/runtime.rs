//! Tokio-backed task spawning for native hosts.
//!
//! Must be used from within a tokio runtime. Browser hosts provide their
//! own `TaskSpawner` over `spawn_local` and `setTimeout`.

use futures::future::BoxFuture;
use parking_lot::Mutex;
use quill_core::effects::TaskSpawner;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug)]
pub struct TokioSpawner {
    shutdown_tx: watch::Sender<bool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl TokioSpawner {
    pub fn new() -> Self {
        let (shutdown_tx, _shutdown_rx) = watch::channel(false);
        Self {
            shutdown_tx,
            handles: Mutex::new(Vec::new()),
        }
    }

    fn track(&self, handle: JoinHandle<()>) {
        let mut handles = self.handles.lock();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Tasks not yet finished
    pub fn active_tasks(&self) -> usize {
        self.handles.lock().iter().filter(|h| !h.is_finished()).count()
    }

    /// Abort every tracked task and refuse pending timers.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        for handle in self.handles.lock().drain(..) {
            handle.abort();
        }
    }
}

impl Default for TokioSpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TokioSpawner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl TaskSpawner for TokioSpawner {
    fn spawn(&self, fut: BoxFuture<'static, ()>) {
        if *self.shutdown_tx.borrow() {
            tracing::debug!("Spawner shut down; task dropped");
            return;
        }
        self.track(tokio::spawn(fut));
    }

    fn spawn_after(&self, delay: Duration, task: Box<dyn FnOnce() + Send + 'static>) {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        if *shutdown_rx.borrow() {
            return;
        }
        self.track(tokio::spawn(async move {
            tokio::select! {
                _ = shutdown_rx.changed() => {}
                _ = tokio::time::sleep(delay) => task(),
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn delayed_task_fires_after_delay() {
        let spawner = TokioSpawner::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        spawner.spawn_after(
            Duration::from_secs(3),
            Box::new(move || {
                h.fetch_add(1, Ordering::SeqCst);
            }),
        );
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_timers() {
        let spawner = TokioSpawner::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        spawner.spawn_after(
            Duration::from_millis(10),
            Box::new(move || {
                h.fetch_add(1, Ordering::SeqCst);
            }),
        );
        spawner.shutdown();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        spawner.spawn(Box::pin(async {}));
        assert_eq!(spawner.active_tasks(), 0);
    }
}
