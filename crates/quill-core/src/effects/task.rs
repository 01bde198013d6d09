//! Runtime-agnostic task spawning traits.

use futures::future::BoxFuture;
use std::time::Duration;

/// Task spawning contract for runtime implementations.
///
/// The browser host backs this with `spawn_local` and `setTimeout`; native
/// hosts use tokio. Spawned work never reports back through this trait:
/// coordinator workflows publish their results as actions.
pub trait TaskSpawner: Send + Sync {
    /// Spawn a background task.
    fn spawn(&self, fut: BoxFuture<'static, ()>);

    /// Run `task` once after `delay` has elapsed.
    fn spawn_after(&self, delay: Duration, task: Box<dyn FnOnce() + Send + 'static>);
}
