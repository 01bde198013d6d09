//! Liveness tokens for work that may outlive its owner.
//!
//! An owner (a bridge, a mounted view) holds a `Liveness`. Deferred work
//! (timers, async workflows) captures a `LiveToken` and checks it before
//! touching shared state. Dropping or killing the owner makes every token
//! report dead.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Owner side of a liveness flag
#[derive(Debug)]
pub struct Liveness {
    alive: Arc<AtomicBool>,
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

impl Liveness {
    pub fn new() -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Token observing this owner
    pub fn token(&self) -> LiveToken {
        LiveToken {
            alive: self.alive.clone(),
        }
    }

    /// Mark dead without dropping.
    pub fn kill(&self) {
        self.alive.store(false, Ordering::Release);
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

impl Drop for Liveness {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Observer side of a liveness flag
#[derive(Debug, Clone)]
pub struct LiveToken {
    alive: Arc<AtomicBool>,
}

impl LiveToken {
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_die_with_their_owner() {
        let owner = Liveness::new();
        let token = owner.token();
        assert!(token.is_alive());
        drop(owner);
        assert!(!token.is_alive());
    }

    #[test]
    fn kill_is_visible_to_existing_tokens() {
        let owner = Liveness::new();
        let a = owner.token();
        let b = a.clone();
        owner.kill();
        assert!(!a.is_alive() && !b.is_alive());
        assert!(!owner.is_alive());
    }
}
