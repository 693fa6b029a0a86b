use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::time::{sleep_until, Instant};

/// A pool-wide "paused until" deadline.
///
/// Once engaged, the deadline can only be pushed further into the future. It is never brought forward, and it lapses
/// on its own once the deadline passes. Clones share the same deadline.
#[derive(Debug, Clone, Default)]
pub struct PauseGate {
    paused_until: Arc<Mutex<Option<Instant>>>,
}

impl PauseGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn deadline(&self) -> MutexGuard<'_, Option<Instant>> {
        self.paused_until.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Closes the gate until `deadline`. Returns `true` if this moved the deadline, and `false` if the gate was
    /// already closed until at least `deadline`.
    pub fn pause_until(&self, deadline: Instant) -> bool {
        let mut current = self.deadline();
        match *current {
            Some(existing) if existing >= deadline => false,
            _ => {
                *current = Some(deadline);
                true
            },
        }
    }

    /// Closes the gate for `cool_down`, starting now.
    pub fn pause_for(&self, cool_down: Duration) -> bool {
        self.pause_until(Instant::now() + cool_down)
    }

    /// Closes the gate for `cool_down`, starting now. Returns `true` only if the gate was open beforehand, so that
    /// exactly one of several callers racing to close it sees `true`.
    pub fn close_for(&self, cool_down: Duration) -> bool {
        let now = Instant::now();
        let deadline = now + cool_down;
        let mut current = self.deadline();
        let was_open = current.map_or(true, |existing| existing <= now);
        if current.map_or(true, |existing| existing < deadline) {
            *current = Some(deadline);
        }
        was_open
    }

    /// The deadline of the current pause, or `None` if the gate is open.
    pub fn paused_until(&self) -> Option<Instant> {
        let now = Instant::now();
        self.deadline().filter(|deadline| *deadline > now)
    }

    pub fn is_paused(&self) -> bool {
        self.paused_until().is_some()
    }

    /// Waits until the gate is open. Returns immediately if it is open already.
    pub async fn wait_until_open(&self) {
        while let Some(deadline) = self.paused_until() {
            sleep_until(deadline).await;
        }
    }
}
