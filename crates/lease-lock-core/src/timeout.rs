//! Timeout value helpers.

use std::time::Duration;

use tokio::time::Instant;

/// A point in time after which waiting stops.
///
/// Built on [`tokio::time::Instant`] so a paused test clock drives it.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// Starts counting `timeout` from now.
    ///
    /// `None`, or a timeout too large to represent as an instant, never
    /// expires.
    pub fn after(timeout: Option<Duration>) -> Self {
        Self {
            at: timeout.and_then(|t| Instant::now().checked_add(t)),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }

    /// Time left before the deadline; `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.at.map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Clamps a sleep so it never runs past the deadline.
    pub fn clamp(&self, sleep: Duration) -> Duration {
        match self.remaining() {
            Some(left) => sleep.min(left),
            None => sleep,
        }
    }
}
