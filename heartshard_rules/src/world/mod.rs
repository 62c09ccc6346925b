//! World-level data: the logical clock and the starting roster.

mod roster;

pub use roster::*;

use serde::{Deserialize, Serialize};

/// Deterministic logical time, in world seconds.
///
/// Every recorded event advances the clock by a fixed step so that seeded
/// runs produce identical timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct WorldClock {
    now: f64,
}

impl WorldClock {
    /// Create a clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock at the given time.
    pub fn starting_at(now: f64) -> Self {
        Self { now: now.max(0.0) }
    }

    /// Current time.
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Advance by `step` and return the new time.
    pub fn advance(&mut self, step: f64) -> f64 {
        self.now += step.max(0.0);
        self.now
    }
}
