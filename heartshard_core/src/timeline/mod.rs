//! Timeline - the append-only signal and exclusion log.
//!
//! Each exclusion branches the timeline. A branch owns its own copy of the
//! history up to the branch point, so later writes to the parent are never
//! visible through the child.

mod exclusion;

pub use exclusion::*;

use heartshard_rules::Signal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::relationship::ProposedBond;

/// Errors raised by timeline writes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimelineError {
    #[error("signal at t={timestamp} is older than the timeline clock t={current}")]
    OutOfOrder { timestamp: f64, current: f64 },
}

/// Unique identifier for timelines and branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimelineId(pub Uuid);

impl TimelineId {
    /// Create a new random timeline ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TimelineId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TimelineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Summary counts for a timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineSummary {
    pub signal_count: usize,
    pub exclusion_count: usize,
    pub branch_count: usize,
    pub last_excluded: Option<String>,
    pub current_time: f64,
}

/// An append-only history of signals and exclusions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeline {
    id: TimelineId,
    parent: Option<TimelineId>,
    signals: Vec<Signal>,
    exclusions: Vec<ExclusionEvent>,
    branches: Vec<Timeline>,
    current_time: f64,
    /// Timestamp of the exclusion this branch grew from.
    branch_point: Option<f64>,
    /// Bonds proposed for the generation that starts on this branch.
    seed_bonds: Vec<ProposedBond>,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    /// Create an empty root timeline.
    pub fn new() -> Self {
        Self {
            id: TimelineId::new(),
            parent: None,
            signals: Vec::new(),
            exclusions: Vec::new(),
            branches: Vec::new(),
            current_time: 0.0,
            branch_point: None,
            seed_bonds: Vec::new(),
        }
    }

    /// Append a signal and advance the clock to its timestamp.
    ///
    /// Signals older than the current time are rejected; equal times are accepted.
    pub fn broadcast_signal(&mut self, signal: Signal) -> Result<(), TimelineError> {
        if signal.timestamp < self.current_time {
            tracing::warn!(
                "rejecting out-of-order signal from {} at t={}",
                signal.source,
                signal.timestamp
            );
            return Err(TimelineError::OutOfOrder {
                timestamp: signal.timestamp,
                current: self.current_time,
            });
        }

        tracing::debug!("broadcast {}", signal.summary());
        self.current_time = signal.timestamp;
        self.signals.push(signal);
        Ok(())
    }

    /// Append an exclusion and mark it closed.
    pub fn record_exclusion(&mut self, mut event: ExclusionEvent) -> &ExclusionEvent {
        event.close();
        self.exclusions.push(event);
        &self.exclusions[self.exclusions.len() - 1]
    }

    /// Register a child branch holding a copy of the history so far.
    ///
    /// The child's clock restarts at zero.
    pub fn branch_from_exclusion(
        &mut self,
        event: &ExclusionEvent,
        new_bonds: &[ProposedBond],
    ) -> &Timeline {
        let child = Timeline {
            id: TimelineId::new(),
            parent: Some(self.id),
            signals: self.signals.clone(),
            exclusions: self.exclusions.clone(),
            branches: Vec::new(),
            current_time: 0.0,
            branch_point: Some(event.timestamp),
            seed_bonds: new_bonds.to_vec(),
        };

        tracing::info!(
            "timeline {} branched as {} after {} left",
            self.id,
            child.id,
            event.entity
        );
        self.branches.push(child);
        &self.branches[self.branches.len() - 1]
    }

    /// Summary counts.
    pub fn state_snapshot(&self) -> TimelineSummary {
        TimelineSummary {
            signal_count: self.signals.len(),
            exclusion_count: self.exclusions.len(),
            branch_count: self.branches.len(),
            last_excluded: self.exclusions.last().map(|e| e.entity.clone()),
            current_time: self.current_time,
        }
    }

    pub fn id(&self) -> TimelineId {
        self.id
    }

    pub fn parent(&self) -> Option<TimelineId> {
        self.parent
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn exclusions(&self) -> &[ExclusionEvent] {
        &self.exclusions
    }

    pub fn last_exclusion(&self) -> Option<&ExclusionEvent> {
        self.exclusions.last()
    }

    pub fn branches(&self) -> &[Timeline] {
        &self.branches
    }

    /// Find a branch anywhere below this timeline.
    pub fn find_branch(&self, id: TimelineId) -> Option<&Timeline> {
        self.branches.iter().find_map(|branch| {
            if branch.id == id {
                Some(branch)
            } else {
                branch.find_branch(id)
            }
        })
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn branch_point(&self) -> Option<f64> {
        self.branch_point
    }

    pub fn seed_bonds(&self) -> &[ProposedBond] {
        &self.seed_bonds
    }
}
