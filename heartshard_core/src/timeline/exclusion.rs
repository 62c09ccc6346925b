//! Exclusion events - irreversible departures through the maw.

use serde::{Deserialize, Serialize};

use super::TimelineSummary;
use crate::relationship::BondSnapshot;

/// Record of one character entering the eye.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExclusionEvent {
    pub entity: String,
    /// Bond graph at the instant of entry.
    pub bonds_at_entry: BondSnapshot,
    /// Timeline summary at the instant of entry.
    pub world_state: TimelineSummary,
    /// `1 / number of characters excluded so far`.
    pub healing: f32,
    pub timestamp: f64,
    #[serde(default)]
    closed: bool,
}

impl ExclusionEvent {
    /// Create an open exclusion event.
    ///
    /// `excluded_so_far` includes this entity.
    pub fn new(
        entity: impl Into<String>,
        bonds_at_entry: BondSnapshot,
        world_state: TimelineSummary,
        excluded_so_far: usize,
        timestamp: f64,
    ) -> Self {
        Self {
            entity: entity.into(),
            bonds_at_entry,
            world_state,
            healing: 1.0 / excluded_so_far.max(1) as f32,
            timestamp,
            closed: false,
        }
    }

    /// Whether the event has been recorded on a timeline.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn close(&mut self) {
        self.closed = true;
    }
}
