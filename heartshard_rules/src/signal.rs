//! Signals - immutable records of interactions and state changes.

use serde::{Deserialize, Serialize};

use crate::PolarityState;

/// What kind of event a signal records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// Initial appearance of a roster entity.
    Birth,
    /// A character left through the maw and seeds the next generation.
    GenerationalBirth,
    /// An entity slipped to a new polarity.
    Movement,
    /// An axis flip caused by someone else's exclusion.
    Disturbance,
}

impl SignalKind {
    pub fn label(&self) -> &'static str {
        match self {
            SignalKind::Birth => "birth",
            SignalKind::GenerationalBirth => "generational birth",
            SignalKind::Movement => "movement",
            SignalKind::Disturbance => "disturbance",
        }
    }
}

/// A signal carries provenance (generation, lineage) alongside its payload.
///
/// Signals are built once with the `with_*` methods and never mutated after
/// they are broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub source: String,
    pub target: String,
    pub polarity_change: Option<PolarityState>,
    pub friction: f32,
    pub timestamp: f64,
    pub entropy_delta: f32,
    pub event_type: SignalKind,
    pub signal_location: Option<PolarityState>,
    pub generation: u32,
    #[serde(default)]
    pub lineage: Vec<String>,
}

impl Signal {
    /// Create a new signal between two named endpoints.
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        event_type: SignalKind,
        timestamp: f64,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            polarity_change: None,
            friction: 0.0,
            timestamp,
            entropy_delta: 0.0,
            event_type,
            signal_location: None,
            generation: 1,
            lineage: Vec::new(),
        }
    }

    pub fn with_polarity_change(mut self, polarity: PolarityState) -> Self {
        self.polarity_change = Some(polarity);
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_entropy_delta(mut self, delta: f32) -> Self {
        self.entropy_delta = delta;
        self
    }

    pub fn with_location(mut self, location: PolarityState) -> Self {
        self.signal_location = Some(location);
        self
    }

    pub fn with_generation(mut self, generation: u32) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_lineage(mut self, lineage: Vec<String>) -> Self {
        self.lineage = lineage;
        self
    }

    /// One-line human-readable summary.
    pub fn summary(&self) -> String {
        let location = self
            .signal_location
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        format!(
            "{} {} -> {} at t={:.1} (gen {}, location {})",
            self.event_type.label(),
            self.source,
            self.target,
            self.timestamp,
            self.generation,
            location
        )
    }
}
