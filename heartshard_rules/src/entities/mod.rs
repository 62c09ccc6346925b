//! Entity definitions for the HeartShard world.
//!
//! Every entity shares the common [`Entity`] record; the kind-specific data
//! lives in the closed [`EntityKind`] union.

mod artifact;
mod character;

pub use artifact::*;
pub use character::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::mechanics::{clamp_unit, Readiness, DEFAULT_ENTROPY, ENTROPY_STEP, READY_ENTROPY_THRESHOLD};
use crate::{PolarityState, Signal, SignalKind};

/// Kind-specific entity data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityKind {
    Character(CharacterTraits),
    Artifact(ArtifactTraits),
}

impl EntityKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Character(_) => "character",
            EntityKind::Artifact(_) => "artifact",
        }
    }
}

/// A named entity with polarity, coherence and provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    name: String,
    polarity: PolarityState,
    /// Coherence scalar in `[0, 1]`.
    entropy: f32,
    /// Names of bonded entities; mirrors the relationship matrix.
    bonds: BTreeSet<String>,
    /// Every polarity this entity has left behind, oldest first.
    diagonal: Vec<PolarityState>,
    generation: u32,
    lineage: Vec<String>,
    birth_signal: Option<Signal>,
    kind: EntityKind,
}

impl Entity {
    /// Create a first-generation entity.
    pub fn new(name: impl Into<String>, polarity: PolarityState, kind: EntityKind) -> Self {
        Self {
            name: name.into(),
            polarity,
            entropy: DEFAULT_ENTROPY,
            bonds: BTreeSet::new(),
            diagonal: Vec::new(),
            generation: 1,
            lineage: Vec::new(),
            birth_signal: None,
            kind,
        }
    }

    /// Create a character.
    pub fn character(name: impl Into<String>, polarity: PolarityState, traits: CharacterTraits) -> Self {
        Self::new(name, polarity, EntityKind::Character(traits))
    }

    /// Create an artifact.
    pub fn artifact(name: impl Into<String>, polarity: PolarityState, traits: ArtifactTraits) -> Self {
        Self::new(name, polarity, EntityKind::Artifact(traits))
    }

    /// Set the starting entropy (clamped).
    pub fn with_entropy(mut self, entropy: f32) -> Self {
        self.entropy = clamp_unit(entropy);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn polarity(&self) -> PolarityState {
        self.polarity
    }

    pub fn entropy(&self) -> f32 {
        self.entropy
    }

    pub fn bonds(&self) -> &BTreeSet<String> {
        &self.bonds
    }

    pub fn diagonal(&self) -> &[PolarityState] {
        &self.diagonal
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn lineage(&self) -> &[String] {
        &self.lineage
    }

    pub fn birth_signal(&self) -> Option<&Signal> {
        self.birth_signal.as_ref()
    }

    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    pub fn is_character(&self) -> bool {
        matches!(self.kind, EntityKind::Character(_))
    }

    pub fn as_character(&self) -> Option<&CharacterTraits> {
        match &self.kind {
            EntityKind::Character(traits) => Some(traits),
            EntityKind::Artifact(_) => None,
        }
    }

    pub fn as_artifact(&self) -> Option<&ArtifactTraits> {
        match &self.kind {
            EntityKind::Artifact(traits) => Some(traits),
            EntityKind::Character(_) => None,
        }
    }

    /// Check if this is a character that has entered the eye.
    pub fn inside_eye(&self) -> bool {
        self.as_character().is_some_and(CharacterTraits::inside_eye)
    }

    /// Lifecycle state; `None` for artifacts.
    pub fn readiness(&self) -> Option<Readiness> {
        let traits = self.as_character()?;
        Some(if traits.inside_eye() {
            Readiness::InsideEye
        } else if !self.bonds.is_empty() && self.entropy < READY_ENTROPY_THRESHOLD {
            Readiness::Ready
        } else {
            Readiness::NotReady
        })
    }

    /// Mark a character as inside the eye. Returns `false` for artifacts and
    /// for characters that were already inside.
    pub fn enter_eye(&mut self) -> bool {
        match &mut self.kind {
            EntityKind::Character(traits) => traits.enter_eye(),
            EntityKind::Artifact(_) => false,
        }
    }

    /// Record a bond to `other`. Bonding lowers entropy by one step.
    ///
    /// Returns `false` if the bond was already present.
    pub fn bond_with(&mut self, other: &str) -> bool {
        let added = self.bonds.insert(other.to_string());
        if added {
            self.entropy = clamp_unit(self.entropy - ENTROPY_STEP);
        }
        added
    }

    /// Drop a bond to `other`. Unbonding raises entropy by one step.
    pub fn unbond_from(&mut self, other: &str) -> bool {
        let removed = self.bonds.remove(other);
        if removed {
            self.entropy = clamp_unit(self.entropy + ENTROPY_STEP);
        }
        removed
    }

    /// Replace the polarity and return the movement signal describing it.
    ///
    /// The old polarity is archived on the diagonal.
    pub fn move_to_polarity(&mut self, new_polarity: PolarityState, at: f64) -> Signal {
        let distance = self.polarity.distance_to(&new_polarity);
        self.replace_polarity(new_polarity);

        Signal::new(self.name.clone(), self.name.clone(), SignalKind::Movement, at)
            .with_polarity_change(new_polarity)
            .with_friction(f32::from(distance) / 3.0)
            .with_location(new_polarity)
            .with_generation(self.generation)
            .with_lineage(self.lineage.clone())
    }

    /// Reincarnate this record from a generational birth signal.
    pub fn rebirth(&mut self, polarity: PolarityState, birth: Signal) {
        self.replace_polarity(polarity);
        self.generation = birth.generation;
        self.lineage = birth.lineage.clone();
        self.birth_signal = Some(birth);
    }

    pub fn set_birth_signal(&mut self, signal: Signal) {
        self.birth_signal = Some(signal);
    }

    /// Overwrite mutable state from a persisted snapshot.
    ///
    /// The eye flag can only be raised here, never lowered.
    pub fn restore(
        &mut self,
        polarity: PolarityState,
        entropy: f32,
        generation: u32,
        lineage: Vec<String>,
        inside_eye: bool,
    ) {
        if polarity != self.polarity {
            self.replace_polarity(polarity);
        }
        self.entropy = clamp_unit(entropy);
        self.generation = generation;
        self.lineage = lineage;
        if inside_eye {
            self.enter_eye();
        }
    }

    fn replace_polarity(&mut self, polarity: PolarityState) {
        self.diagonal.push(self.polarity);
        self.polarity = polarity;
    }
}
