//! Persistence formats.
//!
//! Two JSON shapes are produced:
//! - [`SaveFile`]: per-entity `{ polarity, bonds, generation }` keyed by name
//! - [`WorldSnapshot`]: the full engine state
//!
//! Restoring from a snapshot either rebuilds the whole engine or fails; a
//! partially populated engine is never returned.

use heartshard_rules::{BondType, PolarityState, Roster};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::config::EngineConfig;
use crate::engine::GenerationEngine;
use crate::error::SetupError;
use crate::relationship::BondSnapshot;
use crate::timeline::TimelineSummary;

/// Errors raised while reading or applying persisted state.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("malformed save data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("save names unknown entity '{0}'")]
    UnknownEntity(String),

    #[error("roster entity '{0}' is missing from the save")]
    MissingEntity(String),

    #[error("bond '{key}' names unknown entity '{missing}'")]
    UnknownBondMember { key: String, missing: String },

    #[error("malformed bond key '{0}', expected \"a|b\"")]
    MalformedBondKey(String),

    #[error("bond list of '{0}' disagrees with the bond graph")]
    InconsistentBonds(String),

    #[error("'{0}' disagrees between the eye list and its entity record")]
    EyeMismatch(String),

    #[error("{owner}: {field} = {value} is outside [0, 1]")]
    OutOfRange {
        owner: String,
        field: &'static str,
        value: f64,
    },

    #[error("could not build engine: {0}")]
    Setup(#[from] SetupError),
}

/// One entity in the per-entity save format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySave {
    pub polarity: PolarityState,
    pub bonds: Vec<String>,
    pub generation: u32,
}

/// Per-entity save file: name -> polarity, bonds and generation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaveFile {
    pub entities: BTreeMap<String, EntitySave>,
}

impl SaveFile {
    pub fn to_json_pretty(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// One entity inside a [`WorldSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub polarity: PolarityState,
    pub entropy: f32,
    pub bonds: Vec<String>,
    pub inside_eye: bool,
    #[serde(default = "first_generation")]
    pub generation: u32,
    #[serde(default)]
    pub lineage: Vec<String>,
}

fn first_generation() -> u32 {
    1
}

/// Full engine state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub playthrough: u32,
    pub entities: BTreeMap<String, EntityState>,
    pub bonds: BondSnapshot,
    pub timeline: TimelineSummary,
    pub entered_eye: Vec<String>,
}

impl WorldSnapshot {
    pub fn to_json_pretty(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(source: &str) -> Result<Self, PersistError> {
        Ok(serde_json::from_str(source)?)
    }
}

fn check_unit(owner: &str, field: &'static str, value: f32) -> Result<(), PersistError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(PersistError::OutOfRange {
            owner: owner.to_string(),
            field,
            value: f64::from(value),
        })
    }
}

fn split_key(key: &str) -> Result<(&str, &str), PersistError> {
    match key.split_once('|') {
        Some((a, b)) if !a.is_empty() && !b.is_empty() && a != b => Ok((a, b)),
        _ => Err(PersistError::MalformedBondKey(key.to_string())),
    }
}

impl GenerationEngine {
    /// Export the per-entity save format.
    pub fn save_state(&self) -> SaveFile {
        SaveFile {
            entities: self
                .entities()
                .map(|entity| {
                    (
                        entity.name().to_string(),
                        EntitySave {
                            polarity: entity.polarity(),
                            bonds: entity.bonds().iter().cloned().collect(),
                            generation: entity.generation(),
                        },
                    )
                })
                .collect(),
        }
    }

    /// Export the full engine state.
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            playthrough: self.playthrough(),
            entities: self
                .entities()
                .map(|entity| {
                    (
                        entity.name().to_string(),
                        EntityState {
                            polarity: entity.polarity(),
                            entropy: entity.entropy(),
                            bonds: entity.bonds().iter().cloned().collect(),
                            inside_eye: entity.inside_eye(),
                            generation: entity.generation(),
                            lineage: entity.lineage().to_vec(),
                        },
                    )
                })
                .collect(),
            bonds: self.relationships().snapshot(),
            timeline: self.timeline().state_snapshot(),
            entered_eye: self.entered_eye().iter().cloned().collect(),
        }
    }

    /// Rebuild an engine from a roster and a full-state snapshot.
    ///
    /// The roster supplies entity kinds and traits; the snapshot overrides
    /// every piece of mutable state. Timeline history is not persisted, so the
    /// restored engine starts a fresh timeline.
    pub fn from_snapshot(
        config: EngineConfig,
        roster: &Roster,
        snapshot: &WorldSnapshot,
    ) -> Result<Self, PersistError> {
        let rng = config.seeded_rng();
        let mut engine = Self::cast(config, roster, rng)?;

        for name in snapshot.entities.keys() {
            if engine.entity(name).is_none() {
                return Err(PersistError::UnknownEntity(name.clone()));
            }
        }
        let roster_names: Vec<String> = engine.entities().map(|e| e.name().to_string()).collect();
        for name in roster_names {
            if !snapshot.entities.contains_key(&name) {
                return Err(PersistError::MissingEntity(name));
            }
        }

        for (name, state) in &snapshot.entities {
            check_unit(name, "entropy", state.entropy)?;
        }
        for (key, summary) in &snapshot.bonds.bonds {
            check_unit(key, "strength", summary.strength)?;
        }
        for (field, time) in [
            ("taken_at", snapshot.bonds.taken_at),
            ("current_time", snapshot.timeline.current_time),
        ] {
            if !(time.is_finite() && time >= 0.0) {
                return Err(PersistError::OutOfRange {
                    owner: "snapshot".to_string(),
                    field,
                    value: time,
                });
            }
        }

        let now = snapshot.bonds.taken_at.max(snapshot.timeline.current_time);
        engine.restore_counters(
            snapshot.playthrough,
            snapshot.entered_eye.iter().cloned().collect(),
            now,
        );

        for (key, summary) in &snapshot.bonds.bonds {
            let (a, b) = split_key(key)?;
            for name in [a, b] {
                if engine.entity(name).is_none() {
                    return Err(PersistError::UnknownBondMember {
                        key: key.clone(),
                        missing: name.to_string(),
                    });
                }
            }
            restore_bond(&mut engine, a, b, summary.bond_type, summary.strength);
        }

        for (name, state) in &snapshot.entities {
            let recorded: BTreeSet<String> = state.bonds.iter().cloned().collect();
            let actual: BTreeSet<String> = engine
                .bond_keys_of(name)
                .iter()
                .filter_map(|key| key.other(name).map(str::to_string))
                .collect();
            if recorded != actual {
                return Err(PersistError::InconsistentBonds(name.clone()));
            }

            if let Some(entity) = engine.entity_mut(name) {
                entity.restore(
                    state.polarity,
                    state.entropy,
                    state.generation,
                    state.lineage.clone(),
                    state.inside_eye,
                );
            }
        }

        for (a, b) in &snapshot.bonds.collapsed {
            for name in [a, b] {
                if engine.entity(name).is_none() {
                    return Err(PersistError::UnknownEntity(name.clone()));
                }
            }
            engine.matrix_mut().get_bond(a, b);
        }

        for name in &snapshot.entered_eye {
            if engine.entity(name).is_none() {
                return Err(PersistError::UnknownEntity(name.clone()));
            }
        }
        let listed: BTreeSet<&str> = snapshot.entered_eye.iter().map(String::as_str).collect();
        let inside: BTreeSet<&str> = engine
            .entities()
            .filter(|e| e.inside_eye())
            .map(|e| e.name())
            .collect();
        if let Some(name) = listed.symmetric_difference(&inside).next() {
            return Err(PersistError::EyeMismatch(name.to_string()));
        }

        tracing::info!(
            "restored {} entities and {} bonds at playthrough {}",
            snapshot.entities.len(),
            snapshot.bonds.bonds.len(),
            snapshot.playthrough
        );
        Ok(engine)
    }
}

fn restore_bond(engine: &mut GenerationEngine, a: &str, b: &str, bond_type: BondType, strength: f32) {
    engine
        .matrix_mut()
        .create_or_strengthen_bond(a, b, bond_type, strength);
    for (name, other) in [(a, b), (b, a)] {
        if let Some(entity) = engine.entity_mut(name) {
            entity.bond_with(other);
        }
    }
}
