//! Roster - the fixed cast an engine starts from, loaded from TOML.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::{ArtifactTraits, BondType, CharacterTraits, Entity, PolarityState};

const DEFAULT_ROSTER: &str = include_str!("default_roster.toml");

/// Strength given to seed bonds that do not specify one.
pub const DEFAULT_SEED_STRENGTH: f32 = 0.5;

/// Errors raised while loading a roster.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("failed to parse roster: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("entity name '{0}' appears more than once")]
    DuplicateName(String),

    #[error("seed bond {a}-{b} names '{missing}', which is not in the roster")]
    UnknownBondMember {
        a: String,
        b: String,
        missing: String,
    },

    #[error("seed bond {0}-{0} bonds an entity to itself")]
    SelfBond(String),

    #[error("entity name '{0}' must be non-empty and may not contain '|'")]
    InvalidName(String),

    #[error("{owner}: {field} = {value} is outside {range}")]
    OutOfRange {
        owner: String,
        field: &'static str,
        value: f32,
        range: &'static str,
    },

    #[error("{owner} refers to '{missing}', which is not a {expected} in the roster")]
    UnknownReference {
        owner: String,
        missing: String,
        expected: &'static str,
    },
}

/// A character entry in the roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterEntry {
    pub name: String,
    pub polarity: PolarityState,
    pub archetype: String,
    pub core_wound: String,
    #[serde(default)]
    pub entropy: Option<f32>,
    /// Name of the artifact the character carries.
    #[serde(default)]
    pub artifact: Option<String>,
}

/// An artifact entry in the roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactEntry {
    pub name: String,
    pub polarity: PolarityState,
    pub artifact_type: String,
    pub power_level: f32,
    #[serde(default)]
    pub holder: Option<String>,
}

/// A bond that exists before play begins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedBond {
    pub a: String,
    pub b: String,
    pub bond_type: BondType,
    #[serde(default = "default_seed_strength")]
    pub strength: f32,
}

fn default_seed_strength() -> f32 {
    DEFAULT_SEED_STRENGTH
}

/// Whether `name` can be used as an entity name.
///
/// `|` separates the two names of a bond key in snapshots.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('|')
}

fn check_unit(owner: &str, field: &'static str, value: f32) -> Result<(), RosterError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(RosterError::OutOfRange {
            owner: owner.to_string(),
            field,
            value,
            range: "[0, 1]",
        })
    }
}

/// The starting cast and their seed bonds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    #[serde(default, rename = "character")]
    pub characters: Vec<CharacterEntry>,
    #[serde(default, rename = "artifact")]
    pub artifacts: Vec<ArtifactEntry>,
    #[serde(default, rename = "bond")]
    pub bonds: Vec<SeedBond>,
}

impl Roster {
    /// Parse and validate a roster from TOML.
    pub fn from_toml_str(source: &str) -> Result<Self, RosterError> {
        let roster: Roster = toml::from_str(source)?;
        roster.validate()?;
        Ok(roster)
    }

    /// The built-in first-generation cast.
    pub fn builtin() -> Result<Self, RosterError> {
        Self::from_toml_str(DEFAULT_ROSTER)
    }

    /// Check names, seed bonds and artifact references.
    ///
    /// A roster with any dangling reference is rejected as a whole.
    pub fn validate(&self) -> Result<(), RosterError> {
        let mut names = BTreeSet::new();
        let entry_names = self
            .characters
            .iter()
            .map(|c| c.name.as_str())
            .chain(self.artifacts.iter().map(|a| a.name.as_str()));
        for name in entry_names {
            if !is_valid_name(name) {
                return Err(RosterError::InvalidName(name.to_string()));
            }
            if !names.insert(name) {
                return Err(RosterError::DuplicateName(name.to_string()));
            }
        }

        for character in &self.characters {
            if let Some(entropy) = character.entropy {
                check_unit(&character.name, "entropy", entropy)?;
            }
        }
        for artifact in &self.artifacts {
            if !(artifact.power_level.is_finite() && artifact.power_level >= 0.0) {
                return Err(RosterError::OutOfRange {
                    owner: artifact.name.clone(),
                    field: "power_level",
                    value: artifact.power_level,
                    range: "[0, inf)",
                });
            }
        }

        for bond in &self.bonds {
            check_unit(&format!("seed bond {}-{}", bond.a, bond.b), "strength", bond.strength)?;
            if bond.a == bond.b {
                return Err(RosterError::SelfBond(bond.a.clone()));
            }
            for member in [&bond.a, &bond.b] {
                if !names.contains(member.as_str()) {
                    return Err(RosterError::UnknownBondMember {
                        a: bond.a.clone(),
                        b: bond.b.clone(),
                        missing: member.clone(),
                    });
                }
            }
        }

        for character in &self.characters {
            if let Some(artifact) = &character.artifact {
                if !self.artifacts.iter().any(|a| &a.name == artifact) {
                    return Err(RosterError::UnknownReference {
                        owner: character.name.clone(),
                        missing: artifact.clone(),
                        expected: "artifact",
                    });
                }
            }
        }

        for artifact in &self.artifacts {
            if let Some(holder) = &artifact.holder {
                if !self.characters.iter().any(|c| &c.name == holder) {
                    return Err(RosterError::UnknownReference {
                        owner: artifact.name.clone(),
                        missing: holder.clone(),
                        expected: "character",
                    });
                }
            }
        }

        Ok(())
    }

    /// Build first-generation entities, characters first.
    pub fn entities(&self) -> Vec<Entity> {
        let characters = self.characters.iter().map(|entry| {
            let mut traits = CharacterTraits::new(&entry.archetype, &entry.core_wound);
            if let Some(artifact) = &entry.artifact {
                traits = traits.with_bonded_artifact(artifact);
            }
            let entity = Entity::character(&entry.name, entry.polarity, traits);
            match entry.entropy {
                Some(entropy) => entity.with_entropy(entropy),
                None => entity,
            }
        });

        let artifacts = self.artifacts.iter().map(|entry| {
            let mut traits = ArtifactTraits::new(&entry.artifact_type, entry.power_level);
            if let Some(holder) = &entry.holder {
                traits = traits.with_bonded_character(holder);
            }
            Entity::artifact(&entry.name, entry.polarity, traits)
        });

        characters.chain(artifacts).collect()
    }
}
