//! Artifact definitions.

use serde::{Deserialize, Serialize};

/// Data specific to artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactTraits {
    pub artifact_type: String,
    /// Name of the character holding this artifact.
    pub bonded_character: Option<String>,
    pub power_level: f32,
}

impl ArtifactTraits {
    /// Create artifact traits with no holder.
    pub fn new(artifact_type: impl Into<String>, power_level: f32) -> Self {
        Self {
            artifact_type: artifact_type.into(),
            bonded_character: None,
            power_level,
        }
    }

    /// Assign the holder.
    pub fn with_bonded_character(mut self, character: impl Into<String>) -> Self {
        self.bonded_character = Some(character.into());
        self
    }
}
