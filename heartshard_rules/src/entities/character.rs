//! Character definitions.

use serde::{Deserialize, Serialize};

/// Data specific to characters - the only entities that can enter the eye.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterTraits {
    pub archetype: String,
    pub core_wound: String,
    /// Name of the artifact this character carries, if any.
    pub bonded_artifact: Option<String>,

    /// Terminal flag; set once by [`CharacterTraits::enter_eye`] and never cleared.
    #[serde(default)]
    inside_eye: bool,
}

impl CharacterTraits {
    /// Create character traits from an archetype and a core wound.
    pub fn new(archetype: impl Into<String>, core_wound: impl Into<String>) -> Self {
        Self {
            archetype: archetype.into(),
            core_wound: core_wound.into(),
            bonded_artifact: None,
            inside_eye: false,
        }
    }

    /// Attach an artifact by name.
    pub fn with_bonded_artifact(mut self, artifact: impl Into<String>) -> Self {
        self.bonded_artifact = Some(artifact.into());
        self
    }

    /// Check whether the character has entered the eye.
    pub fn inside_eye(&self) -> bool {
        self.inside_eye
    }

    /// Mark the character as inside the eye.
    ///
    /// Returns `false` if it was already there.
    pub fn enter_eye(&mut self) -> bool {
        !std::mem::replace(&mut self.inside_eye, true)
    }
}
