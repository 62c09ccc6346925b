//! Game mechanics: bond types, entropy rules and the exclusion state machine.

use serde::{Deserialize, Serialize};

/// Entropy change applied to an entity when it gains or loses a bond.
pub const ENTROPY_STEP: f32 = 0.1;

/// Entropy must be strictly below this for a character to enter the eye.
pub const READY_ENTROPY_THRESHOLD: f32 = 0.8;

/// Entropy given to entities whose roster entry does not specify one.
pub const DEFAULT_ENTROPY: f32 = 0.5;

/// All possible bond types between two entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BondType {
    Trust,
    Opposition,
    Protection,
    Dependency,
    Mirror,
    Mediated,
    Unknown,
}

impl BondType {
    pub const ALL: [BondType; 7] = [
        BondType::Trust,
        BondType::Opposition,
        BondType::Protection,
        BondType::Dependency,
        BondType::Mirror,
        BondType::Mediated,
        BondType::Unknown,
    ];

    /// Get the display name.
    pub fn name(&self) -> &'static str {
        match self {
            BondType::Trust => "TRUST",
            BondType::Opposition => "OPPOSITION",
            BondType::Protection => "PROTECTION",
            BondType::Dependency => "DEPENDENCY",
            BondType::Mirror => "MIRROR",
            BondType::Mediated => "MEDIATED",
            BondType::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for BondType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Where a character stands in the exclusion lifecycle.
///
/// `NotReady -> Ready -> InsideEye`; the last state is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Readiness {
    NotReady,
    Ready,
    InsideEye,
}

/// Clamp a coherence or strength scalar into `[0, 1]`.
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}
