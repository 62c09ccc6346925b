//! Bond definitions - edges in the relationship matrix.

use heartshard_rules::{clamp_unit, BondType, Signal};
use serde::{Deserialize, Serialize};

/// Normalized key for an unordered pair of entity names.
///
/// `(a, b)` and `(b, a)` produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BondKey {
    low: String,
    high: String,
}

impl BondKey {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self {
                low: a.to_string(),
                high: b.to_string(),
            }
        } else {
            Self {
                low: b.to_string(),
                high: a.to_string(),
            }
        }
    }

    /// Both names, in sorted order.
    pub fn names(&self) -> (&str, &str) {
        (&self.low, &self.high)
    }

    pub fn involves(&self, name: &str) -> bool {
        self.low == name || self.high == name
    }

    /// The member of the pair that is not `name`.
    pub fn other(&self, name: &str) -> Option<&str> {
        if self.low == name {
            Some(&self.high)
        } else if self.high == name {
            Some(&self.low)
        } else {
            None
        }
    }
}

impl std::fmt::Display for BondKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}", self.low, self.high)
    }
}

/// A symmetric, typed, strength-weighted relation between two entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bond {
    pub key: BondKey,
    pub bond_type: BondType,
    /// Strength from 0.0 to 1.0.
    strength: f32,
    pub formed_at: f64,
    /// Signals that travelled along this bond.
    pub signals: Vec<Signal>,
}

impl Bond {
    /// Create a bond between two names.
    pub fn new(a: &str, b: &str, bond_type: BondType, strength: f32, formed_at: f64) -> Self {
        Self {
            key: BondKey::new(a, b),
            bond_type,
            strength: clamp_unit(strength),
            formed_at,
            signals: Vec::new(),
        }
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }

    /// Add half of `amount` to the strength, saturating at 1.0.
    ///
    /// A NaN amount leaves the bond unchanged.
    pub fn strengthen(&mut self, amount: f32) {
        if amount.is_nan() {
            return;
        }
        self.strength = clamp_unit(self.strength + amount * 0.5);
    }

    pub fn involves(&self, name: &str) -> bool {
        self.key.involves(name)
    }
}

/// A bond suggested by next-generation derivation but not yet committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedBond {
    pub a: String,
    pub b: String,
    pub bond_type: BondType,
    pub strength: f32,
    /// Hamming distance between the two polarities when proposed.
    pub distance: u8,
    /// Formation probability that the draw beat.
    pub probability: f64,
}
