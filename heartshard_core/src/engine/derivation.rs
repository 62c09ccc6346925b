//! Next-generation derivation ("similar salt").
//!
//! # Algorithm
//!
//! 1. Enumerate the seven candidate polarities that share at least one axis
//!    with the parent: itself, the three single flips and the three double flips
//! 2. Draw one candidate uniformly
//! 3. For every other active character, map the Hamming distance to the
//!    chosen polarity onto a formation probability and a set of bond types
//! 4. Roll once per pair; winners become proposed bonds

use heartshard_rules::{Axis, BondType, PolarityState};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::relationship::ProposedBond;

/// Number of similar-salt candidates for any parent.
pub const CANDIDATE_COUNT: usize = 7;

/// Which derivation the `gen` command runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DerivationStrategy {
    /// Commit the bonds proposed by similar-salt rebirth.
    #[default]
    SimilarSalt,
    /// Bridge the excluded character's neighbors and disturb bystanders.
    ExclusionRipple,
}

impl std::str::FromStr for DerivationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "similar_salt" | "similar-salt" => Ok(DerivationStrategy::SimilarSalt),
            "exclusion_ripple" | "exclusion-ripple" | "ripple" => {
                Ok(DerivationStrategy::ExclusionRipple)
            }
            other => Err(format!("unknown strategy '{}'", other)),
        }
    }
}

/// The configuration derived for the next generation of a departing character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextGeneration {
    pub parent: String,
    pub parent_polarity: PolarityState,
    pub candidates: Vec<PolarityState>,
    pub chosen: PolarityState,
    pub generation: u32,
    pub lineage: Vec<String>,
    /// Bonds to form if the caller commits this generation.
    pub proposed_bonds: Vec<ProposedBond>,
}

/// Candidate polarities for a rebirth, in a fixed order.
///
/// The full inversion is never a candidate.
pub fn similar_salt_candidates(parent: PolarityState) -> [PolarityState; CANDIDATE_COUNT] {
    [
        parent,
        parent.flip(Axis::X),
        parent.flip(Axis::Y),
        parent.flip(Axis::Z),
        parent.flip(Axis::X).flip(Axis::Y),
        parent.flip(Axis::X).flip(Axis::Z),
        parent.flip(Axis::Y).flip(Axis::Z),
    ]
}

/// Draw the next polarity uniformly from the candidates.
pub fn choose_next_polarity<R: Rng>(parent: PolarityState, rng: &mut R) -> PolarityState {
    let candidates = similar_salt_candidates(parent);
    candidates[rng.gen_range(0..CANDIDATE_COUNT)]
}

const NEAR_TYPES: &[BondType] = &[BondType::Trust, BondType::Protection];
const MID_TYPES: &[BondType] = &[BondType::Dependency, BondType::Mirror];
const FAR_TYPES: &[BondType] = &[BondType::Unknown];

/// Formation probability and eligible bond types for a polarity distance.
pub fn bond_odds(distance: u8) -> (f64, &'static [BondType]) {
    match distance {
        0 | 1 => (0.8, NEAR_TYPES),
        2 => (0.5, MID_TYPES),
        _ => (0.2, FAR_TYPES),
    }
}

/// Roll bonds between a reborn character and each of `others`.
///
/// `others` is visited in order, one probability draw per pair plus one type
/// draw for each pair that forms.
pub fn propose_bonds<R: Rng>(
    reborn: &str,
    polarity: PolarityState,
    others: &[(String, PolarityState)],
    strength: f32,
    rng: &mut R,
) -> Vec<ProposedBond> {
    let mut proposed = Vec::new();

    for (other, other_polarity) in others {
        let distance = polarity.distance_to(other_polarity);
        let (probability, types) = bond_odds(distance);

        if rng.gen::<f64>() < probability {
            let bond_type = types[rng.gen_range(0..types.len())];
            proposed.push(ProposedBond {
                a: reborn.to_string(),
                b: other.clone(),
                bond_type,
                strength,
                distance,
                probability,
            });
        }
    }

    proposed
}
