//! Relationship Matrix - the symmetric bond graph between entities.

use heartshard_rules::{clamp_unit, BondType, Signal};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{Bond, BondKey};

/// Whether a bond write created a new edge or reinforced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondUpdate {
    Created,
    Strengthened,
}

/// Type and strength of one bond inside a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondSummary {
    pub bond_type: BondType,
    pub strength: f32,
}

/// Immutable copy of the bond graph at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondSnapshot {
    /// `"a|b"` (sorted pair) -> type and strength.
    pub bonds: BTreeMap<String, BondSummary>,
    /// Pairs that have been observed, sorted.
    pub collapsed: Vec<(String, String)>,
    pub taken_at: f64,
}

/// The bond graph.
///
/// Pairs start in superposition; looking one up through
/// [`RelationshipMatrix::get_bond`] collapses it, whether or not a bond exists.
#[derive(Debug, Clone, Default)]
pub struct RelationshipMatrix {
    bonds: BTreeMap<BondKey, Bond>,
    collapsed: BTreeSet<BondKey>,
    now: f64,
}

impl RelationshipMatrix {
    /// Create an empty matrix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the matrix clock forward. Earlier times are ignored.
    pub fn set_time(&mut self, now: f64) {
        if now > self.now {
            self.now = now;
        }
    }

    /// Create a bond, or reinforce the existing one keeping its type.
    pub fn create_or_strengthen_bond(
        &mut self,
        a: &str,
        b: &str,
        bond_type: BondType,
        strength: f32,
    ) -> (&Bond, BondUpdate) {
        let key = BondKey::new(a, b);
        let update = if self.bonds.contains_key(&key) {
            BondUpdate::Strengthened
        } else {
            BondUpdate::Created
        };

        let now = self.now;
        let bond = self
            .bonds
            .entry(key)
            .and_modify(|existing| existing.strengthen(strength))
            .or_insert_with(|| Bond::new(a, b, bond_type, strength, now));

        tracing::debug!(
            "bond {} {:?}: {} at {:.2}",
            bond.key,
            update,
            bond.bond_type,
            bond.strength()
        );
        (bond, update)
    }

    /// Look up a bond, collapsing the pair out of superposition.
    pub fn get_bond(&mut self, a: &str, b: &str) -> Option<&Bond> {
        let key = BondKey::new(a, b);
        if !self.collapsed.contains(&key) {
            tracing::debug!("pair {} collapsed by observation", key);
        }
        self.collapsed.insert(key.clone());
        self.bonds.get(&key)
    }

    /// Check whether a pair has been observed.
    pub fn is_collapsed(&self, a: &str, b: &str) -> bool {
        self.collapsed.contains(&BondKey::new(a, b))
    }

    /// Every name bonded to `name`, regardless of collapse state.
    pub fn bonded_neighbors(&self, name: &str) -> BTreeSet<String> {
        self.bonds
            .keys()
            .filter_map(|key| key.other(name))
            .map(str::to_string)
            .collect()
    }

    /// Remove a bond. The pair's collapse state is kept.
    pub fn remove_bond(&mut self, a: &str, b: &str) -> Option<Bond> {
        self.bonds.remove(&BondKey::new(a, b))
    }

    /// Attach a signal to an existing bond.
    pub fn attach_signal(&mut self, a: &str, b: &str, signal: Signal) -> bool {
        match self.bonds.get_mut(&BondKey::new(a, b)) {
            Some(bond) => {
                bond.signals.push(signal);
                true
            }
            None => false,
        }
    }

    /// Synthesize a direct bond between `a` and `b` after their mediator is gone.
    ///
    /// When both held a bond to the mediator, the new type is the shared prior
    /// type (or a coin flip between OPPOSITION and DEPENDENCY when they differ)
    /// and the strength is the mean of the two prior strengths. Otherwise the
    /// type is uniform over all types and the strength uniform in `[0.3, 0.7]`.
    pub fn collapse_new_bond<R: Rng>(
        &mut self,
        a: &str,
        b: &str,
        excluded_mediator: &str,
        rng: &mut R,
    ) -> (Bond, BondUpdate) {
        let prior_a = self.bonds.get(&BondKey::new(a, excluded_mediator));
        let prior_b = self.bonds.get(&BondKey::new(b, excluded_mediator));

        let (bond_type, strength) = match (prior_a, prior_b) {
            (Some(bond_a), Some(bond_b)) => {
                let bond_type = if bond_a.bond_type == bond_b.bond_type {
                    bond_a.bond_type
                } else if rng.gen_bool(0.5) {
                    BondType::Opposition
                } else {
                    BondType::Dependency
                };
                (bond_type, (bond_a.strength() + bond_b.strength()) / 2.0)
            }
            _ => {
                let bond_type = *BondType::ALL
                    .choose(rng)
                    .unwrap_or(&BondType::Unknown);
                (bond_type, rng.gen_range(0.3f32..=0.7))
            }
        };

        let (bond, update) = self.create_or_strengthen_bond(a, b, bond_type, clamp_unit(strength));
        (bond.clone(), update)
    }

    /// Immutable copy of every bond and the collapsed set.
    pub fn snapshot(&self) -> BondSnapshot {
        BondSnapshot {
            bonds: self
                .bonds
                .iter()
                .map(|(key, bond)| {
                    (
                        key.to_string(),
                        BondSummary {
                            bond_type: bond.bond_type,
                            strength: bond.strength(),
                        },
                    )
                })
                .collect(),
            collapsed: self
                .collapsed
                .iter()
                .map(|key| {
                    let (low, high) = key.names();
                    (low.to_string(), high.to_string())
                })
                .collect(),
            taken_at: self.now,
        }
    }

    /// Iterate over all bonds in key order.
    pub fn iter(&self) -> impl Iterator<Item = &Bond> {
        self.bonds.values()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    pub fn collapsed_count(&self) -> usize {
        self.collapsed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heartshard_rules::SignalKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_create_and_get_symmetric() {
        let mut matrix = RelationshipMatrix::new();
        matrix.create_or_strengthen_bond("Lila", "Theo", BondType::Trust, 0.5);

        let forward = matrix.get_bond("Lila", "Theo").cloned();
        let backward = matrix.get_bond("Theo", "Lila").cloned();

        assert!(forward.is_some());
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_strengthen_keeps_type() {
        let mut matrix = RelationshipMatrix::new();
        matrix.create_or_strengthen_bond("A", "B", BondType::Trust, 0.5);
        let (bond, update) = matrix.create_or_strengthen_bond("B", "A", BondType::Opposition, 0.4);

        assert_eq!(update, BondUpdate::Strengthened);
        assert_eq!(bond.bond_type, BondType::Trust);
        assert!((bond.strength() - 0.7).abs() < 1e-6);
        assert_eq!(matrix.bond_count(), 1);
    }

    #[test]
    fn test_strength_saturates() {
        let mut matrix = RelationshipMatrix::new();
        for _ in 0..10 {
            matrix.create_or_strengthen_bond("A", "B", BondType::Mirror, 0.9);
        }
        let bond = matrix.get_bond("A", "B").unwrap();
        assert_eq!(bond.strength(), 1.0);
    }

    #[test]
    fn test_get_bond_collapses_even_when_absent() {
        let mut matrix = RelationshipMatrix::new();
        assert!(!matrix.is_collapsed("A", "B"));

        assert!(matrix.get_bond("B", "A").is_none());
        assert!(matrix.is_collapsed("A", "B"));
        assert_eq!(matrix.bond_count(), 0);
    }

    #[test]
    fn test_bonded_neighbors_ignore_collapse() {
        let mut matrix = RelationshipMatrix::new();
        matrix.create_or_strengthen_bond("Kai", "Ori", BondType::Dependency, 0.5);
        matrix.create_or_strengthen_bond("Lila", "Kai", BondType::Mirror, 0.5);
        matrix.create_or_strengthen_bond("Ayni", "Ion", BondType::Protection, 0.5);
        matrix.get_bond("Kai", "Ori");

        let neighbors = matrix.bonded_neighbors("Kai");
        assert_eq!(neighbors.len(), 2);
        assert!(neighbors.contains("Ori"));
        assert!(neighbors.contains("Lila"));
    }

    #[test]
    fn test_collapse_reuses_shared_type() {
        let mut matrix = RelationshipMatrix::new();
        matrix.create_or_strengthen_bond("A", "M", BondType::Trust, 0.4);
        matrix.create_or_strengthen_bond("B", "M", BondType::Trust, 0.8);

        let mut rng = StdRng::seed_from_u64(7);
        let (bond, update) = matrix.collapse_new_bond("A", "B", "M", &mut rng);

        assert_eq!(update, BondUpdate::Created);
        assert_eq!(bond.bond_type, BondType::Trust);
        assert!((bond.strength() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_collapse_mixed_types() {
        let mut matrix = RelationshipMatrix::new();
        matrix.create_or_strengthen_bond("A", "M", BondType::Trust, 0.2);
        matrix.create_or_strengthen_bond("B", "M", BondType::Mirror, 0.6);

        let mut rng = StdRng::seed_from_u64(11);
        let (bond, _) = matrix.collapse_new_bond("A", "B", "M", &mut rng);

        assert!(matches!(
            bond.bond_type,
            BondType::Opposition | BondType::Dependency
        ));
        assert!((bond.strength() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_collapse_without_history() {
        let mut matrix = RelationshipMatrix::new();
        let mut rng = StdRng::seed_from_u64(3);
        let (bond, _) = matrix.collapse_new_bond("A", "B", "M", &mut rng);

        assert!(bond.strength() >= 0.3 && bond.strength() <= 0.7);
        assert!(matrix.bonded_neighbors("A").contains("B"));
    }

    #[test]
    fn test_collapse_is_reproducible() {
        let run = |seed| {
            let mut matrix = RelationshipMatrix::new();
            let mut rng = StdRng::seed_from_u64(seed);
            matrix.collapse_new_bond("A", "B", "M", &mut rng).0
        };
        assert_eq!(run(99), run(99));
    }

    #[test]
    fn test_snapshot_contents() {
        let mut matrix = RelationshipMatrix::new();
        matrix.set_time(5.0);
        matrix.create_or_strengthen_bond("Theo", "Lila", BondType::Trust, 0.6);
        matrix.get_bond("Kai", "Ori");

        let snapshot = matrix.snapshot();
        assert_eq!(snapshot.taken_at, 5.0);
        assert_eq!(snapshot.bonds["Lila|Theo"].bond_type, BondType::Trust);
        assert_eq!(snapshot.collapsed, vec![("Kai".to_string(), "Ori".to_string())]);

        // Later writes do not reach the snapshot
        matrix.create_or_strengthen_bond("Lila", "Theo", BondType::Trust, 0.6);
        assert!((snapshot.bonds["Lila|Theo"].strength - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_remove_and_attach() {
        let mut matrix = RelationshipMatrix::new();
        matrix.create_or_strengthen_bond("A", "B", BondType::Trust, 0.5);

        let signal = Signal::new("A", "A", SignalKind::Movement, 1.0);
        assert!(matrix.attach_signal("B", "A", signal.clone()));
        assert!(!matrix.attach_signal("A", "C", signal));

        let removed = matrix.remove_bond("B", "A").unwrap();
        assert_eq!(removed.signals.len(), 1);
        assert!(matrix.bonded_neighbors("A").is_empty());
    }
}
