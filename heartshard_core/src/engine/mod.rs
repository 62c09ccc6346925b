//! Generation Engine - admission, exclusion and next-generation derivation.
//!
//! Each character moves through `NotReady -> Ready -> InsideEye`. A ready
//! character (at least one bond, entropy below 0.8) may enter the maw, which:
//! 1. **Birth**: broadcasts a generational birth signal from its polarity
//! 2. **Rebirth**: reincarnates the same record at a similar-salt polarity
//! 3. **Proposal**: rolls bonds between the reborn and every active character
//! 4. **Exclusion**: records the departure and branches the timeline
//!
//! Proposed bonds only reach the relationship matrix when the caller commits
//! them, either directly or through [`GenerationEngine::next_generation`].

mod derivation;

pub use derivation::*;

use heartshard_rules::{
    is_valid_name, Axis, BondType, Entity, Polarity, PolarityState, Readiness, Roster, Signal,
    SignalKind, WorldClock,
};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::EngineConfig;
use crate::error::{EngineError, SetupError};
use crate::relationship::{Bond, BondKey, BondUpdate, ProposedBond, RelationshipMatrix};
use crate::timeline::{ExclusionEvent, Timeline, TimelineId};

/// Target name used by signals that go into the maw.
pub const MAW: &str = "maw";

/// Result of a successful [`GenerationEngine::enter_maw`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MawOutcome {
    pub birth: Signal,
    pub next_generation: NextGeneration,
    pub playthrough: u32,
    pub healing: f32,
    pub branch: TimelineId,
}

/// An axis flip applied to a bystander by the exclusion ripple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disturbance {
    pub entity: String,
    pub axis: Axis,
    pub from: PolarityState,
    pub to: PolarityState,
}

/// Result of [`GenerationEngine::reshuffle_from_exclusion`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RippleOutcome {
    pub excluded: String,
    /// Bonds synthesized between former neighbors of the excluded character.
    pub bridged: Vec<Bond>,
    pub disturbed: Vec<Disturbance>,
}

/// Result of [`GenerationEngine::next_generation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum GenerationOutcome {
    Committed { bonds: Vec<ProposedBond> },
    Rippled(RippleOutcome),
}

/// The narrative-state engine.
///
/// All randomness flows from the single RNG handle given at construction, so
/// two engines built from the same roster and seed make identical choices.
#[derive(Debug)]
pub struct GenerationEngine {
    config: EngineConfig,
    entities: BTreeMap<String, Entity>,
    bonds: RelationshipMatrix,
    timeline: Timeline,
    entered_eye: BTreeSet<String>,
    playthrough: u32,
    clock: WorldClock,
    rng: StdRng,
    /// Similar-salt proposal from the latest exclusion, until committed.
    pending: Option<NextGeneration>,
    /// Exclusions already consumed by a ripple `gen`.
    rippled: usize,
}

impl GenerationEngine {
    /// Create an engine over the built-in roster.
    pub fn new(config: EngineConfig) -> Result<Self, SetupError> {
        let roster = Roster::builtin()?;
        Self::from_roster(config, &roster)
    }

    /// Create an engine over a roster, seeding the RNG from the config.
    pub fn from_roster(config: EngineConfig, roster: &Roster) -> Result<Self, SetupError> {
        let rng = config.seeded_rng();
        Self::with_rng(config, roster, rng)
    }

    /// Create an engine with an explicit random source.
    pub fn with_rng(config: EngineConfig, roster: &Roster, rng: StdRng) -> Result<Self, SetupError> {
        let mut engine = Self::cast(config, roster, rng)?;
        for seed in &roster.bonds {
            engine.bond_with_strength(&seed.a, &seed.b, seed.bond_type, seed.strength)?;
        }
        Ok(engine)
    }

    /// Create an engine with no entities.
    pub fn empty(config: EngineConfig) -> Result<Self, SetupError> {
        let rng = config.seeded_rng();
        Self::cast(config, &Roster::default(), rng)
    }

    /// Build the entity table and birth signals, without seed bonds.
    pub(crate) fn cast(config: EngineConfig, roster: &Roster, rng: StdRng) -> Result<Self, SetupError> {
        config.validate()?;
        roster.validate()?;

        let mut engine = Self {
            config,
            entities: BTreeMap::new(),
            bonds: RelationshipMatrix::new(),
            timeline: Timeline::new(),
            entered_eye: BTreeSet::new(),
            playthrough: 0,
            clock: WorldClock::new(),
            rng,
            pending: None,
            rippled: 0,
        };

        for entity in roster.entities() {
            engine.add_entity(entity)?;
        }
        Ok(engine)
    }

    /// Add an entity, broadcasting a birth signal for characters.
    pub fn add_entity(&mut self, mut entity: Entity) -> Result<(), EngineError> {
        if !is_valid_name(entity.name()) {
            return Err(EngineError::invalid(entity.name(), "names must be non-empty without '|'"));
        }
        if self.entities.contains_key(entity.name()) {
            return Err(EngineError::invalid(entity.name(), "name already taken"));
        }

        if entity.is_character() {
            let birth = Signal::new(entity.name(), MAW, SignalKind::Birth, self.clock.now())
                .with_friction(1.0)
                .with_location(entity.polarity())
                .with_generation(entity.generation());
            self.timeline.broadcast_signal(birth.clone())?;
            entity.set_birth_signal(birth);
        }

        tracing::debug!("{} {} joins the world", entity.kind().label(), entity.name());
        self.entities.insert(entity.name().to_string(), entity);
        Ok(())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    /// All entities in name order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn relationships(&self) -> &RelationshipMatrix {
        &self.bonds
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn entered_eye(&self) -> &BTreeSet<String> {
        &self.entered_eye
    }

    pub fn playthrough(&self) -> u32 {
        self.playthrough
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// The uncommitted similar-salt proposal, if any.
    pub fn pending_generation(&self) -> Option<&NextGeneration> {
        self.pending.as_ref()
    }

    /// Lifecycle state of a character.
    pub fn readiness(&self, name: &str) -> Result<Readiness, EngineError> {
        self.entities
            .get(name)
            .ok_or_else(|| EngineError::invalid(name, "unknown entity"))?
            .readiness()
            .ok_or_else(|| EngineError::invalid(name, "not a character"))
    }

    /// Look up a bond, collapsing the pair.
    pub fn observe_bond(&mut self, a: &str, b: &str) -> Option<&Bond> {
        self.bonds.get_bond(a, b)
    }

    /// Bond two entities at the configured default strength.
    pub fn bond(&mut self, a: &str, b: &str, bond_type: BondType) -> Result<BondUpdate, EngineError> {
        let strength = self.config.default_bond_strength;
        self.bond_with_strength(a, b, bond_type, strength)
    }

    /// Create or strengthen a bond and keep both entity views in step.
    pub fn bond_with_strength(
        &mut self,
        a: &str,
        b: &str,
        bond_type: BondType,
        strength: f32,
    ) -> Result<BondUpdate, EngineError> {
        self.check_pair(a, b)?;
        let now = self.tick();
        let (_, update) = self.bonds.create_or_strengthen_bond(a, b, bond_type, strength);
        if update == BondUpdate::Created {
            self.link(a, b);
        }
        tracing::debug!("{}-{} {:?} at t={}", a, b, update, now);
        Ok(update)
    }

    /// Remove a bond and give both entities their entropy back.
    pub fn break_bond(&mut self, a: &str, b: &str) -> Result<Bond, EngineError> {
        self.check_pair(a, b)?;
        let bond = self.bonds.remove_bond(a, b).ok_or_else(|| EngineError::NoSuchBond {
            a: a.to_string(),
            b: b.to_string(),
        })?;
        for (name, other) in [(a, b), (b, a)] {
            if let Some(entity) = self.entities.get_mut(name) {
                entity.unbond_from(other);
            }
        }
        self.tick();
        Ok(bond)
    }

    /// Set one axis of an entity's polarity and broadcast the movement.
    ///
    /// The movement signal is also attached to each of the mover's bonds.
    pub fn move_entity(
        &mut self,
        name: &str,
        axis: Axis,
        polarity: Polarity,
    ) -> Result<Signal, EngineError> {
        let entity = self
            .entities
            .get(name)
            .ok_or_else(|| EngineError::invalid(name, "unknown entity"))?;
        if entity.inside_eye() {
            return Err(EngineError::AlreadyExcluded(name.to_string()));
        }

        let target = entity.polarity().with_axis(axis, polarity);
        let now = self.tick();
        let signal = self.apply_movement(name, target, now, SignalKind::Movement)?;

        for other in self.bonds.bonded_neighbors(name) {
            self.bonds.attach_signal(name, &other, signal.clone());
        }
        tracing::debug!("{} slips to {}", name, target);
        Ok(signal)
    }

    /// Send a ready character through the maw.
    ///
    /// Rejections (`InvalidEntity`, `AlreadyExcluded`, `NotReady`) leave the
    /// engine untouched.
    pub fn enter_maw(&mut self, name: &str) -> Result<MawOutcome, EngineError> {
        let entity = self
            .entities
            .get(name)
            .ok_or_else(|| EngineError::invalid(name, "unknown entity"))?;
        match entity.readiness() {
            None => return Err(EngineError::invalid(name, "only characters can enter the maw")),
            Some(Readiness::InsideEye) => {
                tracing::warn!("{} is already inside the eye", name);
                return Err(EngineError::AlreadyExcluded(name.to_string()));
            }
            Some(Readiness::NotReady) => {
                tracing::warn!("{} is not ready for the maw", name);
                return Err(EngineError::NotReady {
                    name: name.to_string(),
                    bonds: entity.bonds().len(),
                    entropy: entity.entropy(),
                });
            }
            Some(Readiness::Ready) => {}
        }

        let polarity = entity.polarity();
        let mut lineage = entity.lineage().to_vec();
        lineage.push(name.to_string());
        let birth = Signal::new(name, MAW, SignalKind::GenerationalBirth, self.clock.now() + self.config.tick)
            .with_polarity_change(polarity)
            .with_location(polarity)
            .with_friction(1.0)
            .with_entropy_delta(-entity.entropy())
            .with_generation(entity.generation() + 1)
            .with_lineage(lineage);

        // The only fallible step runs before any state changes.
        self.timeline.broadcast_signal(birth.clone())?;
        self.tick();

        if let Some(entity) = self.entities.get_mut(name) {
            entity.enter_eye();
        }
        self.entered_eye.insert(name.to_string());

        let next_generation = self.derive_similar_salt(name, &birth);

        let event = ExclusionEvent::new(
            name,
            self.bonds.snapshot(),
            self.timeline.state_snapshot(),
            self.entered_eye.len(),
            birth.timestamp,
        );
        let healing = event.healing;
        self.timeline.record_exclusion(event.clone());
        let branch = self
            .timeline
            .branch_from_exclusion(&event, &next_generation.proposed_bonds)
            .id();

        self.playthrough += 1;
        self.pending = Some(next_generation.clone());

        tracing::info!(
            "{} enters the maw; reborn at {} as generation {} (playthrough {}, healing {:.2})",
            name,
            next_generation.chosen,
            next_generation.generation,
            self.playthrough,
            healing
        );

        Ok(MawOutcome {
            birth,
            next_generation,
            playthrough: self.playthrough,
            healing,
            branch,
        })
    }

    /// Commit the pending similar-salt proposal into the relationship matrix.
    pub fn commit_generation(&mut self) -> Result<Vec<ProposedBond>, EngineError> {
        let pending = self.pending.take().ok_or(EngineError::NothingToDerive)?;

        for proposal in &pending.proposed_bonds {
            if let Err(e) = self.check_pair(&proposal.a, &proposal.b) {
                self.pending = Some(pending);
                return Err(e);
            }
        }
        for proposal in &pending.proposed_bonds {
            self.bond_with_strength(&proposal.a, &proposal.b, proposal.bond_type, proposal.strength)?;
        }

        tracing::info!(
            "committed {} bonds for {}'s generation {}",
            pending.proposed_bonds.len(),
            pending.parent,
            pending.generation
        );
        Ok(pending.proposed_bonds)
    }

    /// Derive the next generation from the most recent exclusion, using the
    /// configured strategy.
    ///
    /// Each exclusion is derived at most once: a second call without a new
    /// exclusion returns `NothingToDerive` under either strategy.
    pub fn next_generation(&mut self) -> Result<GenerationOutcome, EngineError> {
        let last = self
            .timeline
            .last_exclusion()
            .map(|event| event.entity.clone())
            .ok_or(EngineError::NothingToDerive)?;

        match self.config.strategy {
            DerivationStrategy::SimilarSalt => self
                .commit_generation()
                .map(|bonds| GenerationOutcome::Committed { bonds }),
            DerivationStrategy::ExclusionRipple => {
                let exclusions = self.timeline.exclusions().len();
                if self.rippled >= exclusions {
                    return Err(EngineError::NothingToDerive);
                }
                let ripple = self.reshuffle_from_exclusion(&last)?;
                self.rippled = exclusions;
                Ok(GenerationOutcome::Rippled(ripple))
            }
        }
    }

    /// Bridge the excluded character's former neighbors and disturb bystanders.
    ///
    /// Every pair of former neighbors gets a synthesized bond; every other
    /// active character has one random axis flipped with the configured
    /// probability.
    pub fn reshuffle_from_exclusion(&mut self, excluded: &str) -> Result<RippleOutcome, EngineError> {
        let entity = self
            .entities
            .get(excluded)
            .ok_or_else(|| EngineError::invalid(excluded, "unknown entity"))?;
        if !entity.is_character() {
            return Err(EngineError::invalid(excluded, "not a character"));
        }
        if !self.entered_eye.contains(excluded) {
            return Err(EngineError::NotExcluded(excluded.to_string()));
        }

        let now = self.tick();
        let neighbors: Vec<String> = self.bonds.bonded_neighbors(excluded).into_iter().collect();
        let mut bridged = Vec::new();
        for (i, a) in neighbors.iter().enumerate() {
            for b in &neighbors[i + 1..] {
                let (bond, update) = self.bonds.collapse_new_bond(a, b, excluded, &mut self.rng);
                if update == BondUpdate::Created {
                    self.link(a, b);
                }
                bridged.push(bond);
            }
        }

        let bystanders = self.active_characters(excluded);
        let mut disturbed = Vec::new();
        for (name, from) in bystanders {
            if !self.rng.gen_bool(self.config.ripple_flip_probability) {
                continue;
            }
            let axis = Axis::ALL[self.rng.gen_range(0..Axis::ALL.len())];
            let to = from.flip(axis);
            self.apply_movement(&name, to, now, SignalKind::Disturbance)?;
            disturbed.push(Disturbance {
                entity: name,
                axis,
                from,
                to,
            });
        }

        tracing::info!(
            "{}'s exclusion ripples: {} bridges, {} disturbed",
            excluded,
            bridged.len(),
            disturbed.len()
        );
        Ok(RippleOutcome {
            excluded: excluded.to_string(),
            bridged,
            disturbed,
        })
    }

    /// Reincarnate `name` from its birth signal and roll the proposed bonds.
    fn derive_similar_salt(&mut self, name: &str, birth: &Signal) -> NextGeneration {
        let parent_polarity = birth.signal_location.unwrap_or_else(|| {
            self.entities
                .get(name)
                .map(Entity::polarity)
                .unwrap_or(PolarityState::ALL[0])
        });
        let candidates = similar_salt_candidates(parent_polarity);
        let chosen = choose_next_polarity(parent_polarity, &mut self.rng);

        if let Some(entity) = self.entities.get_mut(name) {
            entity.rebirth(chosen, birth.clone());
        }

        let others = self.active_characters(name);
        let proposed_bonds = propose_bonds(
            name,
            chosen,
            &others,
            self.config.default_bond_strength,
            &mut self.rng,
        );

        NextGeneration {
            parent: name.to_string(),
            parent_polarity,
            candidates: candidates.to_vec(),
            chosen,
            generation: birth.generation,
            lineage: birth.lineage.clone(),
            proposed_bonds,
        }
    }

    /// Characters outside the eye, other than `except`, in name order.
    fn active_characters(&self, except: &str) -> Vec<(String, PolarityState)> {
        self.entities
            .values()
            .filter(|e| e.name() != except && e.is_character() && !e.inside_eye())
            .map(|e| (e.name().to_string(), e.polarity()))
            .collect()
    }

    /// Replace an entity's polarity and broadcast the resulting signal.
    fn apply_movement(
        &mut self,
        name: &str,
        target: PolarityState,
        now: f64,
        kind: SignalKind,
    ) -> Result<Signal, EngineError> {
        if now < self.timeline.current_time() {
            return Err(crate::timeline::TimelineError::OutOfOrder {
                timestamp: now,
                current: self.timeline.current_time(),
            }
            .into());
        }
        let entity = self
            .entities
            .get_mut(name)
            .ok_or_else(|| EngineError::invalid(name, "unknown entity"))?;
        let moved = entity.move_to_polarity(target, now);
        let signal = Signal {
            event_type: kind,
            ..moved
        };
        self.timeline.broadcast_signal(signal.clone())?;
        Ok(signal)
    }

    fn check_pair(&self, a: &str, b: &str) -> Result<(), EngineError> {
        for name in [a, b] {
            if !self.entities.contains_key(name) {
                return Err(EngineError::invalid(name, "unknown entity"));
            }
        }
        if a == b {
            return Err(EngineError::invalid(a, "cannot bond with itself"));
        }
        Ok(())
    }

    /// Record a new bond on both entity views.
    fn link(&mut self, a: &str, b: &str) {
        for (name, other) in [(a, b), (b, a)] {
            if let Some(entity) = self.entities.get_mut(name) {
                entity.bond_with(other);
            }
        }
    }

    fn tick(&mut self) -> f64 {
        let now = self.clock.advance(self.config.tick);
        self.bonds.set_time(now);
        now
    }

    pub(crate) fn restore_counters(&mut self, playthrough: u32, entered_eye: BTreeSet<String>, now: f64) {
        self.playthrough = playthrough;
        self.entered_eye = entered_eye;
        self.clock = WorldClock::starting_at(now);
        self.bonds.set_time(now);
    }

    pub(crate) fn entity_mut(&mut self, name: &str) -> Option<&mut Entity> {
        self.entities.get_mut(name)
    }

    pub(crate) fn matrix_mut(&mut self) -> &mut RelationshipMatrix {
        &mut self.bonds
    }

    pub(crate) fn random_bond_type(&mut self) -> BondType {
        BondType::ALL[self.rng.gen_range(0..BondType::ALL.len())]
    }

    /// Bond keys touching `name`, for consistency checks.
    pub(crate) fn bond_keys_of(&self, name: &str) -> Vec<BondKey> {
        self.bonds
            .iter()
            .filter(|bond| bond.involves(name))
            .map(|bond| bond.key.clone())
            .collect()
    }
}
