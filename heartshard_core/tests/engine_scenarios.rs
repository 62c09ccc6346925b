//! End-to-end engine scenarios over small hand-built casts and the
//! built-in roster.

use heartshard_core::{
    Command, CommandOutput, DerivationStrategy, EngineConfig, EngineError, GenerationEngine,
    GenerationOutcome, PersistError, WorldSnapshot,
};
use heartshard_rules::{
    Axis, BondType, CharacterTraits, Entity, Polarity, Polarity::Negative as N,
    Polarity::Positive as P, PolarityState, Readiness, Roster, SignalKind,
};

fn character(name: &str, polarity: PolarityState, entropy: f32) -> Entity {
    Entity::character(name, polarity, CharacterTraits::new("wanderer", "loss")).with_entropy(entropy)
}

fn pair_engine(c_entropy: f32, bond: bool) -> GenerationEngine {
    let mut engine = GenerationEngine::empty(EngineConfig::default().with_seed(7)).unwrap();
    engine.add_entity(character("C", PolarityState::new(P, N, P), c_entropy)).unwrap();
    engine.add_entity(character("D", PolarityState::new(N, N, P), 0.5)).unwrap();
    engine.add_entity(character("E", PolarityState::new(N, P, N), 0.5)).unwrap();
    if bond {
        engine.bond("C", "D", BondType::Trust).unwrap();
    }
    engine
}

#[test]
fn low_entropy_bonded_character_enters_maw() {
    // Entropy ends at 0.3 after the bond lowers it by 0.1
    let mut engine = pair_engine(0.4, true);
    assert!((engine.entity("C").unwrap().entropy() - 0.3).abs() < 1e-6);
    assert_eq!(engine.readiness("C").unwrap(), Readiness::Ready);

    let outcome = engine.enter_maw("C").unwrap();

    assert_eq!(outcome.playthrough, 1);
    assert!(engine.entity("C").unwrap().inside_eye());
    assert_eq!(outcome.birth.event_type, SignalKind::GenerationalBirth);
    assert!(outcome.birth.summary().contains("generational birth"));
    assert!((outcome.birth.entropy_delta + 0.3).abs() < 1e-6);
}

#[test]
fn high_entropy_unbonded_character_is_not_ready() {
    let mut engine = pair_engine(0.9, false);
    let signals = engine.timeline().signals().len();

    let result = engine.enter_maw("C");

    assert!(matches!(
        result,
        Err(EngineError::NotReady { bonds: 0, .. })
    ));
    assert!(!engine.entity("C").unwrap().inside_eye());
    assert_eq!(engine.playthrough(), 0);
    assert_eq!(engine.timeline().signals().len(), signals);
    assert!(engine.timeline().exclusions().is_empty());
}

#[test]
fn bonded_but_restless_character_is_not_ready() {
    let mut engine = pair_engine(0.95, true);
    assert!(matches!(
        engine.enter_maw("C"),
        Err(EngineError::NotReady { bonds: 1, .. })
    ));
}

#[test]
fn second_entry_is_rejected() {
    let mut engine = pair_engine(0.4, true);
    engine.enter_maw("C").unwrap();

    let result = engine.enter_maw("C");

    assert!(matches!(result, Err(EngineError::AlreadyExcluded(name)) if name == "C"));
    assert_eq!(engine.playthrough(), 1);
    assert_eq!(engine.timeline().exclusions().len(), 1);
}

#[test]
fn playthrough_counts_successful_exclusions_only() {
    let mut engine = GenerationEngine::new(EngineConfig::default().with_seed(21)).unwrap();

    engine.enter_maw("Lila").unwrap();
    let _ = engine.enter_maw("Lila");
    let _ = engine.enter_maw("Heartshard");
    engine.enter_maw("Furin").unwrap();
    let outcome = engine.enter_maw("Ayni").unwrap();

    assert_eq!(outcome.playthrough, 3);
    assert_eq!(engine.playthrough(), 3);
    assert!((outcome.healing - 1.0 / 3.0).abs() < 1e-6);
    assert_eq!(engine.entered_eye().len(), 3);
}

#[test]
fn branches_are_frozen_at_creation() {
    let mut engine = GenerationEngine::new(EngineConfig::default().with_seed(4)).unwrap();
    let outcome = engine.enter_maw("Kai").unwrap();
    let frozen = engine
        .timeline()
        .find_branch(outcome.branch)
        .unwrap()
        .signals()
        .len();
    assert_eq!(frozen, engine.timeline().signals().len());

    engine.move_entity("Theo", Axis::Z, Polarity::Positive).unwrap();
    engine.move_entity("Ion", Axis::X, Polarity::Positive).unwrap();

    let branch = engine.timeline().find_branch(outcome.branch).unwrap();
    assert_eq!(branch.signals().len(), frozen);
    assert_eq!(branch.current_time(), 0.0);
    assert_eq!(branch.seed_bonds(), outcome.next_generation.proposed_bonds.as_slice());
    assert_eq!(engine.timeline().signals().len(), frozen + 2);
}

#[test]
fn branch_exclusion_log_is_frozen_at_creation() {
    let mut engine = GenerationEngine::new(EngineConfig::default().with_seed(4)).unwrap();
    let first = engine.enter_maw("Kai").unwrap();
    engine.enter_maw("Furin").unwrap();

    assert_eq!(engine.timeline().exclusions().len(), 2);
    let branch = engine.timeline().find_branch(first.branch).unwrap();
    assert_eq!(branch.exclusions().len(), 1);
    assert_eq!(branch.exclusions()[0].entity, "Kai");
    assert!(branch.branches().is_empty());
}

#[test]
fn timeline_clock_never_runs_backwards() {
    let mut engine = GenerationEngine::new(EngineConfig::default().with_seed(4)).unwrap();
    engine.move_entity("Theo", Axis::Z, Polarity::Positive).unwrap();
    engine.enter_maw("Lila").unwrap();
    engine.move_entity("Ion", Axis::X, Polarity::Positive).unwrap();

    let times: Vec<f64> = engine.timeline().signals().iter().map(|s| s.timestamp).collect();
    assert!(times.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn identical_seeds_replay_identically() {
    let run = |seed: u64| {
        let config = EngineConfig::default()
            .with_seed(seed)
            .with_strategy(DerivationStrategy::ExclusionRipple);
        let mut engine = GenerationEngine::new(config).unwrap();
        engine.execute(Command::parse("bond Theo Ion").unwrap()).unwrap();
        engine.enter_maw("Kai").unwrap();
        engine.next_generation().unwrap();
        let snapshot = engine.snapshot();
        (snapshot.entities, snapshot.bonds.bonds)
    };

    assert_eq!(run(99), run(99));
}

#[test]
fn ripple_strategy_drives_gen_command() {
    let config = EngineConfig {
        ripple_flip_probability: 0.0,
        ..EngineConfig::default()
            .with_seed(12)
            .with_strategy(DerivationStrategy::ExclusionRipple)
    };
    let mut engine = GenerationEngine::new(config).unwrap();
    let before: Vec<_> = engine.entities().map(|e| e.polarity()).collect();

    engine.enter_maw("Lila").unwrap();
    let output = engine.execute(Command::Gen).unwrap();

    let CommandOutput::Generated(GenerationOutcome::Rippled(ripple)) = output else {
        panic!("expected a ripple");
    };
    assert!(ripple.disturbed.is_empty());
    // Lila's neighbors Kai and Theo are bridged
    assert_eq!(ripple.bridged.len(), 1);
    assert!(engine.entity("Kai").unwrap().bonds().contains("Theo"));

    // Without disturbance only Lila's polarity may have changed
    for (entity, old) in engine.entities().zip(before) {
        if entity.name() != "Lila" {
            assert_eq!(entity.polarity(), old);
        }
    }
    // The excluded character keeps its bonds
    assert!(engine.entity("Lila").unwrap().bonds().contains("Theo"));
}

#[test]
fn snapshot_survives_json_and_restore() {
    let mut engine = GenerationEngine::new(EngineConfig::default().with_seed(30)).unwrap();
    engine.enter_maw("Ori").unwrap();
    engine.execute(Command::Gen).unwrap();

    let json = engine.snapshot().to_json_pretty().unwrap();
    let snapshot = WorldSnapshot::from_json(&json).unwrap();
    let restored =
        GenerationEngine::from_snapshot(EngineConfig::default(), &Roster::builtin().unwrap(), &snapshot)
            .unwrap();

    assert_eq!(restored.playthrough(), 1);
    assert!(restored.entity("Ori").unwrap().inside_eye());
    assert_eq!(restored.snapshot().entities, snapshot.entities);
}

#[test]
fn restore_rejects_foreign_entities() {
    let mut snapshot = GenerationEngine::new(EngineConfig::default().with_seed(30))
        .unwrap()
        .snapshot();
    let ghost = snapshot.entities["Lila"].clone();
    snapshot.entities.insert("Vincent".to_string(), ghost);

    let result =
        GenerationEngine::from_snapshot(EngineConfig::default(), &Roster::builtin().unwrap(), &snapshot);
    assert!(matches!(result, Err(PersistError::UnknownEntity(name)) if name == "Vincent"));
}

#[test]
fn roster_with_dangling_seed_bond_is_rejected() {
    let roster = r#"
        [[character]]
        name = "Lila"
        polarity = [1, -1, 1]
        archetype = "quiet_wanderer"
        core_wound = "abandonment"

        [[bond]]
        a = "Lila"
        b = "Vincent"
        bond_type = "TRUST"
    "#;
    assert!(Roster::from_toml_str(roster).is_err());
}
