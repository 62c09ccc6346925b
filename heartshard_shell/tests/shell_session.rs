//! Save and resume through real files.

use clap::Parser;
use heartshard_core::{EngineConfig, GenerationEngine, WorldSnapshot};
use heartshard_shell::{Cli, SaveFormat, Shell, ShellError};
use std::path::Path;
use tempfile::tempdir;

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("temp paths are UTF-8")
}

fn run(shell: &mut Shell, script: &str) -> String {
    let mut out = Vec::new();
    shell.run(script.as_bytes(), &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn save_writes_snapshot_that_resumes() {
    let dir = tempdir().unwrap();
    let save_path = dir.path().join("run.json");

    let engine = GenerationEngine::new(EngineConfig::default().with_seed(42)).unwrap();
    let mut shell = Shell::new(engine, &save_path);
    let out = run(&mut shell, "move Theo z+\nmaw Kai\nsave\n");
    assert!(out.contains("Saved 9 entities at playthrough 1"));

    let json = std::fs::read_to_string(&save_path).unwrap();
    let saved = WorldSnapshot::from_json(&json).unwrap();
    assert_eq!(saved.entered_eye, vec!["Kai".to_string()]);
    assert_eq!(saved.entities["Theo"].polarity.to_tuple(), (-1, 1, 1));

    let cli = Cli::parse_from(["heartshard", "--seed", "1", "--load", path_arg(&save_path)]);
    let resumed = cli.build_engine().unwrap();
    assert_eq!(resumed.playthrough(), 1);
    assert!(resumed.entity("Kai").unwrap().inside_eye());

    // The resumed world keeps rejecting a second entry
    let mut shell = Shell::new(resumed, &save_path);
    let out = run(&mut shell, "maw Kai\n");
    assert!(out.contains("[ERROR] 'Kai' is already inside the eye"));
}

#[test]
fn custom_roster_and_config_files() {
    let dir = tempdir().unwrap();
    let roster_path = dir.path().join("cast.toml");
    let config_path = dir.path().join("engine.toml");
    std::fs::write(
        &roster_path,
        r#"
        [[character]]
        name = "Mira"
        polarity = [1, 1, -1]
        archetype = "lantern_keeper"
        core_wound = "silence"
        entropy = 0.4

        [[character]]
        name = "Sol"
        polarity = [-1, 1, -1]
        archetype = "drifter"
        core_wound = "exile"

        [[bond]]
        a = "Mira"
        b = "Sol"
        bond_type = "TRUST"
        "#,
    )
    .unwrap();
    std::fs::write(&config_path, "seed = 3\nstrategy = \"exclusion_ripple\"\n").unwrap();

    let cli = Cli::parse_from([
        "heartshard",
        "--roster",
        path_arg(&roster_path),
        "--config",
        path_arg(&config_path),
    ]);
    let engine = cli.build_engine().unwrap();
    assert_eq!(engine.entities().count(), 2);

    let mut shell = Shell::new(engine, dir.path().join("unused.json"));
    let out = run(&mut shell, "maw Mira\ngen\n");
    assert!(out.contains("Mira enters the Maw!"));
    assert!(out.contains("Mira's absence ripples"));
}

#[test]
fn corrupt_save_aborts_load() {
    let dir = tempdir().unwrap();
    let save_path = dir.path().join("broken.json");
    std::fs::write(&save_path, "{ \"playthrough\": 2, \"entities\": ").unwrap();

    let cli = Cli::parse_from(["heartshard", "--load", path_arg(&save_path)]);
    assert!(matches!(cli.build_engine(), Err(ShellError::Persist(_))));
}

#[test]
fn entity_format_save_writes_per_entity_records() {
    let dir = tempdir().unwrap();
    let save_path = dir.path().join("entities.json");

    let cli = Cli::parse_from([
        "heartshard",
        "--seed",
        "42",
        "--format",
        "entity",
        "--save-path",
        path_arg(&save_path),
    ]);
    let engine = cli.build_engine().unwrap();
    let mut shell = Shell::new(engine, &cli.save_path).with_format(cli.format);
    let out = run(&mut shell, "bond Ori Ion
save
");
    assert!(out.contains("Saved 9 entities"));

    let json = std::fs::read_to_string(&save_path).unwrap();
    assert!(json.contains("\"Ori\""));
    assert!(json.contains("\"generation\""));
    assert!(json.contains("\"bonds\""));
    assert!(!json.contains("\"playthrough\""));

    // Entity records carry no world state, so they do not resume
    let cli = Cli::parse_from(["heartshard", "--load", path_arg(&save_path)]);
    assert!(matches!(cli.build_engine(), Err(ShellError::Persist(_))));
}

#[test]
fn default_format_is_resumable_snapshot() {
    let dir = tempdir().unwrap();
    let save_path = dir.path().join("default.json");

    let engine = GenerationEngine::new(EngineConfig::default().with_seed(42)).unwrap();
    let mut shell = Shell::new(engine, &save_path).with_format(SaveFormat::Snapshot);
    run(&mut shell, "save\n");

    let json = std::fs::read_to_string(&save_path).unwrap();
    assert!(WorldSnapshot::from_json(&json).is_ok());
}
