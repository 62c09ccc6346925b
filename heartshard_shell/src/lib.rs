//! # HeartShard Shell
//!
//! Line-oriented front end for the generational engine. Reads commands from
//! any `BufRead`, writes results to any `Write`, and owns the only file I/O
//! in the workspace: loading config, roster and snapshots, and writing saves.

use clap::Parser;
use heartshard_core::{
    Command, CommandOutput, ConfigError, DerivationStrategy, EngineConfig, GenerationEngine,
    PersistError, SetupError, WorldSnapshot, USAGE,
};
use heartshard_rules::{Roster, RosterError};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that end a shell session.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("I/O error on {path}: {source}")]
    File {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

fn read_file(path: &Path) -> Result<String, ShellError> {
    std::fs::read_to_string(path).map_err(|source| ShellError::File {
        path: path.to_path_buf(),
        source,
    })
}

/// Which JSON shape `save` writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveFormat {
    /// Full world state, loadable with `--load`.
    #[default]
    Snapshot,
    /// Per-entity polarity, bonds and generation.
    Entity,
}

impl std::str::FromStr for SaveFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "snapshot" => Ok(SaveFormat::Snapshot),
            "entity" => Ok(SaveFormat::Entity),
            other => Err(format!("unknown save format '{}'", other)),
        }
    }
}

/// HeartShard storm simulator.
///
/// Drive a cast of polarity-bound characters through bonds, movement and
/// the maw, one command per line.
#[derive(Parser, Debug)]
#[command(name = "heartshard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// RNG seed (overrides the config file)
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Engine config (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Starting cast (TOML); defaults to the built-in roster
    #[arg(short, long)]
    pub roster: Option<PathBuf>,

    /// Where `save` writes the world snapshot
    #[arg(long, default_value = "heartshard_save.json")]
    pub save_path: PathBuf,

    /// Save format: snapshot (resumable) or entity
    #[arg(short, long, default_value = "snapshot")]
    pub format: SaveFormat,

    /// Resume from a world snapshot written by `save`
    #[arg(short, long)]
    pub load: Option<PathBuf>,

    /// Derivation used by `gen`: similar_salt or exclusion_ripple
    #[arg(long)]
    pub strategy: Option<DerivationStrategy>,

    /// Suppress the banner
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Engine config from file and flags; flags win.
    pub fn engine_config(&self) -> Result<EngineConfig, ShellError> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_toml_str(&read_file(path)?)?,
            None => EngineConfig::default(),
        };
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(strategy) = self.strategy {
            config = config.with_strategy(strategy);
        }
        Ok(config)
    }

    pub fn roster(&self) -> Result<Roster, ShellError> {
        match &self.roster {
            Some(path) => Ok(Roster::from_toml_str(&read_file(path)?)?),
            None => Ok(Roster::builtin()?),
        }
    }

    /// Build the engine, restoring a snapshot when `--load` is given.
    pub fn build_engine(&self) -> Result<GenerationEngine, ShellError> {
        let config = self.engine_config()?;
        let roster = self.roster()?;
        match &self.load {
            Some(path) => {
                let snapshot = WorldSnapshot::from_json(&read_file(path)?)?;
                Ok(GenerationEngine::from_snapshot(config, &roster, &snapshot)?)
            }
            None => Ok(GenerationEngine::from_roster(config, &roster)?),
        }
    }
}

/// An interactive session over one engine.
pub struct Shell {
    engine: GenerationEngine,
    save_path: PathBuf,
    format: SaveFormat,
}

impl Shell {
    pub fn new(engine: GenerationEngine, save_path: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            save_path: save_path.into(),
            format: SaveFormat::default(),
        }
    }

    pub fn with_format(mut self, format: SaveFormat) -> Self {
        self.format = format;
        self
    }

    pub fn engine(&self) -> &GenerationEngine {
        &self.engine
    }

    /// Read commands until `quit` or end of input.
    ///
    /// Bad commands and rejected operations are reported and the session
    /// continues; only I/O failures end it early.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<(), ShellError> {
        write!(output, "> ")?;
        output.flush()?;

        for line in input.lines() {
            let line = line?;
            if !line.trim().is_empty() && !self.handle(&line, &mut output)? {
                break;
            }
            write!(output, "> ")?;
            output.flush()?;
        }
        writeln!(output)?;
        Ok(())
    }

    /// Run one line; returns false when the session should end.
    fn handle<W: Write>(&mut self, line: &str, output: &mut W) -> Result<bool, ShellError> {
        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(e) => {
                writeln!(output, "[ERROR] {}", e)?;
                writeln!(output, "{}", USAGE)?;
                return Ok(true);
            }
        };

        match self.engine.execute(command) {
            Ok(CommandOutput::Saved(snapshot)) => {
                let json = match self.format {
                    SaveFormat::Snapshot => snapshot.to_json_pretty()?,
                    SaveFormat::Entity => self.engine.save_state().to_json_pretty()?,
                };
                std::fs::write(&self.save_path, json).map_err(|source| {
                    ShellError::File {
                        path: self.save_path.clone(),
                        source,
                    }
                })?;
                tracing::info!("world saved to {}", self.save_path.display());
                writeln!(output, "{} to {}", CommandOutput::Saved(snapshot), self.save_path.display())?;
            }
            Ok(CommandOutput::Quit) => {
                writeln!(output, "{}", CommandOutput::Quit)?;
                return Ok(false);
            }
            Ok(result) => writeln!(output, "{}", result)?,
            Err(e) => writeln!(output, "[ERROR] {}", e)?,
        }
        Ok(true)
    }
}
