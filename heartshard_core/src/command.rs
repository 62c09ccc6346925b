//! Command surface for interactive collaborators.
//!
//! ```text
//! bond A B        create or strengthen a bond of random type
//! move C x+       set one axis of C's polarity
//! maw D           send D into the maw
//! gen             derive the next generation from the last exclusion
//! save            export the full world snapshot
//! status          same snapshot, for display
//! help | quit
//! ```

use heartshard_rules::{Axis, Polarity, PolarityError, Signal};
use std::fmt;
use thiserror::Error;

use crate::engine::{GenerationEngine, GenerationOutcome, MawOutcome};
use crate::error::EngineError;
use crate::persist::WorldSnapshot;
use crate::relationship::BondUpdate;

pub const USAGE: &str = "commands: bond A B | move C axis[+|-] | maw D | gen | save | status | help | quit";

/// Errors raised while parsing a command line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}'")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error(transparent)]
    BadAxis(#[from] PolarityError),
}

/// A parsed command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Bond { a: String, b: String },
    Move { name: String, axis: Axis, polarity: Polarity },
    Maw { name: String },
    Gen,
    Save,
    Status,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let (head, args) = parts.split_first().ok_or(CommandError::Empty)?;

        match (head.to_ascii_lowercase().as_str(), args) {
            ("bond", [a, b]) => Ok(Command::Bond {
                a: a.to_string(),
                b: b.to_string(),
            }),
            ("bond", _) => Err(CommandError::Usage("bond A B")),
            ("move", [name, direction]) => {
                let (axis, polarity) = parse_direction(direction)?;
                Ok(Command::Move {
                    name: name.to_string(),
                    axis,
                    polarity,
                })
            }
            ("move", _) => Err(CommandError::Usage("move C axis[+|-]")),
            ("maw", [name]) => Ok(Command::Maw {
                name: name.to_string(),
            }),
            ("maw", _) => Err(CommandError::Usage("maw D")),
            ("gen", []) => Ok(Command::Gen),
            ("save", []) => Ok(Command::Save),
            ("status", []) => Ok(Command::Status),
            ("help", _) => Ok(Command::Help),
            ("quit" | "exit", _) => Ok(Command::Quit),
            ("gen" | "save" | "status", _) => Err(CommandError::Usage("gen | save | status take no arguments")),
            (other, _) => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// Parse `x+`, `Y-` and the like.
fn parse_direction(direction: &str) -> Result<(Axis, Polarity), CommandError> {
    let (axis, sign) = match direction.char_indices().last() {
        Some((i, sign)) if i > 0 => (&direction[..i], sign),
        _ => return Err(CommandError::Usage("move C axis[+|-]")),
    };
    let polarity = match sign {
        '+' => Polarity::Positive,
        '-' => Polarity::Negative,
        _ => return Err(CommandError::Usage("move C axis[+|-]")),
    };
    Ok((axis.parse::<Axis>()?, polarity))
}

/// What a command did.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    Bonded { a: String, b: String, update: BondUpdate },
    Moved(Signal),
    EnteredMaw(MawOutcome),
    Generated(GenerationOutcome),
    Saved(WorldSnapshot),
    Status(WorldSnapshot),
    Help,
    Quit,
}

impl fmt::Display for CommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOutput::Bonded { a, b, update } => match update {
                BondUpdate::Created => write!(f, "Bond: {}-{} formed", a, b),
                BondUpdate::Strengthened => write!(f, "Bond: {}-{} strengthened", a, b),
            },
            CommandOutput::Moved(signal) => match signal.signal_location {
                Some(location) => write!(f, "{} slips to {}", signal.source, location),
                None => write!(f, "{} moves", signal.source),
            },
            CommandOutput::EnteredMaw(outcome) => write!(
                f,
                "{} enters the Maw! Healing: {:.2} | reborn at {} (generation {}, playthrough {})",
                outcome.next_generation.parent,
                outcome.healing,
                outcome.next_generation.chosen,
                outcome.next_generation.generation,
                outcome.playthrough
            ),
            CommandOutput::Generated(GenerationOutcome::Committed { bonds }) => {
                write!(f, "Next generation: {} bonds committed", bonds.len())?;
                for bond in bonds {
                    write!(f, "\n  {}-{} {}", bond.a, bond.b, bond.bond_type)?;
                }
                Ok(())
            }
            CommandOutput::Generated(GenerationOutcome::Rippled(ripple)) => {
                write!(
                    f,
                    "{}'s absence ripples: {} bridges, {} disturbed",
                    ripple.excluded,
                    ripple.bridged.len(),
                    ripple.disturbed.len()
                )?;
                for d in &ripple.disturbed {
                    write!(f, "\n  {} {} -> {} ({})", d.entity, d.from, d.to, d.axis)?;
                }
                Ok(())
            }
            CommandOutput::Saved(snapshot) => write!(
                f,
                "Saved {} entities at playthrough {}",
                snapshot.entities.len(),
                snapshot.playthrough
            ),
            CommandOutput::Status(snapshot) => {
                write!(
                    f,
                    "playthrough {} | {} bonds | inside the eye: [{}]",
                    snapshot.playthrough,
                    snapshot.bonds.bonds.len(),
                    snapshot.entered_eye.join(", ")
                )?;
                for (name, state) in &snapshot.entities {
                    write!(
                        f,
                        "\n  {:<10} {} entropy {:.2} gen {}{}",
                        name,
                        state.polarity,
                        state.entropy,
                        state.generation,
                        if state.inside_eye { " (eye)" } else { "" }
                    )?;
                }
                Ok(())
            }
            CommandOutput::Help => write!(f, "{}", USAGE),
            CommandOutput::Quit => write!(f, "Goodbye!"),
        }
    }
}

impl GenerationEngine {
    /// Run one command against the engine.
    pub fn execute(&mut self, command: Command) -> Result<CommandOutput, EngineError> {
        match command {
            Command::Bond { a, b } => {
                let bond_type = self.random_bond_type();
                let update = self.bond(&a, &b, bond_type)?;
                Ok(CommandOutput::Bonded { a, b, update })
            }
            Command::Move {
                name,
                axis,
                polarity,
            } => self
                .move_entity(&name, axis, polarity)
                .map(CommandOutput::Moved),
            Command::Maw { name } => self.enter_maw(&name).map(CommandOutput::EnteredMaw),
            Command::Gen => self.next_generation().map(CommandOutput::Generated),
            Command::Save => Ok(CommandOutput::Saved(self.snapshot())),
            Command::Status => Ok(CommandOutput::Status(self.snapshot())),
            Command::Help => Ok(CommandOutput::Help),
            Command::Quit => Ok(CommandOutput::Quit),
        }
    }
}
