//! Engine error types.

use heartshard_rules::RosterError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::timeline::TimelineError;

/// Expected, recoverable outcomes of engine operations.
///
/// The engine stays fully usable after any of these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("'{name}' is not valid here: {reason}")]
    InvalidEntity { name: String, reason: &'static str },

    #[error("'{0}' is already inside the eye")]
    AlreadyExcluded(String),

    #[error("'{name}' is not ready for the maw (bonds: {bonds}, entropy: {entropy:.2})")]
    NotReady {
        name: String,
        bonds: usize,
        entropy: f32,
    },

    #[error("'{0}' has not entered the eye")]
    NotExcluded(String),

    #[error("no bond between '{a}' and '{b}'")]
    NoSuchBond { a: String, b: String },

    #[error("no exclusion is waiting for a next generation")]
    NothingToDerive,

    #[error(transparent)]
    Timeline(#[from] TimelineError),
}

impl EngineError {
    pub(crate) fn invalid(name: &str, reason: &'static str) -> Self {
        EngineError::InvalidEntity {
            name: name.to_string(),
            reason,
        }
    }
}

/// Errors raised while assembling an engine.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}
