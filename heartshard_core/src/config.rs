//! Engine configuration, loadable from TOML.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::DerivationStrategy;

/// Errors raised while loading or checking a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Tunables for a [`GenerationEngine`](crate::GenerationEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// RNG seed. `None` draws one from OS entropy.
    pub seed: Option<u64>,

    /// Derivation run by the `gen` command.
    pub strategy: DerivationStrategy,

    /// Strength of bonds created without an explicit strength (0.0-1.0).
    pub default_bond_strength: f32,

    /// Chance that the exclusion ripple flips an axis of each bystander.
    pub ripple_flip_probability: f64,

    /// Logical clock step per recorded event.
    pub tick: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            strategy: DerivationStrategy::SimilarSalt,
            default_bond_strength: 0.5,
            ripple_flip_probability: 0.3,
            tick: 1.0,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a configuration from TOML.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Set a fixed seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the derivation strategy.
    pub fn with_strategy(mut self, strategy: DerivationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.default_bond_strength) {
            return Err(ConfigError::Invalid(
                "default_bond_strength must be within [0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&self.ripple_flip_probability) {
            return Err(ConfigError::Invalid(
                "ripple_flip_probability must be within [0, 1]",
            ));
        }
        if !(self.tick > 0.0 && self.tick.is_finite()) {
            return Err(ConfigError::Invalid("tick must be positive"));
        }
        Ok(())
    }

    /// Build the engine's random source, generating a seed if none is set.
    pub fn seeded_rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => {
                let seed: u64 = rand::random();
                tracing::info!("no seed configured, using {}", seed);
                StdRng::seed_from_u64(seed)
            }
        }
    }
}
