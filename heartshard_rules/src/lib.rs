//! # HeartShard Rules
//!
//! The "World Bible" crate - contains the polarity model, entity definitions,
//! signals and the starting roster. This crate is the single source of truth
//! for entity state and does not contain any randomness or orchestration.

pub mod entities;
pub mod mechanics;
pub mod polarity;
pub mod signal;
pub mod world;

pub use entities::*;
pub use mechanics::*;
pub use polarity::*;
pub use signal::*;
pub use world::*;
