//! # HeartShard Core
//!
//! The generational engine. This crate takes the entities defined in
//! `heartshard_rules`, tracks the bonds between them, records every signal
//! on a branching timeline and derives the next generation whenever a
//! character leaves through the maw.
//!
//! ## Core Components
//!
//! - **relationship**: Symmetric bond graph with observe-to-collapse lookups
//! - **timeline**: Append-only signal and exclusion log that branches on exclusion
//! - **engine**: Admission, exclusion and next-generation derivation
//! - **persist**: Save file and world snapshot formats
//! - **command**: Line commands for interactive collaborators
//!
//! ## Design Philosophy
//!
//! - **Reproducible**: One seeded random source and a logical clock drive every outcome
//! - **All or nothing**: Each operation fully applies or is rejected with a named reason
//! - **No I/O**: Callers decide where snapshots and save files go

pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod persist;
pub mod relationship;
pub mod timeline;

pub use command::*;
pub use config::*;
pub use engine::*;
pub use error::*;
pub use persist::*;
pub use relationship::*;
pub use timeline::*;
