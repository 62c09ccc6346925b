//! Relationship module - the bond graph between entities.
//!
//! The graph consists of:
//! - **Bonds**: typed, strength-weighted edges keyed by an unordered name pair
//! - **Collapsed pairs**: pairs that have been observed through a lookup
//! - **Proposed bonds**: derivation output waiting for a caller to commit it

mod bond;
mod matrix;

pub use bond::*;
pub use matrix::*;
