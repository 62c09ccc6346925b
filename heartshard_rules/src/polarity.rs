//! The three-axis polarity model.
//!
//! A [`PolarityState`] is a point in `{+1, -1}^3`. It is a plain value: moving
//! an entity means assigning it a new state, never editing one axis in place.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when decoding polarity values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolarityError {
    #[error("polarity value must be +1 or -1, found {0}")]
    InvalidValue(i8),

    #[error("unknown axis '{0}', expected x, y or z")]
    UnknownAxis(String),
}

/// One side of a single axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    /// The signed value of this side (`+1` or `-1`).
    pub fn value(self) -> i8 {
        match self {
            Polarity::Positive => 1,
            Polarity::Negative => -1,
        }
    }

    /// The opposite side.
    pub fn flip(self) -> Self {
        match self {
            Polarity::Positive => Polarity::Negative,
            Polarity::Negative => Polarity::Positive,
        }
    }
}

impl From<Polarity> for i8 {
    fn from(polarity: Polarity) -> Self {
        polarity.value()
    }
}

impl TryFrom<i8> for Polarity {
    type Error = PolarityError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Polarity::Positive),
            -1 => Ok(Polarity::Negative),
            other => Err(PolarityError::InvalidValue(other)),
        }
    }
}

/// The three independent axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl std::str::FromStr for Axis {
    type Err = PolarityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            "z" => Ok(Axis::Z),
            _ => Err(PolarityError::UnknownAxis(s.to_string())),
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        write!(f, "{}", label)
    }
}

/// An immutable position in polarity space.
///
/// Serialized as the canonical `[x, y, z]` array of `±1` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "[i8; 3]", try_from = "[i8; 3]")]
pub struct PolarityState {
    axes: [Polarity; 3],
}

impl PolarityState {
    /// All eight states, in lexicographic order of their tuples.
    pub const ALL: [PolarityState; 8] = {
        use Polarity::{Negative as N, Positive as P};
        [
            PolarityState { axes: [N, N, N] },
            PolarityState { axes: [N, N, P] },
            PolarityState { axes: [N, P, N] },
            PolarityState { axes: [N, P, P] },
            PolarityState { axes: [P, N, N] },
            PolarityState { axes: [P, N, P] },
            PolarityState { axes: [P, P, N] },
            PolarityState { axes: [P, P, P] },
        ]
    };

    /// Create a state from its three axis values.
    pub fn new(x: Polarity, y: Polarity, z: Polarity) -> Self {
        Self { axes: [x, y, z] }
    }

    /// Get the value of one axis.
    pub fn axis(&self, axis: Axis) -> Polarity {
        self.axes[axis.index()]
    }

    /// A new state with exactly one axis inverted.
    pub fn flip(&self, axis: Axis) -> Self {
        let mut axes = self.axes;
        axes[axis.index()] = axes[axis.index()].flip();
        Self { axes }
    }

    /// A new state with one axis set to the given side.
    pub fn with_axis(&self, axis: Axis, polarity: Polarity) -> Self {
        let mut axes = self.axes;
        axes[axis.index()] = polarity;
        Self { axes }
    }

    /// The state with every axis inverted.
    pub fn inverted(&self) -> Self {
        Self {
            axes: self.axes.map(Polarity::flip),
        }
    }

    /// Hamming distance over the three axes (0-3).
    pub fn distance_to(&self, other: &PolarityState) -> u8 {
        self.axes
            .iter()
            .zip(other.axes.iter())
            .filter(|(a, b)| a != b)
            .count() as u8
    }

    /// Canonical `(x, y, z)` representation.
    pub fn to_tuple(&self) -> (i8, i8, i8) {
        (
            self.axes[0].value(),
            self.axes[1].value(),
            self.axes[2].value(),
        )
    }
}

impl From<PolarityState> for [i8; 3] {
    fn from(state: PolarityState) -> Self {
        state.axes.map(Polarity::value)
    }
}

impl TryFrom<[i8; 3]> for PolarityState {
    type Error = PolarityError;

    fn try_from(values: [i8; 3]) -> Result<Self, Self::Error> {
        Ok(Self::new(
            Polarity::try_from(values[0])?,
            Polarity::try_from(values[1])?,
            Polarity::try_from(values[2])?,
        ))
    }
}

impl std::fmt::Display for PolarityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = |p: Polarity| if p == Polarity::Positive { '+' } else { '-' };
        write!(
            f,
            "({}{}{})",
            sign(self.axes[0]),
            sign(self.axes[1]),
            sign(self.axes[2])
        )
    }
}
