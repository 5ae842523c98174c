//! The min/max analysis axis.
//!
//! Every derived timing quantity is computed on one side of the min/max axis:
//! `Max` for late (setup) analysis, `Min` for early (hold) analysis. The axis
//! determines initial values, merge direction, and which extreme "wins" when
//! two arrivals with the same tag meet at a vertex.

use crate::delay::Delay;
use serde::{Deserialize, Serialize};

/// One side of the early/late analysis axis.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum MinMax {
    /// Early (hold) analysis: smaller values win.
    Min,
    /// Late (setup) analysis: larger values win.
    Max,
}

/// Early/late is the same axis as min/max; delay derating and insertion
/// lookups read better with this alias.
pub type EarlyLate = MinMax;

impl MinMax {
    /// Both sides, min first.
    pub const fn both() -> [MinMax; 2] {
        [MinMax::Min, MinMax::Max]
    }

    /// Number of sides (for per-side array indexing).
    pub const COUNT: usize = 2;

    /// Dense index: min = 0, max = 1.
    pub fn index(self) -> usize {
        match self {
            MinMax::Min => 0,
            MinMax::Max => 1,
        }
    }

    /// The other side of the axis.
    pub fn opposite(self) -> MinMax {
        match self {
            MinMax::Min => MinMax::Max,
            MinMax::Max => MinMax::Min,
        }
    }

    /// The identity value for merging on this side: `+inf` for min,
    /// `-inf` for max. Any real arrival compares better than it.
    pub fn init_value(self) -> Delay {
        match self {
            MinMax::Min => Delay::INFINITY,
            MinMax::Max => Delay::NEG_INFINITY,
        }
    }

    /// Returns `true` if `a` is strictly better than `b` on this side.
    pub fn compare(self, a: Delay, b: Delay) -> bool {
        match self {
            MinMax::Min => a < b,
            MinMax::Max => a > b,
        }
    }

    /// Merges two values, keeping the better one for this side.
    pub fn merge(self, a: Delay, b: Delay) -> Delay {
        if self.compare(a, b) {
            a
        } else {
            b
        }
    }

    /// Short lowercase name, as used in diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            MinMax::Min => "min",
            MinMax::Max => "max",
        }
    }
}
