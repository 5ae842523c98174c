//! Signal transition direction.

use serde::{Deserialize, Serialize};

/// A signal transition: rising or falling.
///
/// Arrivals, slews, pin capacitances, and timing arcs are all qualified by
/// transition. `RiseFall` indexes are dense so per-transition values can be
/// stored in two-element arrays.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum RiseFall {
    /// A low-to-high transition.
    Rise,
    /// A high-to-low transition.
    Fall,
}

impl RiseFall {
    /// Both transitions, rise first.
    pub const fn both() -> [RiseFall; 2] {
        [RiseFall::Rise, RiseFall::Fall]
    }

    /// Number of transitions (for per-transition array indexing).
    pub const COUNT: usize = 2;

    /// Dense index: rise = 0, fall = 1.
    pub fn index(self) -> usize {
        match self {
            RiseFall::Rise => 0,
            RiseFall::Fall => 1,
        }
    }

    /// The transition with the given dense index.
    ///
    /// # Panics
    ///
    /// Panics if `index > 1`.
    pub fn from_index(index: usize) -> RiseFall {
        match index {
            0 => RiseFall::Rise,
            1 => RiseFall::Fall,
            _ => panic!("invalid rise/fall index {index}"),
        }
    }

    /// The opposite transition.
    pub fn opposite(self) -> RiseFall {
        match self {
            RiseFall::Rise => RiseFall::Fall,
            RiseFall::Fall => RiseFall::Rise,
        }
    }

    /// Short name used in diagnostics ("rise" / "fall").
    pub fn as_str(self) -> &'static str {
        match self {
            RiseFall::Rise => "rise",
            RiseFall::Fall => "fall",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_roundtrip() {
        for rf in RiseFall::both() {
            assert_eq!(RiseFall::from_index(rf.index()), rf);
        }
    }

    #[test]
    fn opposite() {
        assert_eq!(RiseFall::Rise.opposite(), RiseFall::Fall);
        assert_eq!(RiseFall::Fall.opposite(), RiseFall::Rise);
    }

    #[test]
    #[should_panic]
    fn from_index_out_of_range() {
        RiseFall::from_index(2);
    }

    #[test]
    fn names() {
        assert_eq!(RiseFall::Rise.as_str(), "rise");
        assert_eq!(RiseFall::Fall.as_str(), "fall");
    }
}
