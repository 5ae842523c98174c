//! Delay values and float comparison helpers.

use crate::minmax::MinMax;

/// A delay or time value in seconds.
///
/// Stored as `f32` to keep per-vertex and per-edge tables small; the
/// parasitic reducer carries intermediate moments in `f64` and narrows at
/// the boundary.
pub type Delay = f32;

/// The zero delay.
pub const DELAY_ZERO: Delay = 0.0;

/// The initial value for accumulating on the given min/max side.
pub fn delay_init(min_max: MinMax) -> Delay {
    min_max.init_value()
}

/// Relative-tolerance float equality.
///
/// Two values are fuzzy-equal when they differ by less than 1e-6 of their
/// magnitude, or both are within 1e-20 of zero.
pub fn fuzzy_equal(a: f32, b: f32) -> bool {
    if a == b {
        true
    } else if a == 0.0 {
        b.abs() < 1e-20
    } else if b == 0.0 {
        a.abs() < 1e-20
    } else {
        (a - b).abs() < 1e-6 * a.abs().max(b.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_values() {
        assert_eq!(delay_init(MinMax::Max), f32::NEG_INFINITY);
        assert_eq!(delay_init(MinMax::Min), f32::INFINITY);
    }

    #[test]
    fn fuzzy_exact() {
        assert!(fuzzy_equal(1.5, 1.5));
        assert!(fuzzy_equal(0.0, 0.0));
    }

    #[test]
    fn fuzzy_near() {
        assert!(fuzzy_equal(1.0, 1.0 + 1e-9));
        assert!(!fuzzy_equal(1.0, 1.001));
    }

    #[test]
    fn fuzzy_near_zero() {
        assert!(fuzzy_equal(0.0, 1e-25));
        assert!(!fuzzy_equal(0.0, 1e-9));
    }

    #[test]
    fn fuzzy_infinities() {
        assert!(fuzzy_equal(f32::INFINITY, f32::INFINITY));
        assert!(!fuzzy_equal(f32::INFINITY, f32::NEG_INFINITY));
    }
}
