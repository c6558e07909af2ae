/// Floating point type used throughout the system
pub type Real = f64;

/// Absolute/relative epsilon for time comparisons.
///
/// Discrete sample times smaller than this are not supported.
pub const EPS: Real = 1e-12;

/// Sentinel for "no next event": any time at or above this is undefined.
pub const MAX_TIME: Real = 1e100;

/// Tolerance-based equality for simulation times.
///
/// `|a - b| <= (1 + max(|a|, |b|)) * EPS`, which absorbs the drift of
/// repeated `offset + n * period` accumulation.
pub fn time_eq(a: Real, b: Real) -> bool {
    let largest = a.abs().max(b.abs());
    (a - b).abs() <= (1.0 + largest) * EPS
}

/// `a <= b`, treating tolerance-equal values as equal.
pub fn time_le(a: Real, b: Real) -> bool {
    a < b || time_eq(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_eq_basic() {
        assert!(time_eq(1.0, 1.0));
        assert!(time_eq(1.0, 1.0 + EPS / 2.0));
        assert!(time_eq(0.0, EPS / 2.0));
        assert!(!time_eq(1.0, 11.0));
        assert!(!time_eq(0.0, 1e-9));
    }

    #[test]
    fn time_eq_absorbs_accumulated_drift() {
        let mut t = 0.0;
        for _ in 0..10 {
            t += 0.1;
        }
        assert_ne!(t, 1.0);
        assert!(time_eq(t, 1.0));
        assert!(time_eq(0.999_999_999_999, 1.0));
    }

    #[test]
    fn time_le_is_tolerant() {
        assert!(time_le(0.5, 1.0));
        assert!(time_le(1.0 + EPS / 2.0, 1.0));
        assert!(!time_le(1.1, 1.0));
    }
}
