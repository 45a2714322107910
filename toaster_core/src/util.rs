//! Small numeric helpers shared by the control loop.

/// Round to two decimals, half away from zero.
#[inline]
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round2(1.005_000_1), 1.01);
        assert_eq!(round2(-7.256), -7.26);
        assert_eq!(round2(3.0), 3.0);
    }
}
