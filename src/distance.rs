// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Scale applied to a weight before truncating it to an integer.
/// Street-level coordinate differences are around 1e-4 to 1e-6 degrees.
pub const NORMALIZATION_FACTOR: f64 = 100_000.0;

/// Calculates the sum of absolute latitude and longitude differences
/// between two positions, in degrees.
///
/// This is not a geographic distance: a degree of longitude shrinks towards
/// the poles, and the result is only good for relative comparisons
/// of nearby segments.
pub fn manhattan_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    (lat1 - lat2).abs() + (lon1 - lon2).abs()
}

/// Scales a weight by [NORMALIZATION_FACTOR] and truncates it towards zero.
///
/// Weights are non-negative, so truncation is the same as flooring.
/// Values beyond the range of [i64] saturate.
pub fn normalize_weight(weight: f64) -> i64 {
    (weight * NORMALIZATION_FACTOR) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! assert_almost_eq {
        ($a:expr, $b:expr) => {
            assert!(
                (($a - $b).abs() < 1e-12),
                "assertion failed: {} ≈ {}",
                $a,
                $b
            )
        };
    }

    #[test]
    fn manhattan_distance_sums_both_axes() {
        assert_almost_eq!(manhattan_distance(1.0, 2.0, 1.5, 1.25), 1.25);
        assert_almost_eq!(manhattan_distance(1.5, 1.25, 1.0, 2.0), 1.25);
    }

    #[test]
    fn manhattan_distance_of_same_point_is_zero() {
        assert_eq!(manhattan_distance(33.87, -117.92, 33.87, -117.92), 0.0);
    }

    #[test]
    fn normalize_weight_truncates() {
        assert_eq!(normalize_weight(0.0), 0);
        assert_eq!(normalize_weight(0.00390625), 390);
        assert_eq!(normalize_weight(0.0000099), 0);
        assert_eq!(normalize_weight(0.5), 50_000);
    }
}
