//! Distance to similarity conversion.
//!
//! Raw distances are what the store computes and orders by; normalized
//! scores are what callers see. Pagination correctness depends on the two
//! directions being exact inverses over each metric's valid score domain:
//! a cursor stores the last row's score, and the next page converts it back
//! to the distance bound for the keyset predicate.
//!
//! Per metric:
//!
//! | Metric | distance → score | score → distance |
//! |--------|------------------|------------------|
//! | Cosine | `max(0, 1 - d)` | `1 - s` |
//! | L2 | `1 / (1 + d)` | `1/s - 1` |
//! | InnerProduct | `-d` | `-s` |
//!
//! `score_to_distance` is total: for L2 a score of 0 maps to infinity rather
//! than panicking. Callers that turn scores into SQL bounds skip non-finite
//! results.

use crate::types::Metric;

/// Convert a raw distance to a normalized similarity score.
pub fn distance_to_score(distance: f64, metric: Metric) -> f64 {
    match metric {
        Metric::Cosine => (1.0 - distance).max(0.0),
        Metric::L2 => 1.0 / (1.0 + distance),
        Metric::InnerProduct => -distance,
    }
}

/// Convert a similarity score back to a raw distance bound.
///
/// Inverse of [`distance_to_score`] over each metric's valid score domain:
/// `[0, 1]` for cosine, `(0, 1]` for L2, all finite scores for inner
/// product. Outside those domains the result may be non-finite.
pub fn score_to_distance(score: f64, metric: Metric) -> f64 {
    match metric {
        Metric::Cosine => 1.0 - score,
        Metric::L2 => (1.0 / score) - 1.0,
        Metric::InnerProduct => -score,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TOLERANCE: f64 = 1e-9;

    #[test]
    fn test_cosine_distance_to_score() {
        assert_eq!(distance_to_score(0.0, Metric::Cosine), 1.0);
        assert_eq!(distance_to_score(1.0, Metric::Cosine), 0.0);
        assert!((distance_to_score(0.2, Metric::Cosine) - 0.8).abs() < TOLERANCE);
        // Cosine distance can reach 2.0; score clamps at 0
        assert_eq!(distance_to_score(1.5, Metric::Cosine), 0.0);
    }

    #[test]
    fn test_l2_distance_to_score() {
        assert_eq!(distance_to_score(0.0, Metric::L2), 1.0);
        assert_eq!(distance_to_score(1.0, Metric::L2), 0.5);
        assert!((distance_to_score(3.0, Metric::L2) - 0.25).abs() < TOLERANCE);
    }

    #[test]
    fn test_inner_product_distance_to_score() {
        assert_eq!(distance_to_score(-0.9, Metric::InnerProduct), 0.9);
        assert_eq!(distance_to_score(0.5, Metric::InnerProduct), -0.5);
    }

    #[test]
    fn test_score_to_distance() {
        assert_eq!(score_to_distance(1.0, Metric::Cosine), 0.0);
        assert!((score_to_distance(0.8, Metric::Cosine) - 0.2).abs() < TOLERANCE);
        assert_eq!(score_to_distance(0.5, Metric::L2), 1.0);
        assert_eq!(score_to_distance(0.9, Metric::InnerProduct), -0.9);
    }

    #[test]
    fn test_l2_zero_score_is_infinite_not_panicking() {
        let distance = score_to_distance(0.0, Metric::L2);
        assert!(distance.is_infinite());
    }

    proptest! {
        #[test]
        fn prop_cosine_round_trip(score in 0.0_f64..=1.0) {
            let distance = score_to_distance(score, Metric::Cosine);
            let back = distance_to_score(distance, Metric::Cosine);
            prop_assert!((back - score).abs() < TOLERANCE);
        }

        #[test]
        fn prop_l2_round_trip(score in 0.001_f64..=1.0) {
            let distance = score_to_distance(score, Metric::L2);
            let back = distance_to_score(distance, Metric::L2);
            prop_assert!((back - score).abs() < TOLERANCE);
        }

        #[test]
        fn prop_inner_product_round_trip(score in -1.0e6_f64..=1.0e6) {
            let distance = score_to_distance(score, Metric::InnerProduct);
            let back = distance_to_score(distance, Metric::InnerProduct);
            prop_assert!((back - score).abs() <= score.abs() * 1e-12 + TOLERANCE);
        }

        #[test]
        fn prop_scores_decrease_with_distance(d1 in 0.0_f64..10.0, d2 in 0.0_f64..10.0) {
            // Larger distance never yields a larger score, for any metric
            let (near, far) = if d1 <= d2 { (d1, d2) } else { (d2, d1) };
            for metric in [Metric::Cosine, Metric::L2, Metric::InnerProduct] {
                prop_assert!(distance_to_score(near, metric) >= distance_to_score(far, metric));
            }
        }
    }
}
