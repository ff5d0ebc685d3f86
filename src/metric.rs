use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{ClusterError, Result};

/// Dissimilarity between two feature vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// L2 norm of the element-wise difference.
    #[default]
    Euclidean,
    /// `1 - pearson(a, b)`.
    Correlation,
    /// `1 - spearman(a, b)`, Pearson over average-tie ranks.
    Spearman,
}

impl DistanceMetric {
    /// Distance between `a` and `b`.
    ///
    /// The vectors must have equal length and hold only finite values.
    /// Correlation-based metrics return `1.0` when either vector is constant.
    pub fn distance(&self, a: &[f64], b: &[f64]) -> Result<f64> {
        if a.len() != b.len() {
            return Err(ClusterError::DimensionMismatch {
                left: a.len(),
                right: b.len(),
            });
        }
        check_finite(a)?;
        check_finite(b)?;

        let d = match self {
            DistanceMetric::Euclidean => euclidean(a, b),
            DistanceMetric::Correlation => correlation_distance(a, b),
            DistanceMetric::Spearman => correlation_distance(&rank(a), &rank(b)),
        };
        if d.is_finite() {
            Ok(d)
        } else {
            Err(ClusterError::DistanceOverflow)
        }
    }
}

fn check_finite(values: &[f64]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(ClusterError::NonFinite { index }),
        None => Ok(()),
    }
}

/// Largest absolute value, `0` for an empty slice.
fn max_abs(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(0.0, |m, v| m.max(v.abs()))
}

/// L2 distance. Falls back to summing values scaled into `[-1, 1]` when the
/// plain sum of squares overflows.
fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    let sum = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f64>();
    if sum.is_finite() {
        return sum.sqrt();
    }
    let scale = max_abs(a.iter().chain(b).copied());
    let scaled = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x / scale - y / scale).powi(2))
        .sum::<f64>();
    scale * scaled.sqrt()
}

fn is_constant(values: &[f64]) -> bool {
    values.iter().all(|&v| v == values[0])
}

/// Pearson correlation, or `None` when either side is constant.
///
/// Both vectors are scaled by their largest magnitude first; the
/// coefficient is scale invariant and the sums stay bounded.
fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.is_empty() || is_constant(a) || is_constant(b) {
        return None;
    }
    let n = a.len() as f64;
    let (scale_a, scale_b) = (max_abs(a.iter().copied()), max_abs(b.iter().copied()));
    let mean_a = a.iter().map(|x| x / scale_a).sum::<f64>() / n;
    let mean_b = b.iter().map(|y| y / scale_b).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x / scale_a - mean_a;
        let dy = y / scale_b - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    let r = cov / (var_a.sqrt() * var_b.sqrt());
    if r.is_finite() {
        Some(r.clamp(-1.0, 1.0))
    } else {
        None
    }
}

fn correlation_distance(a: &[f64], b: &[f64]) -> f64 {
    match pearson(a, b) {
        Some(r) => 1.0 - r,
        None => 1.0,
    }
}

/// 1-based ranks, ties share their average rank.
fn rank(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut indexed: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j < n && indexed[j].1 == indexed[i].1 {
            j += 1;
        }
        let avg_rank = (i + j + 1) as f64 / 2.0;
        for &(original, _) in &indexed[i..j] {
            ranks[original] = avg_rank;
        }
        i = j;
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn euclidean_matches_hand_computation() {
        let d = DistanceMetric::Euclidean
            .distance(&[0.0, 0.0], &[3.0, 4.0])
            .unwrap();
        assert!((d - 5.0).abs() < EPS);
    }

    #[test]
    fn identical_vectors_are_at_zero() {
        let v = [1.5, -2.0, 7.25];
        for metric in [
            DistanceMetric::Euclidean,
            DistanceMetric::Correlation,
            DistanceMetric::Spearman,
        ] {
            let d = metric.distance(&v, &v).unwrap();
            assert!(d.abs() < EPS, "{metric:?} gave {d}");
        }
    }

    #[test]
    fn correlation_ignores_affine_scaling() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b: Vec<f64> = a.iter().map(|x| 3.0 * x + 10.0).collect();
        let d = DistanceMetric::Correlation.distance(&a, &b).unwrap();
        assert!(d.abs() < EPS);
    }

    #[test]
    fn anticorrelated_vectors_are_at_two() {
        let a = [1.0, 2.0, 3.0];
        let b = [3.0, 2.0, 1.0];
        let d = DistanceMetric::Correlation.distance(&a, &b).unwrap();
        assert!((d - 2.0).abs() < EPS);
    }

    #[test]
    fn constant_vector_falls_back_to_one() {
        let a = [4.0, 4.0, 4.0];
        let b = [1.0, 2.0, 3.0];
        assert_eq!(DistanceMetric::Correlation.distance(&a, &b).unwrap(), 1.0);
        assert_eq!(DistanceMetric::Correlation.distance(&a, &a).unwrap(), 1.0);
        assert_eq!(DistanceMetric::Spearman.distance(&b, &a).unwrap(), 1.0);
    }

    #[test]
    fn constants_with_inexact_means_fall_back_to_one() {
        // the mean of [0.1; 3] is not exactly 0.1
        let point_one = [0.1, 0.1, 0.1];
        let point_seven = [0.7, 0.7, 0.7];
        let varied = [1.0, 2.0, 4.0];
        for metric in [DistanceMetric::Correlation, DistanceMetric::Spearman] {
            assert_eq!(metric.distance(&point_one, &point_one).unwrap(), 1.0);
            assert_eq!(metric.distance(&point_one, &point_seven).unwrap(), 1.0);
            assert_eq!(metric.distance(&point_one, &varied).unwrap(), 1.0);
            assert_eq!(metric.distance(&varied, &point_seven).unwrap(), 1.0);
        }
    }

    #[test]
    fn huge_values_do_not_overflow() {
        let a = [0.0, 1e200, 3e200];
        let b = [0.0, 2e200, 1e200];
        let small_a = [0.0, 1.0, 3.0];
        let small_b = [0.0, 2.0, 1.0];

        let corr = DistanceMetric::Correlation.distance(&a, &b).unwrap();
        let expected = DistanceMetric::Correlation
            .distance(&small_a, &small_b)
            .unwrap();
        assert!((corr - expected).abs() < 1e-12, "{corr} vs {expected}");

        let l2 = DistanceMetric::Euclidean.distance(&a, &b).unwrap();
        let expected = 1e200 * 5f64.sqrt();
        assert!(l2.is_finite());
        assert!(((l2 - expected) / expected).abs() < 1e-12);
    }

    #[test]
    fn unrepresentable_distance_is_an_error() {
        let err = DistanceMetric::Euclidean
            .distance(&[1.7e308], &[-1.7e308])
            .unwrap_err();
        assert_eq!(err, ClusterError::DistanceOverflow);
    }

    #[test]
    fn spearman_sees_monotone_relation_as_identical() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [1.0, 8.0, 27.0, 64.0];
        let d = DistanceMetric::Spearman.distance(&a, &b).unwrap();
        assert!(d.abs() < EPS);
    }

    #[test]
    fn ranks_average_ties() {
        assert_eq!(rank(&[10.0, 20.0, 20.0, 5.0]), vec![2.0, 3.5, 3.5, 1.0]);
    }

    #[test]
    fn unequal_lengths_are_rejected() {
        let err = DistanceMetric::Euclidean
            .distance(&[1.0, 2.0], &[1.0])
            .unwrap_err();
        assert_eq!(err, ClusterError::DimensionMismatch { left: 2, right: 1 });
    }

    #[test]
    fn nan_input_is_rejected() {
        let err = DistanceMetric::Correlation
            .distance(&[1.0, f64::NAN], &[1.0, 2.0])
            .unwrap_err();
        assert_eq!(err, ClusterError::NonFinite { index: 1 });
    }
}
