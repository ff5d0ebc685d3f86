use log::debug;
use rayon::prelude::*;

use crate::error::{ClusterError, Result};
use crate::matrix::Matrix;
use crate::metric::DistanceMetric;

/// Relative tolerance used when checking a caller-supplied matrix for symmetry.
const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Symmetric `n x n` distance table with a zero diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    /// Compute all pairwise distances between `items`.
    ///
    /// Only the upper triangle goes through the metric; it is mirrored into
    /// the lower triangle and the diagonal stays zero.
    pub fn build<T>(items: &[T], metric: DistanceMetric) -> Result<Self>
    where
        T: AsRef<[f64]> + Sync,
    {
        let n = items.len();
        debug!("Computing {}x{} pairwise {:?} distance matrix", n, n, metric);

        let pairs: Vec<(usize, usize, f64)> = (0..n)
            .into_par_iter()
            .flat_map_iter(|i| {
                (i + 1..n).map(move |j| {
                    metric
                        .distance(items[i].as_ref(), items[j].as_ref())
                        .map(|d| (i, j, d))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut data = vec![0.0; n * n];
        for (i, j, d) in pairs {
            data[i * n + j] = d;
            data[j * n + i] = d;
        }
        Ok(DistanceMatrix { n, data })
    }

    /// Distances between the rows of `matrix`.
    pub fn from_matrix_rows(matrix: &Matrix, metric: DistanceMetric) -> Result<Self> {
        let rows: Vec<&[f64]> = matrix.iter_rows().collect();
        Self::build(&rows, metric)
    }

    /// Accept a precomputed table after checking it is a valid distance matrix.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n = rows.len();
        let mut data = Vec::with_capacity(n * n);
        for row in rows {
            if row.len() != n {
                return Err(ClusterError::NotSquare {
                    rows: n,
                    cols: row.len(),
                });
            }
            data.extend(row);
        }

        for i in 0..n {
            if data[i * n + i] != 0.0 {
                return Err(ClusterError::NonZeroDiagonal { index: i });
            }
            for j in (i + 1)..n {
                let upper = data[i * n + j];
                let lower = data[j * n + i];
                for (r, c, value) in [(i, j, upper), (j, i, lower)] {
                    if value.is_nan() || value < 0.0 || value.is_infinite() {
                        return Err(ClusterError::InvalidDistance { i: r, j: c, value });
                    }
                }
                let scale = upper.abs().max(lower.abs()).max(1.0);
                if (upper - lower).abs() > SYMMETRY_TOLERANCE * scale {
                    return Err(ClusterError::Asymmetric { i, j });
                }
            }
        }
        Ok(DistanceMatrix { n, data })
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }
}
