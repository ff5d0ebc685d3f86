//! Dense row-major matrix and the reorder (gather) step.

use crate::error::{ClusterError, Result};

/// Rectangular `rows x cols` matrix of `f64`, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Wrap a flat row-major buffer.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(ClusterError::RaggedMatrix {
                row: 0,
                expected: rows * cols,
                found: data.len(),
            });
        }
        Ok(Matrix { rows, cols, data })
    }

    /// Build from nested rows; every row must have the length of the first.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let n_rows = rows.len();
        let mut data = Vec::with_capacity(n_rows * cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != cols {
                return Err(ClusterError::RaggedMatrix {
                    row: i,
                    expected: cols,
                    found: row.len(),
                });
            }
            data.extend(row);
        }
        Ok(Matrix {
            rows: n_rows,
            cols,
            data,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.rows).map(move |i| self.row(i))
    }

    pub fn transpose(&self) -> Matrix {
        let mut data = vec![0.0; self.data.len()];
        for i in 0..self.rows {
            for j in 0..self.cols {
                data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }
        Matrix {
            rows: self.cols,
            cols: self.rows,
            data,
        }
    }

    /// Row-wise z-score: subtract the row mean, divide by the sample
    /// standard deviation. Constant rows (and rows with fewer than two
    /// values) are only centered.
    pub fn zscore_rows(&self) -> Matrix {
        let mut data = Vec::with_capacity(self.data.len());
        for row in self.iter_rows() {
            let n = row.len() as f64;
            let mean = if row.is_empty() {
                0.0
            } else {
                row.iter().sum::<f64>() / n
            };
            let std = if row.len() < 2 {
                0.0
            } else {
                (row.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
            };
            let scale = if std > 0.0 { std } else { 1.0 };
            data.extend(row.iter().map(|x| (x - mean) / scale));
        }
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data,
        }
    }

    /// Gather rows and columns: `out[i][j] = self[row_order[i]][col_order[j]]`.
    ///
    /// Each order must be a permutation of the matching dimension.
    pub fn reorder(&self, row_order: &[usize], col_order: &[usize]) -> Result<Matrix> {
        check_permutation(row_order, self.rows)?;
        check_permutation(col_order, self.cols)?;

        let mut data = Vec::with_capacity(self.data.len());
        for &r in row_order {
            let src = self.row(r);
            data.extend(col_order.iter().map(|&c| src[c]));
        }
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            data,
        })
    }
}

/// Fail unless `order` holds every index in `0..len` exactly once.
pub fn check_permutation(order: &[usize], len: usize) -> Result<()> {
    let invalid = ClusterError::InvalidPermutation { expected: len };
    if order.len() != len {
        return Err(invalid);
    }
    let mut seen = vec![false; len];
    for &idx in order {
        match seen.get_mut(idx) {
            Some(slot) if !*slot => *slot = true,
            _ => return Err(invalid),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Matrix {
        Matrix::from_rows(vec![
            vec![1.0, 2.0, 3.0],
            vec![4.0, 5.0, 6.0],
        ])
        .unwrap()
    }

    #[test]
    fn reorder_gathers_rows_and_columns() {
        let m = sample();
        let r = m.reorder(&[1, 0], &[2, 0, 1]).unwrap();
        assert_eq!(r.row(0), &[6.0, 4.0, 5.0]);
        assert_eq!(r.row(1), &[3.0, 1.0, 2.0]);
        for i in 0..2 {
            for j in 0..3 {
                assert_eq!(r.get(i, j), m.get([1, 0][i], [2, 0, 1][j]));
            }
        }
    }

    #[test]
    fn reorder_rejects_non_permutations() {
        let m = sample();
        assert_eq!(
            m.reorder(&[0, 0], &[0, 1, 2]).unwrap_err(),
            ClusterError::InvalidPermutation { expected: 2 }
        );
        assert_eq!(
            m.reorder(&[0, 1], &[0, 1]).unwrap_err(),
            ClusterError::InvalidPermutation { expected: 3 }
        );
        assert!(m.reorder(&[0, 1], &[0, 1, 3]).is_err());
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert_eq!(
            err,
            ClusterError::RaggedMatrix {
                row: 1,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn transpose_swaps_axes() {
        let t = sample().transpose();
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t.row(0), &[1.0, 4.0]);
        assert_eq!(t.row(2), &[3.0, 6.0]);
    }

    #[test]
    fn zscore_centers_and_scales_rows() {
        let z = sample().zscore_rows();
        assert_eq!(z.row(0), &[-1.0, 0.0, 1.0]);
        assert_eq!(z.row(1), &[-1.0, 0.0, 1.0]);

        let flat = Matrix::from_rows(vec![vec![2.0, 2.0]]).unwrap().zscore_rows();
        assert_eq!(flat.row(0), &[0.0, 0.0]);
    }

    #[test]
    fn empty_matrix_has_no_rows() {
        let m = Matrix::from_rows(Vec::new()).unwrap();
        assert_eq!(m.shape(), (0, 0));
        assert_eq!(m.iter_rows().count(), 0);
        assert_eq!(m.reorder(&[], &[]).unwrap(), m);
    }
}
