use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the clustering engine.
///
/// Every variant describes a caller mistake (bad shape, bad values). Empty and
/// single-item inputs are valid and never produce an error.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClusterError {
    /// Two vectors that must be compared have different lengths.
    #[error("dimension mismatch: left={left}, right={right}")]
    DimensionMismatch { left: usize, right: usize },
    /// A distance matrix was not square.
    #[error("distance matrix must be square (got {rows}x{cols})")]
    NotSquare { rows: usize, cols: usize },
    /// A distance matrix had a non-zero entry on its diagonal.
    #[error("distance matrix diagonal at {index} is not zero")]
    NonZeroDiagonal { index: usize },
    /// A distance matrix had `d(i,j) != d(j,i)`.
    #[error("distance matrix is not symmetric at ({i}, {j})")]
    Asymmetric { i: usize, j: usize },
    /// A distance was negative or NaN.
    #[error("invalid distance {value} at ({i}, {j})")]
    InvalidDistance { i: usize, j: usize, value: f64 },
    /// A row of a rectangular matrix had the wrong number of columns.
    #[error("row {row} has {found} values, expected {expected}")]
    RaggedMatrix {
        row: usize,
        expected: usize,
        found: usize,
    },
    /// An input vector held NaN or an infinity.
    #[error("non-finite value at position {index}")]
    NonFinite { index: usize },
    /// A distance between two finite vectors is too large to represent.
    #[error("distance exceeds the largest finite value")]
    DistanceOverflow,
    /// A row or column order was not a permutation of `0..expected`.
    #[error("order is not a permutation of 0..{expected}")]
    InvalidPermutation { expected: usize },
}

pub type Result<T> = std::result::Result<T, ClusterError>;

/// Errors raised while loading or saving matrices and results.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("could not access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path:?} line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("{path:?} has no header line")]
    MissingHeader { path: PathBuf },
    #[error(transparent)]
    Cluster(#[from] ClusterError),
    #[error("could not encode JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not encode image: {0}")]
    Image(#[from] image::ImageError),
}

impl IoError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IoError::Io {
            path: path.into(),
            source,
        }
    }
}
