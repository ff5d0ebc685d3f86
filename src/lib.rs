//! Hierarchical clustering and dendrogram layout for heatmap-style matrices.
//!
//! The pipeline for one axis is:
//! vectors → [`DistanceMatrix`] → [`cluster()`] → [`Dendrogram`] →
//! leaf order + [`layout()`]. [`cluster_matrix`] runs it for the rows and the
//! columns of a [`Matrix`] and gathers the matrix into the clustered order.
//!
//! Every call owns all of its state, so independent calls may run on
//! different threads at the same time.

pub mod cluster;
pub mod dendrogram;
pub mod distance;
pub mod error;
pub mod io;
pub mod layout;
pub mod linkage;
pub mod matrix;
pub mod metric;
pub mod render;

use log::{debug, info};
use serde::{Deserialize, Serialize};

pub use cluster::{cluster, Clustering};
pub use dendrogram::{Dendrogram, Merge};
pub use distance::DistanceMatrix;
pub use error::{ClusterError, IoError, Result};
pub use layout::{layout, LayoutLine, LineKind, Orientation};
pub use linkage::Linkage;
pub use matrix::Matrix;
pub use metric::DistanceMetric;

/// Options for a clustering run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub metric: DistanceMetric,
    pub linkage: Linkage,
    /// Z-score each row before measuring distances.
    pub normalize: bool,
    /// Also cluster the columns of a matrix; otherwise they keep their order.
    pub cluster_columns: bool,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        ClusterConfig {
            metric: DistanceMetric::Euclidean,
            linkage: Linkage::Average,
            normalize: false,
            cluster_columns: true,
        }
    }
}

/// Result for one axis (rows or columns).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisClustering {
    /// Permutation of the original indices.
    pub order: Vec<usize>,
    pub merges: Vec<Merge>,
    pub layout: Vec<LayoutLine>,
    pub fingerprint: Option<String>,
    #[serde(skip)]
    pub dendrogram: Option<Dendrogram>,
}

impl AxisClustering {
    fn from_clustering(clustering: Clustering, orientation: Orientation) -> Self {
        let Clustering { root, merges } = clustering;
        let order = root.as_ref().map(Dendrogram::leaf_order).unwrap_or_default();
        let layout = root
            .as_ref()
            .map(|tree| layout::layout(tree, orientation))
            .unwrap_or_default();
        AxisClustering {
            order,
            merges,
            layout,
            fingerprint: root.as_ref().map(Dendrogram::fingerprint),
            dendrogram: root,
        }
    }

    /// Flat cluster label per original index, cut at `height`.
    /// Empty when there is no tree.
    pub fn cut(&self, height: f64) -> Vec<usize> {
        self.dendrogram
            .as_ref()
            .map(|tree| tree.cut(height))
            .unwrap_or_default()
    }
}

/// Cluster a set of equal-length vectors.
pub fn cluster_items<T>(
    items: &[T],
    config: &ClusterConfig,
    orientation: Orientation,
) -> Result<AxisClustering>
where
    T: AsRef<[f64]> + Sync,
{
    let distances = DistanceMatrix::build(items, config.metric)?;
    let clustering = cluster::cluster(&distances, config.linkage);
    Ok(AxisClustering::from_clustering(clustering, orientation))
}

/// Rows, optional columns, and the reordered matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixClustering {
    pub config: ClusterConfig,
    pub rows: AxisClustering,
    pub columns: Option<AxisClustering>,
    #[serde(skip)]
    pub reordered: Matrix,
}

impl MatrixClustering {
    /// Column order, the identity when columns were not clustered.
    pub fn column_order(&self) -> Vec<usize> {
        match &self.columns {
            Some(axis) => axis.order.clone(),
            None => (0..self.reordered.cols()).collect(),
        }
    }
}

/// Cluster the rows and (optionally) the columns of `matrix`.
///
/// Both axes are independent and run concurrently. Normalization only
/// affects distances; `reordered` holds the original values.
pub fn cluster_matrix(matrix: &Matrix, config: &ClusterConfig) -> Result<MatrixClustering> {
    let (n_rows, n_cols) = matrix.shape();
    info!(
        "Clustering {}x{} matrix ({:?} distance, {:?} linkage)",
        n_rows, n_cols, config.metric, config.linkage
    );

    let prepared = if config.normalize {
        debug!("Z-score normalizing rows");
        matrix.zscore_rows()
    } else {
        matrix.clone()
    };

    let (rows, columns) = rayon::join(
        || cluster_axis(&prepared, config, Orientation::Side),
        || {
            if config.cluster_columns {
                cluster_axis(&prepared.transpose(), config, Orientation::Top).map(Some)
            } else {
                Ok(None)
            }
        },
    );
    let rows = rows?;
    let columns = columns?;

    let column_order: Vec<usize> = match &columns {
        Some(axis) => axis.order.clone(),
        None => (0..n_cols).collect(),
    };
    let reordered = matrix.reorder(&rows.order, &column_order)?;

    Ok(MatrixClustering {
        config: *config,
        rows,
        columns,
        reordered,
    })
}

fn cluster_axis(
    matrix: &Matrix,
    config: &ClusterConfig,
    orientation: Orientation,
) -> Result<AxisClustering> {
    let distances = DistanceMatrix::from_matrix_rows(matrix, config.metric)?;
    let clustering = cluster::cluster(&distances, config.linkage);
    Ok(AxisClustering::from_clustering(clustering, orientation))
}
