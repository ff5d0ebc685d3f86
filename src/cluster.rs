//! Agglomerative clustering over a distance matrix.
//!
//! Starts with one cluster per item and repeatedly joins the closest pair of
//! active clusters. Distances to a freshly merged cluster are derived from the
//! two old rows through the [`Linkage`] rule, never recomputed from the raw
//! vectors.
//!
//! Ties on the minimum distance go to the first pair met by an ascending-id
//! nested scan, i.e. the lexicographically smallest `(a, b)` with `a < b`.

use log::debug;
use rustc_hash::FxHashMap;

use crate::dendrogram::{Dendrogram, Merge};
use crate::distance::DistanceMatrix;
use crate::linkage::Linkage;

/// Tree and merge history of one clustering run.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    /// `None` only for an empty input.
    pub root: Option<Dendrogram>,
    /// Merges in the order they happened; ids `n, n+1, ...`.
    pub merges: Vec<Merge>,
}

impl Clustering {
    pub fn leaf_order(&self) -> Vec<usize> {
        self.root
            .as_ref()
            .map(Dendrogram::leaf_order)
            .unwrap_or_default()
    }
}

/// Working state for a single run. Built by [`cluster`] and dropped at the end.
struct Clusterer {
    linkage: Linkage,
    /// Active cluster ids, ascending.
    active: Vec<usize>,
    members: FxHashMap<usize, Vec<usize>>,
    /// Distances between active clusters keyed by `(low id, high id)`.
    distances: FxHashMap<(usize, usize), f64>,
    nodes: FxHashMap<usize, Dendrogram>,
    merges: Vec<Merge>,
    next_id: usize,
}

#[inline]
fn key(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

impl Clusterer {
    fn new(matrix: &DistanceMatrix, linkage: Linkage) -> Self {
        let n = matrix.len();
        let mut distances =
            FxHashMap::with_capacity_and_hasher(n * n.saturating_sub(1) / 2, Default::default());
        for i in 0..n {
            for j in (i + 1)..n {
                distances.insert((i, j), matrix.get(i, j));
            }
        }

        Clusterer {
            linkage,
            active: (0..n).collect(),
            members: (0..n).map(|i| (i, vec![i])).collect(),
            distances,
            nodes: (0..n).map(|i| (i, Dendrogram::leaf(i))).collect(),
            merges: Vec::with_capacity(n.saturating_sub(1)),
            next_id: n,
        }
    }

    fn distance(&self, a: usize, b: usize) -> f64 {
        self.distances[&key(a, b)]
    }

    /// Closest active pair, first in ascending-id scan order on ties.
    fn closest_pair(&self) -> Option<(usize, usize, f64)> {
        let mut best: Option<(usize, usize, f64)> = None;
        for (pos, &a) in self.active.iter().enumerate() {
            for &b in &self.active[pos + 1..] {
                let d = self.distance(a, b);
                match best {
                    Some((_, _, min)) if d >= min => {}
                    _ => best = Some((a, b, d)),
                }
            }
        }
        best
    }

    fn merge(&mut self, a: usize, b: usize, height: f64) {
        let c = self.next_id;
        self.next_id += 1;

        let members_a = self.members.remove(&a).unwrap_or_default();
        let members_b = self.members.remove(&b).unwrap_or_default();
        let (size_a, size_b) = (members_a.len(), members_b.len());

        for &o in &self.active {
            if o == a || o == b {
                continue;
            }
            let d_a = self.distances.remove(&key(a, o)).unwrap_or(f64::INFINITY);
            let d_b = self.distances.remove(&key(b, o)).unwrap_or(f64::INFINITY);
            let d_c = self.linkage.update(d_a, size_a, d_b, size_b);
            self.distances.insert(key(o, c), d_c);
        }
        self.distances.remove(&key(a, b));
        self.active.retain(|&id| id != a && id != b);
        // c is the largest id so far, so pushing keeps `active` sorted
        self.active.push(c);

        let mut joined = members_a;
        joined.extend(members_b);
        let size = joined.len();
        self.members.insert(c, joined);

        if let (Some(left), Some(right)) = (self.nodes.remove(&a), self.nodes.remove(&b)) {
            self.nodes.insert(c, Dendrogram::merge(c, height, left, right));
        }
        self.merges.push(Merge {
            id: c,
            left: a,
            right: b,
            height,
            size,
        });
    }

    fn run(mut self) -> Clustering {
        while let Some((a, b, d)) = self.closest_pair() {
            self.merge(a, b, d);
        }
        let root = self.active.first().and_then(|id| self.nodes.remove(id));
        Clustering {
            root,
            merges: self.merges,
        }
    }
}

/// Cluster the items described by `matrix` bottom-up with `linkage`.
///
/// An empty matrix gives no tree; a single item gives a lone leaf.
pub fn cluster(matrix: &DistanceMatrix, linkage: Linkage) -> Clustering {
    let n = matrix.len();
    let result = Clusterer::new(matrix, linkage).run();
    debug!(
        "{:?} linkage: {} items, {} merges, max height {:.4}",
        linkage,
        n,
        result.merges.len(),
        result.root.as_ref().map_or(0.0, Dendrogram::max_height)
    );
    result
}
