//! Binary merge tree produced by the clusterer.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// One merge step: clusters `left` and `right` joined into `id` at `height`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Merge {
    pub id: usize,
    pub left: usize,
    pub right: usize,
    pub height: f64,
    /// Number of original items under the new cluster.
    pub size: usize,
}

/// Strict binary tree; every parent owns its two children.
#[derive(Debug, Clone, PartialEq)]
pub enum Dendrogram {
    Leaf {
        index: usize,
    },
    Node {
        id: usize,
        height: f64,
        size: usize,
        left: Box<Dendrogram>,
        right: Box<Dendrogram>,
    },
}

impl Dendrogram {
    pub fn leaf(index: usize) -> Self {
        Dendrogram::Leaf { index }
    }

    pub fn merge(id: usize, height: f64, left: Dendrogram, right: Dendrogram) -> Self {
        let size = left.leaf_count() + right.leaf_count();
        Dendrogram::Node {
            id,
            height,
            size,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Cluster id; leaves use their item index.
    pub fn id(&self) -> usize {
        match self {
            Dendrogram::Leaf { index } => *index,
            Dendrogram::Node { id, .. } => *id,
        }
    }

    /// Merge height, `0` for leaves.
    pub fn height(&self) -> f64 {
        match self {
            Dendrogram::Leaf { .. } => 0.0,
            Dendrogram::Node { height, .. } => *height,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Dendrogram::Leaf { .. })
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            Dendrogram::Leaf { .. } => 1,
            Dendrogram::Node { size, .. } => *size,
        }
    }

    pub fn merge_count(&self) -> usize {
        self.leaf_count() - 1
    }

    /// Largest merge height anywhere in the tree.
    pub fn max_height(&self) -> f64 {
        match self {
            Dendrogram::Leaf { .. } => 0.0,
            Dendrogram::Node {
                height, left, right, ..
            } => height.max(left.max_height()).max(right.max_height()),
        }
    }

    /// Item indices in left-then-right traversal order.
    ///
    /// Items merged early end up next to each other.
    pub fn leaf_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.leaf_count());
        self.collect_leaves(&mut order);
        order
    }

    fn collect_leaves(&self, out: &mut Vec<usize>) {
        match self {
            Dendrogram::Leaf { index } => out.push(*index),
            Dendrogram::Node { left, right, .. } => {
                left.collect_leaves(out);
                right.collect_leaves(out);
            }
        }
    }

    /// Flat cluster label per item: each maximal subtree with height
    /// `<= threshold` becomes one cluster. Labels count up in leaf order.
    ///
    /// The result is indexed by item index and sized to the largest leaf
    /// index under this node; entries for items outside it stay `0`.
    pub fn cut(&self, threshold: f64) -> Vec<usize> {
        let len = self.leaf_order().into_iter().max().map_or(0, |m| m + 1);
        let mut labels = vec![0; len];
        let mut next = 0;
        self.cut_into(threshold, &mut labels, &mut next);
        labels
    }

    fn cut_into(&self, threshold: f64, labels: &mut [usize], next: &mut usize) {
        match self {
            Dendrogram::Node { left, right, .. } if self.height() > threshold => {
                left.cut_into(threshold, labels, next);
                right.cut_into(threshold, labels, next);
            }
            _ => {
                for index in self.leaf_order() {
                    labels[index] = *next;
                }
                *next += 1;
            }
        }
    }

    /// Hex SHA-256 of the tree shape, leaf indices and merge heights.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        self.feed(&mut hasher);
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }

    fn feed(&self, hasher: &mut Sha256) {
        match self {
            Dendrogram::Leaf { index } => {
                hasher.update(b"L");
                hasher.update((*index as u64).to_le_bytes());
            }
            Dendrogram::Node {
                height, left, right, ..
            } => {
                hasher.update(b"N");
                hasher.update(height.to_bits().to_le_bytes());
                left.feed(hasher);
                right.feed(hasher);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ((0,1)@1, (2,3)@1)@5
    fn four_leaves() -> Dendrogram {
        let a = Dendrogram::merge(4, 1.0, Dendrogram::leaf(0), Dendrogram::leaf(1));
        let b = Dendrogram::merge(5, 1.0, Dendrogram::leaf(2), Dendrogram::leaf(3));
        Dendrogram::merge(6, 5.0, a, b)
    }

    #[test]
    fn counts_and_heights() {
        let tree = four_leaves();
        assert_eq!(tree.leaf_count(), 4);
        assert_eq!(tree.merge_count(), 3);
        assert_eq!(tree.id(), 6);
        assert_eq!(tree.max_height(), 5.0);
        assert_eq!(Dendrogram::leaf(9).merge_count(), 0);
        assert_eq!(Dendrogram::leaf(9).height(), 0.0);
        assert!(Dendrogram::leaf(9).is_leaf());
        assert!(!tree.is_leaf());
    }

    #[test]
    fn leaf_order_is_left_then_right() {
        let tree = Dendrogram::merge(
            4,
            2.0,
            Dendrogram::merge(3, 1.0, Dendrogram::leaf(2), Dendrogram::leaf(0)),
            Dendrogram::leaf(1),
        );
        assert_eq!(tree.leaf_order(), vec![2, 0, 1]);
    }

    #[test]
    fn cut_between_levels() {
        let tree = four_leaves();
        assert_eq!(tree.cut(10.0), vec![0, 0, 0, 0]);
        assert_eq!(tree.cut(2.0), vec![0, 0, 1, 1]);
        assert_eq!(tree.cut(0.5), vec![0, 1, 2, 3]);
    }

    #[test]
    fn cut_of_a_subtree_uses_item_indices() {
        let Dendrogram::Node { right, .. } = four_leaves() else {
            unreachable!()
        };
        let labels = right.cut(0.5);
        assert_eq!(labels.len(), 4);
        assert_eq!((labels[2], labels[3]), (0, 1));
        assert_eq!(right.cut(1.0)[2..].to_vec(), vec![0, 0]);
    }

    #[test]
    fn fingerprint_tracks_structure() {
        let a = four_leaves().fingerprint();
        assert_eq!(a, four_leaves().fingerprint());
        assert_eq!(a.len(), 64);

        let swapped = Dendrogram::merge(
            6,
            5.0,
            Dendrogram::merge(5, 1.0, Dendrogram::leaf(2), Dendrogram::leaf(3)),
            Dendrogram::merge(4, 1.0, Dendrogram::leaf(0), Dendrogram::leaf(1)),
        );
        assert_ne!(a, swapped.fingerprint());
    }
}
