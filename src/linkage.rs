use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Rule for the distance between a freshly merged cluster and the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    /// Nearest member pair.
    Single,
    /// Farthest member pair.
    Complete,
    /// Size-weighted mean (UPGMA).
    #[default]
    Average,
}

impl Linkage {
    /// Distance from `A ∪ B` to some other cluster `O`, given `d(A,O)`,
    /// `d(B,O)` and the member counts of `A` and `B`.
    #[inline]
    pub fn update(self, d_a: f64, size_a: usize, d_b: f64, size_b: usize) -> f64 {
        match self {
            Linkage::Single => d_a.min(d_b),
            Linkage::Complete => d_a.max(d_b),
            Linkage::Average => {
                // stays between d_a and d_b, so finite inputs give a finite mean
                let weight_b = size_b as f64 / (size_a + size_b) as f64;
                d_a + (d_b - d_a) * weight_b
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_takes_minimum() {
        assert_eq!(Linkage::Single.update(3.0, 1, 7.0, 5), 3.0);
    }

    #[test]
    fn complete_takes_maximum() {
        assert_eq!(Linkage::Complete.update(3.0, 1, 7.0, 5), 7.0);
    }

    #[test]
    fn average_weights_by_member_count() {
        // (3*1 + 7*3) / 4
        assert_eq!(Linkage::Average.update(3.0, 1, 7.0, 3), 6.0);
        assert_eq!(Linkage::Average.update(2.0, 2, 4.0, 2), 3.0);
    }

    #[test]
    fn average_of_huge_distances_is_finite() {
        let d = Linkage::Average.update(1.5e308, 3, 1.7e308, 5);
        assert!(d.is_finite());
        assert!((1.5e308..=1.7e308).contains(&d));
    }
}
