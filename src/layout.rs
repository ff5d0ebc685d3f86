//! Dendrogram geometry in normalized `[0,1] x [0,1]` space.
//!
//! The tree is laid out once on abstract axes: *depth* (0 at the leaves, 1 at
//! the root) and *position* (leaf slots spread evenly along the matrix edge).
//! An [`Orientation`] then maps those axes onto `x`/`y`:
//!
//! - `Side`: depth runs right to left, root at `x = 0`, leaves at `x = 1`.
//!   Used for row dendrograms drawn left of the matrix.
//! - `Top`: depth runs bottom to top, root at `y = 0`, leaves at `y = 1`.
//!   Used for column dendrograms drawn above the matrix.

use serde::Serialize;

use crate::dendrogram::Dendrogram;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Side,
    Top,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Vertical,
    Horizontal,
}

/// A drawable segment; both endpoints lie in `[0,1] x [0,1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutLine {
    pub kind: LineKind,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Joins the two children's positions at the parent's depth.
    Connector,
    /// Runs from a child's depth up to the parent's depth at the child's position.
    Stem,
}

/// Orientation-free segment; points are `(depth, position)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub from: (f64, f64),
    pub to: (f64, f64),
}

impl Segment {
    pub fn orient(&self, orientation: Orientation) -> LayoutLine {
        let (x1, y1) = place(self.from, orientation);
        let (x2, y2) = place(self.to, orientation);
        let kind = match (self.kind, orientation) {
            (SegmentKind::Connector, Orientation::Side) | (SegmentKind::Stem, Orientation::Top) => {
                LineKind::Vertical
            }
            (SegmentKind::Connector, Orientation::Top) | (SegmentKind::Stem, Orientation::Side) => {
                LineKind::Horizontal
            }
        };
        LayoutLine {
            kind,
            x1,
            y1,
            x2,
            y2,
        }
    }
}

fn place((depth, position): (f64, f64), orientation: Orientation) -> (f64, f64) {
    match orientation {
        Orientation::Side => (1.0 - depth, position),
        Orientation::Top => (position, 1.0 - depth),
    }
}

/// Abstract segments for `tree`: one connector and two stems per merge.
///
/// Returns nothing when every merge height is zero (including trees with a
/// single leaf), since depth cannot be normalized.
pub fn segments(tree: &Dendrogram) -> Vec<Segment> {
    let max_height = tree.max_height();
    if max_height <= 0.0 || !max_height.is_finite() {
        return Vec::new();
    }

    let mut walker = Walker {
        slots: tree.leaf_count() as f64,
        max_height,
        next_leaf: 0,
        out: Vec::with_capacity(3 * tree.merge_count()),
    };
    walker.visit(tree);
    walker.out
}

/// Physical lines for `tree` in the given orientation.
pub fn layout(tree: &Dendrogram, orientation: Orientation) -> Vec<LayoutLine> {
    segments(tree)
        .iter()
        .map(|s| s.orient(orientation))
        .collect()
}

struct Walker {
    slots: f64,
    max_height: f64,
    next_leaf: usize,
    out: Vec<Segment>,
}

impl Walker {
    /// Returns the `(depth, position)` of `node`.
    fn visit(&mut self, node: &Dendrogram) -> (f64, f64) {
        match node {
            Dendrogram::Leaf { .. } => {
                let position = (self.next_leaf as f64 + 0.5) / self.slots;
                self.next_leaf += 1;
                (0.0, position)
            }
            Dendrogram::Node {
                height, left, right, ..
            } => {
                let (left_depth, left_pos) = self.visit(left);
                let (right_depth, right_pos) = self.visit(right);
                let depth = (height / self.max_height).clamp(0.0, 1.0);
                let position = (left_pos + right_pos) / 2.0;

                self.out.push(Segment {
                    kind: SegmentKind::Connector,
                    from: (depth, left_pos),
                    to: (depth, right_pos),
                });
                self.out.push(Segment {
                    kind: SegmentKind::Stem,
                    from: (left_depth, left_pos),
                    to: (depth, left_pos),
                });
                self.out.push(Segment {
                    kind: SegmentKind::Stem,
                    from: (right_depth, right_pos),
                    to: (depth, right_pos),
                });
                (depth, position)
            }
        }
    }
}
