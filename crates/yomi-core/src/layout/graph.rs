//! Spatial relation graph over the blocks of a page.
//!
//! Nodes live in an arena and refer to each other by index. Two independent
//! link families are kept:
//!
//! - the vertical family links blocks stacked in one column (their X
//!   projections overlap), upper block as parent;
//! - the horizontal family links blocks side by side on one line (their Y
//!   projections overlap), rightmost block as parent.
//!
//! A link is omitted when another block sits strictly between the pair, so
//! precedence only connects neighbours.

use crate::geometry::{BoundingBox, intersects_horizontal, intersects_vertical};

use super::reading_order::Policy;

/// Link family of the relation graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// Right-to-left precedence between blocks on the same line.
    Horizontal,
    /// Top-to-bottom precedence between blocks in the same column.
    Vertical,
}

#[derive(Debug, Clone, Default)]
struct Links {
    parents: Vec<usize>,
    children: Vec<usize>,
}

/// A block in the relation graph.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: usize,
    pub bbox: BoundingBox,
    /// Tie-break key; lower reads first.
    pub distance: f32,
    horizontal: Links,
    vertical: Links,
}

impl Node {
    fn links(&self, family: Family) -> &Links {
        match family {
            Family::Horizontal => &self.horizontal,
            Family::Vertical => &self.vertical,
        }
    }

    fn links_mut(&mut self, family: Family) -> &mut Links {
        match family {
            Family::Horizontal => &mut self.horizontal,
            Family::Vertical => &mut self.vertical,
        }
    }

    pub fn parents(&self, family: Family) -> &[usize] {
        &self.links(family).parents
    }

    pub fn children(&self, family: Family) -> &[usize] {
        &self.links(family).children
    }
}

/// Arena of nodes with their precedence links.
#[derive(Debug, Clone, Default)]
pub struct RelationGraph {
    nodes: Vec<Node>,
}

impl RelationGraph {
    /// Create unlinked nodes with distances computed for `policy`.
    pub fn new(boxes: &[BoundingBox], policy: Policy, distance_weight: f32) -> Self {
        let max_x2 = boxes.iter().map(|b| b.x2).fold(f32::NEG_INFINITY, f32::max);

        let nodes = boxes
            .iter()
            .enumerate()
            .map(|(id, bbox)| Node {
                id,
                bbox: *bbox,
                distance: policy.distance(bbox, max_x2, distance_weight),
                horizontal: Links::default(),
                vertical: Links::default(),
            })
            .collect();

        Self { nodes }
    }

    /// Build the graph with both link families populated.
    pub fn build(boxes: &[BoundingBox], policy: Policy, distance_weight: f32) -> Self {
        let mut graph = Self::new(boxes, policy, distance_weight);

        for i in 0..boxes.len() {
            for j in (i + 1)..boxes.len() {
                let (a, b) = (&boxes[i], &boxes[j]);
                if !a.is_valid() || !b.is_valid() || a == b {
                    continue;
                }

                if intersects_vertical(a, b) && !occluded_vertically(boxes, i, j) {
                    if a.y1 < b.y1 {
                        graph.link(Family::Vertical, i, j);
                    } else if b.y1 < a.y1 {
                        graph.link(Family::Vertical, j, i);
                    }
                }

                if intersects_horizontal(a, b) && !occluded_horizontally(boxes, i, j) {
                    if a.x2 > b.x2 {
                        graph.link(Family::Horizontal, i, j);
                    } else if b.x2 > a.x2 {
                        graph.link(Family::Horizontal, j, i);
                    }
                }
            }
        }

        graph.sort_children();
        graph
    }

    /// Add a `parent -> child` link. Self links and duplicates are ignored.
    pub fn link(&mut self, family: Family, parent: usize, child: usize) {
        if parent == child || self.nodes[parent].children(family).contains(&child) {
            return;
        }
        self.nodes[parent].links_mut(family).children.push(child);
        self.nodes[child].links_mut(family).parents.push(parent);
    }

    /// Order children so the traversal visits geometric neighbours first:
    /// vertical children left to right, horizontal children top to bottom.
    pub fn sort_children(&mut self) {
        let boxes: Vec<BoundingBox> = self.nodes.iter().map(|n| n.bbox).collect();

        for node in &mut self.nodes {
            node.vertical
                .children
                .sort_by(|&a, &b| boxes[a].x1.total_cmp(&boxes[b].x1).then(a.cmp(&b)));
            node.horizontal
                .children
                .sort_by(|&a, &b| boxes[a].y2.total_cmp(&boxes[b].y2).then(a.cmp(&b)));
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

fn strictly_between(lo: f32, v: f32, hi: f32) -> bool {
    (lo < v && v < hi) || (hi < v && v < lo)
}

/// True if a third block sharing the column of `i` and `j` sits between them.
fn occluded_vertically(boxes: &[BoundingBox], i: usize, j: usize) -> bool {
    let (a, b) = (&boxes[i], &boxes[j]);
    boxes.iter().enumerate().any(|(k, s)| {
        k != i
            && k != j
            && intersects_vertical(s, a)
            && intersects_vertical(s, b)
            && strictly_between(a.y1, s.y1, b.y1)
            && strictly_between(a.y2, s.y2, b.y2)
            && (a.y1 < s.y1) == (a.y2 < s.y2)
    })
}

/// True if a third block sharing the line of `i` and `j` sits between them.
fn occluded_horizontally(boxes: &[BoundingBox], i: usize, j: usize) -> bool {
    let (a, b) = (&boxes[i], &boxes[j]);
    boxes.iter().enumerate().any(|(k, s)| {
        k != i
            && k != j
            && intersects_horizontal(s, a)
            && intersects_horizontal(s, b)
            && strictly_between(a.x1, s.x1, b.x1)
            && strictly_between(a.x2, s.x2, b.x2)
            && (a.x1 < s.x1) == (a.x2 < s.x2)
    })
}
