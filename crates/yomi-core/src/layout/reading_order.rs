//! Linearization of a page's blocks into reading order.
//!
//! The relation graph only encodes a partial order. A priority depth-first
//! traversal turns it into a total one: nodes are seeded by ascending
//! distance, a node is emitted once all its parents were emitted, and nodes
//! that are not ready yet wait in an open list until something is emitted.
//! If the open list deadlocks (a cycle), its closest node is forced out.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::geometry::BoundingBox;
use crate::models::document::{Direction, Paragraph};

use super::graph::{Family, Node, RelationGraph};

/// Reading-order policy of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Western layout: top to bottom, left to right.
    #[default]
    Horizontal,
    /// Japanese vertical layout: columns right to left, top to bottom.
    Vertical,
}

impl Policy {
    /// Link family that carries precedence under this policy.
    pub fn family(&self) -> Family {
        match self {
            Policy::Horizontal => Family::Vertical,
            Policy::Vertical => Family::Horizontal,
        }
    }

    /// Tie-break distance of a block; `max_x2` is the rightmost edge on the page.
    pub fn distance(&self, bbox: &BoundingBox, max_x2: f32, weight: f32) -> f32 {
        match self {
            Policy::Horizontal => bbox.x1 + weight * bbox.y1,
            Policy::Vertical => weight * (max_x2 - bbox.x2) + bbox.y1,
        }
    }

    /// Pick the policy whose paragraphs cover the larger area; ties read horizontally.
    pub fn select(paragraphs: &[Paragraph]) -> Self {
        let (mut horizontal, mut vertical) = (0.0f32, 0.0f32);
        for p in paragraphs {
            match p.direction {
                Direction::Horizontal => horizontal += p.bbox.area(),
                Direction::Vertical => vertical += p.bbox.area(),
            }
        }
        if vertical > horizontal {
            Policy::Vertical
        } else {
            Policy::Horizontal
        }
    }
}

/// Order nodes by distance, then by index.
fn by_distance(a: &Node, b: &Node) -> Ordering {
    a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id))
}

/// Traverse `graph` along `family` and return every node index exactly once.
pub fn traverse(graph: &RelationGraph, family: Family) -> Vec<usize> {
    let nodes = graph.nodes();
    let n = nodes.len();
    if n == 0 {
        return Vec::new();
    }

    let mut pending: Vec<usize> = (0..n).collect();
    pending.sort_by(|&a, &b| by_distance(&nodes[a], &nodes[b]));

    let mut visited = vec![false; n];
    let mut next_child = vec![0usize; n];
    let mut order = Vec::with_capacity(n);
    let mut open_list: Vec<usize> = Vec::new();
    let mut stack = vec![pending.remove(0)];

    while order.len() < n {
        while let Some(current) = stack.pop() {
            if !visited[current] {
                let ready = nodes[current].parents(family).iter().all(|&p| visited[p]);
                if ready {
                    visited[current] = true;
                    order.push(current);
                    // Earliest deferred node ends up on top
                    stack.extend(open_list.drain(..).rev());
                } else if !open_list.contains(&current) {
                    open_list.push(current);
                }
            }

            let children = nodes[current].children(family);
            if let Some(&child) = children.get(next_child[current]) {
                next_child[current] += 1;
                stack.push(current);
                if !open_list.contains(&child) {
                    stack.push(child);
                }
            }
        }

        if order.len() == n {
            break;
        }

        if let Some(pos) = pending.iter().position(|p| !open_list.contains(p)) {
            stack.push(pending.remove(pos));
            continue;
        }

        // Every remaining node waits on another: break the cycle
        let forced = open_list
            .iter()
            .copied()
            .filter(|&i| !visited[i])
            .min_by(|&a, &b| by_distance(&nodes[a], &nodes[b]));

        let Some(forced) = forced else {
            // Unreachable while the stack/pending/open-list bookkeeping holds
            debug!("Reading order stalled with {} of {} nodes", order.len(), n);
            break;
        };

        trace!("Forcing node {} out of a cycle", forced);
        open_list.retain(|&i| i != forced);
        visited[forced] = true;
        order.push(forced);
        stack.extend(open_list.drain(..).rev());
        stack.push(forced);
    }

    order
}

/// Reading order of `boxes` under `policy`: a permutation of `0..boxes.len()`.
pub fn reading_order(boxes: &[BoundingBox], policy: Policy, distance_weight: f32) -> Vec<usize> {
    let graph = RelationGraph::build(boxes, policy, distance_weight);
    let order = traverse(&graph, policy.family());
    debug!("Reading order ({:?}) over {} blocks: {:?}", policy, boxes.len(), order);
    order
}
