//! Search nodes, the frontier, and the visited table used by a single sub-search.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ndarray::Array2;

use crate::map::GridPoint;

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

/// A node in the search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchNode {
    pub point: GridPoint,

    /// Cost accumulated from the start of the sub-search to this node.
    pub movement_cost: f64,

    /// `movement_cost` plus the heuristic estimate to the target.
    pub total_cost: f64,

    /// The node this one was reached from, `None` for the start node.
    pub predecessor: Option<GridPoint>,
}

/// A node waiting in the frontier, tagged with the order it was pushed in.
#[derive(Debug, Clone, Copy)]
struct Queued {
    node: SearchNode,
    seq: u64,
}

/// Min-cost-first priority queue of nodes.
///
/// Nodes with equal `total_cost` are popped in the order they were pushed.
#[derive(Debug, Default)]
pub(super) struct Frontier {
    heap: BinaryHeap<Queued>,
    pushed: u64,
}

/// Per sub-search record of finalized nodes, keyed by cell.
///
/// This is also the node arena: predecessors are stored as coordinates and resolved through
/// this table when the path is reconstructed.
#[derive(Debug)]
pub(super) struct VisitedTable {
    nodes: Array2<Option<SearchNode>>,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl SearchNode {
    /// The start node of a sub-search.
    pub fn start(point: GridPoint) -> Self {
        Self {
            point,
            movement_cost: 0.0,
            total_cost: 0.0,
            predecessor: None,
        }
    }
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: SearchNode) {
        self.heap.push(Queued {
            node,
            seq: self.pushed,
        });
        self.pushed += 1;
    }

    /// Removes and returns the node with the lowest `total_cost`.
    pub fn pop(&mut self) -> Option<SearchNode> {
        self.heap.pop().map(|q| q.node)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}

impl VisitedTable {
    /// Create an empty table for a map of shape `dim` (rows, cols).
    pub fn new(dim: (usize, usize)) -> Self {
        Self {
            nodes: Array2::from_elem(dim, None),
        }
    }

    /// Forget every node, ready for the next sub-search.
    pub fn clear(&mut self) {
        self.nodes.map_inplace(|n| *n = None);
    }

    /// Returns true if the point has already been assigned a node. The point must be in bounds.
    pub fn is_visited(&self, point: GridPoint) -> bool {
        self.nodes[Self::index(point)].is_some()
    }

    /// Record the node for its cell. Returns false, leaving the table untouched, if the cell was
    /// already visited.
    pub fn insert(&mut self, node: SearchNode) -> bool {
        let slot = &mut self.nodes[Self::index(node.point)];

        if slot.is_some() {
            return false;
        }

        *slot = Some(node);
        true
    }

    pub fn get(&self, point: GridPoint) -> Option<&SearchNode> {
        self.nodes[Self::index(point)].as_ref()
    }

    fn index(point: GridPoint) -> [usize; 2] {
        [point.y as usize, point.x as usize]
    }
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Queued {}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        // Flipped so that the max-heap pops the lowest cost, and then the earliest push
        other
            .node
            .total_cost
            .total_cmp(&self.node.total_cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
