//! Routes a trail through a sequence of waypoints, using a best-first A* family search between
//! each consecutive pair.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use log::{debug, trace};
use ndarray::Array2;

use crate::map::{GridPoint, TerrainMap};

use super::{
    cost,
    node::{Frontier, VisitedTable},
    NavError, SearchNode, Weights,
};

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Value written into a [`PathMatrix`] for every cell on the path.
pub const VISITED_MARKER: i32 = 100;

// -----------------------------------------------------------------------------------------------
// TYPES
// -----------------------------------------------------------------------------------------------

/// Output of a routing call, [`VISITED_MARKER`] on every cell of the path and zero elsewhere.
pub type PathMatrix = Array2<i32>;

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Router<'a> {
    map: &'a TerrainMap,

    weights: Weights,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl<'a> Router<'a> {
    /// Create a new router over the given map, checking the weights are usable.
    pub fn new(map: &'a TerrainMap, weights: Weights) -> Result<Self, NavError> {
        weights.validate()?;

        Ok(Self { map, weights })
    }

    /// Find a path passing through every waypoint in order.
    ///
    /// Returns a matrix the shape of the map with every cell of every sub-path set to
    /// [`VISITED_MARKER`].
    pub fn route(&self, waypoints: &[GridPoint]) -> Result<PathMatrix, NavError> {
        validate_waypoints(self.map, waypoints)?;

        let mut output = PathMatrix::zeros(self.map.dim());
        let mut visited = VisitedTable::new(self.map.dim());

        for pair in waypoints.windows(2) {
            let path = self.find_path(pair[0], pair[1], &mut visited)?;

            for point in path.iter() {
                output[[point.y as usize, point.x as usize]] = VISITED_MARKER;
            }
        }

        Ok(output)
    }

    /// Find a path between two waypoints, returned as the list of cells from `start` to
    /// `target` inclusive.
    ///
    /// Both points must be inside the map.
    pub fn find_path_between(
        &self,
        start: GridPoint,
        target: GridPoint,
    ) -> Result<Vec<GridPoint>, NavError> {
        validate_waypoints(self.map, &[start, target])?;

        let mut visited = VisitedTable::new(self.map.dim());
        self.find_path(start, target, &mut visited)
    }

    /// Run a single sub-search using (and clearing) the given visited table.
    fn find_path(
        &self,
        start: GridPoint,
        target: GridPoint,
        visited: &mut VisitedTable,
    ) -> Result<Vec<GridPoint>, NavError> {
        // A repeated waypoint is its own path
        if start == target {
            trace!("Sub-search {} -> {} is a repeated waypoint", start, target);
            return Ok(vec![start]);
        }

        visited.clear();

        let mut frontier = Frontier::new();
        let start_node = SearchNode::start(start);
        visited.insert(start_node);
        frontier.push(start_node);

        let mut expanded = 0;

        while let Some(current) = frontier.pop() {
            expanded += 1;

            for successor in self.map.neighbours(current.point) {
                if successor == target {
                    trace!(
                        "Sub-search {} -> {} reached the target after expanding {} nodes ({} \
                         left in the frontier)",
                        start,
                        target,
                        expanded,
                        frontier.len()
                    );
                    return Ok(Self::reconstruct(visited, current.point, target));
                }

                if visited.is_visited(successor) {
                    continue;
                }

                let movement_cost = cost::movement_cost(self.map, &current, successor, &self.weights);
                let node = SearchNode {
                    point: successor,
                    movement_cost,
                    total_cost: movement_cost
                        + cost::heuristic(self.map, successor, target, &self.weights),
                    predecessor: Some(current.point),
                };

                visited.insert(node);
                frontier.push(node);
            }
        }

        debug!(
            "Sub-search {} -> {} exhausted the frontier after expanding {} nodes",
            start, target, expanded
        );

        Err(NavError::Unreachable {
            start,
            target,
            expanded,
        })
    }

    /// Walk the predecessor chain back from `last` (the node which found the target) to the
    /// start, returning the path from the start to `target`.
    fn reconstruct(visited: &VisitedTable, last: GridPoint, target: GridPoint) -> Vec<GridPoint> {
        let mut path = vec![target];
        let mut cursor = Some(last);

        while let Some(point) = cursor {
            path.push(point);
            cursor = visited.get(point).and_then(|n| n.predecessor);
        }

        path.reverse();
        path
    }
}

// -----------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Check there are enough waypoints and that all of them are inside the map.
pub fn validate_waypoints(map: &TerrainMap, waypoints: &[GridPoint]) -> Result<(), NavError> {
    if waypoints.len() < 2 {
        return Err(NavError::TooFewWaypoints(waypoints.len()));
    }

    for (index, &point) in waypoints.iter().enumerate() {
        if !map.in_bounds(point) {
            return Err(NavError::WaypointOutsideMap {
                index,
                point,
                width: map.width(),
                height: map.height(),
            });
        }
    }

    Ok(())
}

/// Number of cells marked in the given path matrix.
pub fn count_marked(matrix: &PathMatrix) -> usize {
    matrix.iter().filter(|&&v| v != 0).count()
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
