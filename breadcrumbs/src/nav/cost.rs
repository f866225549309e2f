//! Cost functions used by the [`Router`](super::Router).
//!
//! The cost of moving from `current` to a neighbouring `successor` is:
//!
//! ```text
//! movement = distance(current, successor, dz, mxy, mxy, mz)
//!          + grade_cost(current, successor)
//!          + current.movement_cost
//!          + extra_cost(successor)
//! ```
//!
//! and the estimate of the remaining cost from `successor` to the target is
//! `distance(successor, target, dz, hxy, hxy, hz)`, where `dz` is the elevation change expressed
//! in cells.
//!
//! The heuristic includes the elevation difference to the target and can overestimate the true
//! remaining cost, so the search is best-first rather than a provably optimal A*.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use crate::map::{GridPoint, TerrainMap};

use super::{SearchNode, Weights};

// -----------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Scaled euclidean distance between `a` and `b`, with `height` as the vertical separation.
pub fn distance(
    a: GridPoint,
    b: GridPoint,
    height: f64,
    x_scale: f64,
    y_scale: f64,
    z_scale: f64,
) -> f64 {
    let x = (b.x - a.x) as f64 * x_scale;
    let y = (b.y - a.y) as f64 * y_scale;
    let z = height * z_scale;

    (x * x + y * y + z * z).sqrt()
}

/// Unscaled distance between `a` and `b` in the grid plane.
pub fn planar_distance(a: GridPoint, b: GridPoint) -> f64 {
    distance(a, b, 0.0, 1.0, 1.0, 1.0)
}

/// Exponential penalty for the steepest slope ahead in the direction of travel.
///
/// Starting at `current`, the step `successor - current` is taken `grade_radius` times. For each
/// step whose both ends lie inside the map the scaled height change is sampled, and the largest
/// one is kept as `worst`. The penalty is then `grade_base ^ (worst / |successor - current|)`.
///
/// On flat ground this is always exactly `1`.
pub fn grade_cost(
    map: &TerrainMap,
    current: GridPoint,
    successor: GridPoint,
    weights: &Weights,
) -> f64 {
    let dx = successor.x - current.x;
    let dy = successor.y - current.y;

    let step_length = planar_distance(current, successor);
    if step_length == 0.0 {
        return 1.0;
    }

    let mut worst_height = 0f64;
    let mut sample = current;

    for _ in 0..weights.grade_radius {
        let next = sample.offset(dx, dy);

        if map.in_bounds(sample) && map.in_bounds(next) {
            worst_height = worst_height.max(map.scaled_height(sample, next, weights.units_per_pixel));
        }

        sample = next;
    }

    weights.grade_base.powf(worst_height / step_length)
}

/// Total movement cost of reaching `successor` from the `current` node.
pub fn movement_cost(
    map: &TerrainMap,
    current: &SearchNode,
    successor: GridPoint,
    weights: &Weights,
) -> f64 {
    let height = map.scaled_height(current.point, successor, weights.units_per_pixel);

    distance(
        current.point,
        successor,
        height,
        weights.movement_cost_xy,
        weights.movement_cost_xy,
        weights.movement_cost_z,
    ) + grade_cost(map, current.point, successor, weights)
        + current.movement_cost
        + map.extra_cost(successor)
}

/// Estimated cost of travelling from `successor` to `target`.
pub fn heuristic(
    map: &TerrainMap,
    successor: GridPoint,
    target: GridPoint,
    weights: &Weights,
) -> f64 {
    let height = map.scaled_height(successor, target, weights.units_per_pixel);

    distance(
        successor,
        target,
        height,
        weights.heuristic_xy,
        weights.heuristic_xy,
        weights.heuristic_z,
    )
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
