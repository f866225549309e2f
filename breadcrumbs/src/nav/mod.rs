//! # Navigation
//!
//! This module routes a trail across a [`TerrainMap`](crate::map::TerrainMap) through an ordered
//! list of waypoints.
//!
//! - [`Router`] runs one best-first search per consecutive pair of waypoints and stitches the
//!   recovered sub-paths into a single [`PathMatrix`].
//! - [`sweep`] runs the router over a cross product of [`Weights`], optionally accumulating a
//!   [`Heatmap`] of every path found.
//!
//! The traversal cost of each step blends planar distance, elevation change, a look-ahead grade
//! penalty and the map's extra cost layers, see [`cost`].

// ------------------------------------------------------------------------------------------------
// MODS
// ------------------------------------------------------------------------------------------------

pub mod cost;
mod node;
mod router;
pub mod sweep;
mod weights;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use node::SearchNode;
pub use router::{count_marked, validate_waypoints, PathMatrix, Router, VISITED_MARKER};
pub use sweep::{Heatmap, SweepOptions, SweepParams, SweepRecord, SweepReport};
pub use weights::Weights;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::map::GridPoint;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NavError {
    #[error("At least 2 waypoints are required, found {0}")]
    TooFewWaypoints(usize),

    #[error("Waypoint {index} at {point} is outside the {width}x{height} map")]
    WaypointOutsideMap {
        index: usize,
        point: GridPoint,
        width: usize,
        height: usize,
    },

    #[error("Invalid weight `{name}` = {value}: {reason}")]
    InvalidWeight {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("Sweep candidate set `{0}` is empty")]
    EmptyCandidates(&'static str),

    #[error("No path found from {start} to {target} after expanding {expanded} nodes")]
    Unreachable {
        start: GridPoint,
        target: GridPoint,
        expanded: usize,
    },
}
