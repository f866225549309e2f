//! # Map
//!
//! This module implements the [`TerrainMap`] and [`CostMap`] types. A [`TerrainMap`] couples the
//! elevation raster with the accumulated extra cost of every cell, and is the only view of the
//! terrain the router has. A [`CostMap`] is built by summing any number of weighted
//! [`CostLayer`]s (vegetation, wetness, ...) into a single grid.
//!
//! All grids are row-major `ndarray` arrays indexed as `[[y, x]]`, while all public APIs take
//! [`GridPoint`]s in `(x, y)` order.

// ------------------------------------------------------------------------------------------------
// MODS
// ------------------------------------------------------------------------------------------------

/// Implements the [`TerrainMap`] type
mod terrain_map;

/// Implements the [`CostMap`] accumulator
mod cost_map;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use cost_map::{CostLayer, CostMap};
pub use terrain_map::TerrainMap;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fmt;

use ndarray_stats::errors::MinMaxError;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An integer cell coordinate in a grid.
///
/// Coordinates are signed so that candidate cells just outside the grid (e.g. `x = -1`) can be
/// represented and rejected by a bounds check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: i64,
    pub y: i64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors that can arise from building or querying maps.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Map has no cells")]
    Empty,

    #[error(
        "Cannot process {0}, since this map is of shape {1:?} (rows, cols), but the target is of \
         shape {2:?}"
    )]
    ShapeMismatch(String, (usize, usize), (usize, usize)),

    #[error("Couldn't calculate min/max of map: {0}")]
    MinMaxError(MinMaxError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl GridPoint {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Returns the point offset by `(dx, dy)`.
    pub const fn offset(&self, dx: i64, dy: i64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<MinMaxError> for MapError {
    fn from(e: MinMaxError) -> Self {
        Self::MinMaxError(e)
    }
}
