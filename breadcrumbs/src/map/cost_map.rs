//! # Cost Map
//!
//! Extra traversal costs (vegetation density, wetness, ...) are supplied as separate rasters,
//! each with its own weight. Every layer is pre-scaled by its weight when it is loaded, and the
//! [`CostMap`] is then the cell-wise sum of all layers:
//!
//! ```text
//! cost[y][x] = Σ weight_i * layer_i[y][x]
//! ```
//!
//! When no layers are given the cost map is all zeros.

// ------------------------------------------------------------------------------------------------
// INCLUDES
// ------------------------------------------------------------------------------------------------

use std::ops::Deref;

use log::debug;
use ndarray::Array2;

use super::MapError;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single cost layer, already multiplied by its weight.
#[derive(Clone, Debug)]
pub struct CostLayer {
    /// Name of the layer, used in diagnostics only.
    pub name: String,

    /// Weighted cost of each cell.
    pub data: Array2<f32>,
}

/// Accumulated extra cost of every cell.
#[derive(Clone, Debug, PartialEq)]
pub struct CostMap(Array2<f32>);

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CostLayer {
    /// Build a layer from unweighted raw data, multiplying every cell by `weight`.
    pub fn weighted<S: Into<String>>(name: S, raw: Array2<f32>, weight: f64) -> Self {
        Self {
            name: name.into(),
            data: raw.mapv_into(|v| (v as f64 * weight) as f32),
        }
    }
}

impl CostMap {
    /// Sum all given layers into a single cost map of shape `dim` (rows, cols).
    pub fn accumulate(dim: (usize, usize), layers: &[CostLayer]) -> Result<Self, MapError> {
        let mut total = Array2::zeros(dim);

        for layer in layers {
            if layer.data.dim() != dim {
                return Err(MapError::ShapeMismatch(
                    format!("cost layer `{}`", layer.name),
                    dim,
                    layer.data.dim(),
                ));
            }

            total += &layer.data;

            debug!("Accumulated cost layer `{}`", layer.name);
        }

        Ok(Self(total))
    }

    /// Consume the map and return the underlying grid.
    pub fn into_inner(self) -> Array2<f32> {
        self.0
    }
}

impl Deref for CostMap {
    type Target = Array2<f32>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
