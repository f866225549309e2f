//! Weights applied to the cost functions during a search.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::NavError;

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

/// Weights of every term in the traversal cost.
///
/// The nested form found in parameter files is
/// [`WeightsParams`](crate::params::WeightsParams), which converts into this type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    /// Elevation units per grid cell, used to express elevation changes in cells.
    pub units_per_pixel: f64,

    /// Base of the exponential grade penalty.
    pub grade_base: f64,

    /// Number of steps sampled along the direction of travel when looking for the worst slope.
    pub grade_radius: u32,

    /// Scale of planar distance in the movement cost.
    pub movement_cost_xy: f64,

    /// Scale of elevation change in the movement cost.
    pub movement_cost_z: f64,

    /// Scale of planar distance in the heuristic.
    pub heuristic_xy: f64,

    /// Scale of elevation change in the heuristic.
    pub heuristic_z: f64,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl Weights {
    /// Check the weights can be used in a search.
    ///
    /// `units_per_pixel` must be finite and strictly positive and `grade_base` must not be
    /// negative. All other weights must be finite.
    pub fn validate(&self) -> Result<(), NavError> {
        let fields = [
            ("unitsPerPixel", self.units_per_pixel),
            ("grade.base", self.grade_base),
            ("movementCost.xy", self.movement_cost_xy),
            ("movementCost.z", self.movement_cost_z),
            ("heuristic.xy", self.heuristic_xy),
            ("heuristic.z", self.heuristic_z),
        ];

        for &(name, value) in fields.iter() {
            if !value.is_finite() {
                return Err(NavError::InvalidWeight {
                    name,
                    value,
                    reason: "must be finite",
                });
            }
        }

        if self.grade_base < 0.0 {
            return Err(NavError::InvalidWeight {
                name: "grade.base",
                value: self.grade_base,
                reason: "must not be negative",
            });
        }

        if self.units_per_pixel <= 0.0 {
            return Err(NavError::InvalidWeight {
                name: "unitsPerPixel",
                value: self.units_per_pixel,
                reason: "must be greater than zero",
            });
        }

        Ok(())
    }

    /// Name of the artifact produced by a run with these weights, without extension.
    pub fn artifact_name(&self) -> String {
        format!(
            "g{}_r{}_mxy{}_mz{}_hxy{}_hz{}",
            self.grade_base,
            self.grade_radius,
            self.movement_cost_xy,
            self.movement_cost_z,
            self.heuristic_xy,
            self.heuristic_z
        )
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            units_per_pixel: 1.0,
            grade_base: 10.0,
            grade_radius: 4,
            movement_cost_xy: 1.0,
            movement_cost_z: 1.0,
            heuristic_xy: 1.0,
            heuristic_z: 1.0,
        }
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
