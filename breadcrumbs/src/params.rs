//! Route parameter document
//!
//! A parameter file describes the waypoints, the weights of each cost term, any extra cost
//! layers and optionally the candidate sets used by a sweep. It is loaded with
//! [`util::params::load`], so either JSON or TOML can be used:
//!
//! ```json
//! {
//!     "points": [{"x": 10, "y": 20}, {"x": 150, "y": 80}],
//!     "weights": {
//!         "unitsPerPixel": 1.0,
//!         "grade": {"base": 10.0, "radius": 4},
//!         "movementCost": {"xy": 1.0, "z": 1.0},
//!         "heuristic": {"xy": 1.0, "z": 1.0}
//!     },
//!     "layers": [{"filename": "vegetation.tif", "weight": 0.5}]
//! }
//! ```

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{
    map::GridPoint,
    nav::{NavError, SweepParams, Weights},
};

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Grade radius used when a parameter file doesn't give one.
pub const DEFAULT_GRADE_RADIUS: u32 = 4;

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

/// The full contents of a parameter file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteParams {
    /// Waypoints to visit, in order.
    pub points: Vec<GridPoint>,

    pub weights: WeightsParams,

    /// Extra cost layers summed into the map's cost grid.
    #[serde(default)]
    pub layers: Vec<LayerParams>,

    /// Candidate weights for a sweep.
    #[serde(default)]
    pub sweep: SweepParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightsParams {
    /// Elevation units per grid cell.
    pub units_per_pixel: f64,

    pub grade: GradeParams,

    pub movement_cost: ScaleParams,

    pub heuristic: ScaleParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeParams {
    pub base: f64,

    #[serde(default = "default_grade_radius")]
    pub radius: u32,
}

/// Planar and vertical scale of a distance term.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleParams {
    pub xy: f64,
    pub z: f64,
}

/// An extra cost layer raster and the weight it is multiplied by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerParams {
    /// Path to the raster. Relative paths are relative to the parameter file.
    pub filename: PathBuf,

    pub weight: f64,
}

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamsError {
    #[error("Invalid route parameters: {0}")]
    Nav(#[from] NavError),

    #[error("Weight of layer {index} ({filename:?}) must be finite, found {weight}")]
    InvalidLayerWeight {
        index: usize,
        filename: PathBuf,
        weight: f64,
    },
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl RouteParams {
    /// Check the number of waypoints, the weights and the layer weights.
    ///
    /// Sweep candidates are only checked by [`SweepParams::combinations`] when a sweep is run, so
    /// a bad `sweep` section doesn't stop a single routing pass.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.points.len() < 2 {
            return Err(NavError::TooFewWaypoints(self.points.len()).into());
        }

        self.weights().validate()?;

        for (index, layer) in self.layers.iter().enumerate() {
            if !layer.weight.is_finite() {
                return Err(ParamsError::InvalidLayerWeight {
                    index,
                    filename: layer.filename.clone(),
                    weight: layer.weight,
                });
            }
        }

        Ok(())
    }

    /// The flattened weights for a single routing pass.
    pub fn weights(&self) -> Weights {
        Weights::from(&self.weights)
    }
}

impl From<&WeightsParams> for Weights {
    fn from(params: &WeightsParams) -> Self {
        Self {
            units_per_pixel: params.units_per_pixel,
            grade_base: params.grade.base,
            grade_radius: params.grade.radius,
            movement_cost_xy: params.movement_cost.xy,
            movement_cost_z: params.movement_cost.z,
            heuristic_xy: params.heuristic.xy,
            heuristic_z: params.heuristic.z,
        }
    }
}

// -----------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// -----------------------------------------------------------------------------------------------

fn default_grade_radius() -> u32 {
    DEFAULT_GRADE_RADIUS
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const EXAMPLE: &str = r#"{
        "points": [{"x": 10, "y": 20}, {"x": 150, "y": 80}, {"x": 3, "y": 4}],
        "weights": {
            "unitsPerPixel": 2.5,
            "grade": {"base": 100.0, "radius": 6},
            "movementCost": {"xy": 1.0, "z": 10.0},
            "heuristic": {"xy": 0.5, "z": 0.0}
        },
        "layers": [{"filename": "vegetation.tif", "weight": 0.5}],
        "sweep": {"gradeBases": [1.0, 2.0], "heuristicZ": [3.0]}
    }"#;

    #[test]
    fn test_parse() {
        let params: RouteParams = serde_json::from_str(EXAMPLE).unwrap();

        assert_eq!(params.points.len(), 3);
        assert_eq!(params.points[1], GridPoint::new(150, 80));
        assert_eq!(
            params.weights(),
            Weights {
                units_per_pixel: 2.5,
                grade_base: 100.0,
                grade_radius: 6,
                movement_cost_xy: 1.0,
                movement_cost_z: 10.0,
                heuristic_xy: 0.5,
                heuristic_z: 0.0,
            }
        );
        assert_eq!(
            params.layers,
            vec![LayerParams {
                filename: PathBuf::from("vegetation.tif"),
                weight: 0.5
            }]
        );

        // Unspecified sweep candidates fall back to the defaults
        let defaults = SweepParams::default();
        assert_eq!(params.sweep.grade_bases, vec![1.0, 2.0]);
        assert_eq!(params.sweep.heuristic_z, vec![3.0]);
        assert_eq!(params.sweep.movement_cost_xy, defaults.movement_cost_xy);
        assert_eq!(params.sweep.grade_radius, defaults.grade_radius);

        assert_eq!(params.validate(), Ok(()));
    }

    #[test]
    fn test_optional_sections() {
        let params: RouteParams = serde_json::from_str(
            r#"{
                "points": [{"x": 0, "y": 0}, {"x": 1, "y": 1}],
                "weights": {
                    "unitsPerPixel": 1.0,
                    "grade": {"base": 10.0},
                    "movementCost": {"xy": 1.0, "z": 1.0},
                    "heuristic": {"xy": 1.0, "z": 1.0}
                }
            }"#,
        )
        .unwrap();

        assert!(params.layers.is_empty());
        assert_eq!(params.sweep, SweepParams::default());
        assert_eq!(params.weights.grade.radius, DEFAULT_GRADE_RADIUS);
    }

    #[test]
    fn test_parse_toml() {
        let params: RouteParams = toml::from_str(
            r#"
            points = [{ x = 5, y = 6 }, { x = 7, y = 8 }]

            [weights]
            unitsPerPixel = 1.0
            grade = { base = 10.0, radius = 2 }
            movementCost = { xy = 1.0, z = 1.0 }
            heuristic = { xy = 1.0, z = 1.0 }
            "#,
        )
        .unwrap();

        assert_eq!(params.points, vec![GridPoint::new(5, 6), GridPoint::new(7, 8)]);
        assert_eq!(params.weights().grade_radius, 2);
    }

    #[test]
    fn test_validate() {
        let mut params: RouteParams = serde_json::from_str(EXAMPLE).unwrap();

        params.weights.units_per_pixel = 0.0;
        assert!(matches!(
            params.validate(),
            Err(ParamsError::Nav(NavError::InvalidWeight {
                name: "unitsPerPixel",
                ..
            }))
        ));

        params.weights.units_per_pixel = 1.0;
        params.layers[0].weight = f64::INFINITY;
        assert!(matches!(
            params.validate(),
            Err(ParamsError::InvalidLayerWeight { index: 0, .. })
        ));

        params.layers.clear();

        // Sweep candidates don't affect a single routing pass
        params.sweep.grade_bases.clear();
        assert_eq!(params.validate(), Ok(()));
        assert_eq!(
            params.sweep.combinations(1.0),
            Err(NavError::EmptyCandidates("gradeBases"))
        );

        params.points.truncate(1);
        assert_eq!(
            params.validate(),
            Err(ParamsError::Nav(NavError::TooFewWaypoints(1)))
        );
    }
}
