//! # Sweep
//!
//! Runs the [`Router`] once for every combination of a set of candidate weights, so the effect of
//! each weight on the chosen trail can be compared. Each run can be persisted as its own
//! artifact, and all runs can be summed into a [`Heatmap`] showing which cells are chosen most
//! often.
//!
//! Combinations are independent of each other, so routing may be spread over a `rayon` thread
//! pool. Accumulation and persistence always happen on the calling thread in combination order,
//! so a parallel sweep produces exactly the same results as a sequential one.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::{fmt::Display, ops::Deref, path::Path};

use log::{debug, info, warn};
use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::map::{GridPoint, TerrainMap};

use super::{validate_waypoints, NavError, PathMatrix, Router, Weights, VISITED_MARKER};

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

/// Candidate values of each swept weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepParams {
    #[serde(rename = "gradeBases")]
    pub grade_bases: Vec<f64>,

    #[serde(rename = "movementCostXY")]
    pub movement_cost_xy: Vec<f64>,

    #[serde(rename = "movementCostZ")]
    pub movement_cost_z: Vec<f64>,

    #[serde(rename = "heuristicXY")]
    pub heuristic_xy: Vec<f64>,

    #[serde(rename = "heuristicZ")]
    pub heuristic_z: Vec<f64>,

    /// Grade radius used by every combination.
    #[serde(rename = "gradeRadius")]
    pub grade_radius: u32,
}

/// Switches controlling what a sweep produces.
#[derive(Debug, Clone, Copy, Default)]
pub struct SweepOptions {
    /// Sum every run into a heatmap.
    pub heatmap: bool,

    /// Hand every run to the persistence callback.
    pub artifacts: bool,

    /// Route combinations in parallel.
    pub parallel: bool,
}

/// Cell-wise sum of the [`PathMatrix`] of every run in a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap(Array2<i32>);

/// Outcome of a single combination in a sweep.
///
/// Kept flat so it can be written directly as a CSV row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepRecord {
    pub index: usize,
    pub grade_base: f64,
    pub grade_radius: u32,
    pub movement_cost_xy: f64,
    pub movement_cost_z: f64,
    pub heuristic_xy: f64,
    pub heuristic_z: f64,

    /// Whether a path was found.
    pub routed: bool,

    /// Number of cells on the path, `None` if routing failed.
    pub marked_cells: Option<usize>,

    /// Whether the run's artifact was persisted, `None` if persistence was not requested or
    /// routing failed.
    pub persisted: Option<bool>,

    /// Description of the failure, if any.
    pub error: Option<String>,
}

/// Result of a whole sweep.
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub records: Vec<SweepRecord>,

    /// Present only if the heatmap option was set.
    pub heatmap: Option<Heatmap>,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl Default for SweepParams {
    fn default() -> Self {
        Self {
            grade_bases: vec![0.0, 10.0, 100.0, 1000.0],
            movement_cost_xy: vec![0.0, 1.0, 10.0, 100.0],
            movement_cost_z: vec![0.0, 1.0, 10.0, 100.0],
            heuristic_xy: vec![0.0, 1.0, 10.0, 100.0],
            heuristic_z: vec![0.0, 1.0, 10.0, 100.0],
            grade_radius: 4,
        }
    }
}

impl SweepParams {
    /// Build the cross product of all candidate sets.
    ///
    /// The grade base varies slowest and the heuristic Z scale fastest. Every combination is
    /// validated.
    pub fn combinations(&self, units_per_pixel: f64) -> Result<Vec<Weights>, NavError> {
        let sets = [
            ("gradeBases", &self.grade_bases),
            ("movementCostXY", &self.movement_cost_xy),
            ("movementCostZ", &self.movement_cost_z),
            ("heuristicXY", &self.heuristic_xy),
            ("heuristicZ", &self.heuristic_z),
        ];
        for &(name, set) in sets.iter() {
            if set.is_empty() {
                return Err(NavError::EmptyCandidates(name));
            }
        }

        let mut combinations = Vec::with_capacity(self.num_combinations());

        for &grade_base in &self.grade_bases {
            for &movement_cost_xy in &self.movement_cost_xy {
                for &movement_cost_z in &self.movement_cost_z {
                    for &heuristic_xy in &self.heuristic_xy {
                        for &heuristic_z in &self.heuristic_z {
                            let weights = Weights {
                                units_per_pixel,
                                grade_base,
                                grade_radius: self.grade_radius,
                                movement_cost_xy,
                                movement_cost_z,
                                heuristic_xy,
                                heuristic_z,
                            };
                            weights.validate()?;
                            combinations.push(weights);
                        }
                    }
                }
            }
        }

        Ok(combinations)
    }

    pub fn num_combinations(&self) -> usize {
        self.grade_bases.len()
            * self.movement_cost_xy.len()
            * self.movement_cost_z.len()
            * self.heuristic_xy.len()
            * self.heuristic_z.len()
    }
}

impl Heatmap {
    pub fn new(dim: (usize, usize)) -> Self {
        Self(Array2::zeros(dim))
    }

    /// Add a run's path into the heatmap.
    pub fn add(&mut self, path: &PathMatrix) {
        self.0 += path;
    }

    /// Number of runs whose path passed through the point. The point must be inside the map.
    pub fn visit_count(&self, point: GridPoint) -> i32 {
        self.0[[point.y as usize, point.x as usize]] / VISITED_MARKER
    }
}

impl Deref for Heatmap {
    type Target = Array2<i32>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl SweepRecord {
    fn new(index: usize, weights: &Weights) -> Self {
        Self {
            index,
            grade_base: weights.grade_base,
            grade_radius: weights.grade_radius,
            movement_cost_xy: weights.movement_cost_xy,
            movement_cost_z: weights.movement_cost_z,
            heuristic_xy: weights.heuristic_xy,
            heuristic_z: weights.heuristic_z,
            routed: false,
            marked_cells: None,
            persisted: None,
            error: None,
        }
    }

    /// True if either routing or persistence failed.
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

impl SweepReport {
    pub fn num_failures(&self) -> usize {
        self.records.iter().filter(|r| r.failed()).count()
    }

    /// Write one CSV row per combination to the given path.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_path(path)?;

        for record in &self.records {
            writer.serialize(record)?;
        }

        writer.flush()?;

        Ok(())
    }
}

// -----------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Route the waypoints once for every set of weights in `combinations`.
///
/// If `options.artifacts` is set, `persist` is called with every successful run. Failures to
/// route or to persist a single combination are logged and recorded in the report, but do not
/// stop the sweep. An error is only returned if the waypoints themselves are invalid.
pub fn run<F, E>(
    map: &TerrainMap,
    waypoints: &[GridPoint],
    combinations: &[Weights],
    options: SweepOptions,
    mut persist: F,
) -> Result<SweepReport, NavError>
where
    F: FnMut(&Weights, &PathMatrix) -> Result<(), E>,
    E: Display,
{
    validate_waypoints(map, waypoints)?;

    info!(
        "Sweeping {} weight combinations{}",
        combinations.len(),
        if options.parallel { " in parallel" } else { "" }
    );

    let mut heatmap = if options.heatmap {
        Some(Heatmap::new(map.dim()))
    } else {
        None
    };
    let mut records = Vec::with_capacity(combinations.len());

    // Route in batches so that only one batch of path matrices is alive at a time
    let batch_size = if options.parallel {
        rayon::current_num_threads().max(1)
    } else {
        1
    };

    for (batch_idx, batch) in combinations.chunks(batch_size).enumerate() {
        let results: Vec<Result<PathMatrix, NavError>> = if options.parallel {
            batch
                .par_iter()
                .map(|w| route_one(map, waypoints, w))
                .collect()
        } else {
            batch.iter().map(|w| route_one(map, waypoints, w)).collect()
        };

        for (offset, (weights, result)) in batch.iter().zip(results).enumerate() {
            let index = batch_idx * batch_size + offset;
            let mut record = SweepRecord::new(index, weights);

            let path = match result {
                Ok(p) => p,
                Err(e) => {
                    warn!("Run {} ({}) failed: {}", index, weights.artifact_name(), e);
                    record.error = Some(e.to_string());
                    records.push(record);
                    continue;
                }
            };

            record.routed = true;
            record.marked_cells = Some(super::count_marked(&path));

            if let Some(ref mut h) = heatmap {
                h.add(&path);
            }

            if options.artifacts {
                match persist(weights, &path) {
                    Ok(()) => record.persisted = Some(true),
                    Err(e) => {
                        warn!(
                            "Couldn't persist run {} ({}): {}",
                            index,
                            weights.artifact_name(),
                            e
                        );
                        record.persisted = Some(false);
                        record.error = Some(e.to_string());
                    }
                }
            }

            debug!(
                "Run {} ({}) marked {:?} cells",
                index,
                weights.artifact_name(),
                record.marked_cells
            );

            records.push(record);
        }
    }

    let report = SweepReport { records, heatmap };

    info!(
        "Sweep complete, {} of {} runs failed",
        report.num_failures(),
        report.records.len()
    );

    Ok(report)
}

/// Name of the directory holding a sweep's artifacts, derived from the elevation raster and the
/// waypoints, e.g. `dem_10-20_30-40`.
pub fn dir_name<P: AsRef<Path>>(raster_path: P, waypoints: &[GridPoint]) -> String {
    let stem = raster_path
        .as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("sweep"));

    waypoints.iter().fold(stem, |mut name, p| {
        name.push_str(&format!("_{}-{}", p.x, p.y));
        name
    })
}

// -----------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// -----------------------------------------------------------------------------------------------

fn route_one(
    map: &TerrainMap,
    waypoints: &[GridPoint],
    weights: &Weights,
) -> Result<PathMatrix, NavError> {
    Router::new(map, *weights)?.route(waypoints)
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;

    fn terrain() -> TerrainMap {
        TerrainMap::generate_random((24, 16), (0.15, 0.15), (0.3, 0.7), 20.0).unwrap()
    }

    fn waypoints() -> Vec<GridPoint> {
        vec![
            GridPoint::new(1, 1),
            GridPoint::new(20, 4),
            GridPoint::new(10, 14),
        ]
    }

    fn single(weights: &Weights) -> SweepParams {
        SweepParams {
            grade_bases: vec![weights.grade_base],
            movement_cost_xy: vec![weights.movement_cost_xy],
            movement_cost_z: vec![weights.movement_cost_z],
            heuristic_xy: vec![weights.heuristic_xy],
            heuristic_z: vec![weights.heuristic_z],
            grade_radius: weights.grade_radius,
        }
    }

    fn no_persist(_: &Weights, _: &PathMatrix) -> Result<(), String> {
        Ok(())
    }

    #[test]
    fn test_combinations() -> Result<(), NavError> {
        let params = SweepParams::default();
        let combinations = params.combinations(2.0)?;

        assert_eq!(params.num_combinations(), 1024);
        assert_eq!(combinations.len(), 1024);

        // Ordering: grade base slowest, heuristic z fastest
        assert_eq!(combinations[0].grade_base, 0.0);
        assert_eq!(combinations[0].heuristic_z, 0.0);
        assert_eq!(combinations[1].heuristic_z, 1.0);
        assert_eq!(combinations[4].heuristic_xy, 1.0);
        assert_eq!(combinations[256].grade_base, 10.0);
        assert_eq!(combinations[1023].grade_base, 1000.0);

        assert!(combinations
            .iter()
            .all(|w| w.units_per_pixel == 2.0 && w.grade_radius == 4));

        let names: HashSet<String> = combinations.iter().map(|w| w.artifact_name()).collect();
        assert_eq!(names.len(), 1024);

        Ok(())
    }

    #[test]
    fn test_combination_errors() {
        let empty = SweepParams {
            movement_cost_z: vec![],
            ..Default::default()
        };
        assert_eq!(
            empty.combinations(1.0),
            Err(NavError::EmptyCandidates("movementCostZ"))
        );

        assert!(matches!(
            SweepParams::default().combinations(0.0),
            Err(NavError::InvalidWeight { .. })
        ));

        let negative = SweepParams {
            grade_bases: vec![10.0, -1.0],
            ..Default::default()
        };
        assert!(matches!(
            negative.combinations(1.0),
            Err(NavError::InvalidWeight {
                name: "grade.base",
                ..
            })
        ));
    }

    #[test]
    fn test_single_combination_heatmap() -> Result<(), NavError> {
        let map = terrain();
        let weights = Weights::default();
        let combinations = single(&weights).combinations(weights.units_per_pixel)?;
        assert_eq!(combinations, vec![weights]);

        let options = SweepOptions {
            heatmap: true,
            ..Default::default()
        };
        let report = run(&map, &waypoints(), &combinations, options, no_persist)?;

        let expected = Router::new(&map, weights)?.route(&waypoints())?;
        assert_eq!(report.num_failures(), 0);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].persisted, None);

        let heatmap = report.heatmap.expect("Heatmap was requested");
        assert_eq!(*heatmap, expected);

        Ok(())
    }

    #[test]
    fn test_heatmap_counts_runs() -> Result<(), NavError> {
        let map = terrain();
        let params = SweepParams {
            grade_bases: vec![1.0, 10.0],
            movement_cost_xy: vec![1.0],
            movement_cost_z: vec![0.0, 5.0],
            heuristic_xy: vec![1.0],
            heuristic_z: vec![1.0],
            grade_radius: 2,
        };
        let combinations = params.combinations(1.0)?;
        let options = SweepOptions {
            heatmap: true,
            artifacts: true,
            parallel: false,
        };

        let mut persisted = Vec::new();
        let report = run(&map, &waypoints(), &combinations, options, |w, path| {
            persisted.push((w.artifact_name(), path.clone()));
            Ok::<(), String>(())
        })?;
        let heatmap = report.heatmap.clone().expect("Heatmap was requested");

        // Every waypoint is on every path
        for &point in waypoints().iter() {
            assert_eq!(heatmap.visit_count(point), 4);
        }

        // The heatmap is the sum of the persisted runs
        let mut sum = Array2::<i32>::zeros(map.dim());
        for (_, path) in &persisted {
            sum += path;
        }
        assert_eq!(*heatmap, sum);
        assert_eq!(persisted.len(), 4);
        assert!(report.records.iter().all(|r| r.persisted == Some(true)));

        Ok(())
    }

    #[test]
    fn test_parallel_matches_sequential() -> Result<(), NavError> {
        let map = terrain();
        let params = SweepParams {
            grade_bases: vec![0.0, 10.0, 100.0],
            movement_cost_xy: vec![1.0, 10.0],
            movement_cost_z: vec![1.0],
            heuristic_xy: vec![0.0, 1.0],
            heuristic_z: vec![1.0],
            grade_radius: 4,
        };
        let combinations = params.combinations(1.0)?;

        let sequential = run(
            &map,
            &waypoints(),
            &combinations,
            SweepOptions {
                heatmap: true,
                artifacts: false,
                parallel: false,
            },
            no_persist,
        )?;
        let parallel = run(
            &map,
            &waypoints(),
            &combinations,
            SweepOptions {
                heatmap: true,
                artifacts: false,
                parallel: true,
            },
            no_persist,
        )?;

        assert_eq!(sequential.records, parallel.records);
        assert_eq!(sequential.heatmap, parallel.heatmap);
        assert_eq!(
            sequential.records.iter().map(|r| r.index).collect::<Vec<_>>(),
            (0..12).collect::<Vec<_>>()
        );

        Ok(())
    }

    #[test]
    fn test_persist_failures_do_not_stop_sweep() -> Result<(), NavError> {
        let map = terrain();
        let params = SweepParams {
            grade_bases: vec![10.0],
            movement_cost_xy: vec![1.0, 2.0, 3.0],
            movement_cost_z: vec![1.0],
            heuristic_xy: vec![1.0],
            heuristic_z: vec![1.0],
            grade_radius: 4,
        };
        let combinations = params.combinations(1.0)?;
        let options = SweepOptions {
            heatmap: true,
            artifacts: true,
            parallel: false,
        };

        let mut calls = 0;
        let report = run(&map, &waypoints(), &combinations, options, |w, _| {
            calls += 1;
            if w.movement_cost_xy == 2.0 {
                Err("disk full")
            } else {
                Ok(())
            }
        })?;

        assert_eq!(calls, 3);
        assert_eq!(report.num_failures(), 1);
        assert_eq!(report.records[1].persisted, Some(false));
        assert_eq!(report.records[1].error.as_deref(), Some("disk full"));
        assert!(report.records[1].marked_cells.is_some());
        assert!(!report.records[2].failed());

        // The failed write still contributes to the heatmap
        let heatmap = report.heatmap.expect("Heatmap was requested");
        assert_eq!(heatmap.visit_count(GridPoint::new(1, 1)), 3);

        Ok(())
    }

    #[test]
    fn test_invalid_waypoints() {
        let map = terrain();

        let result = run(
            &map,
            &[GridPoint::new(0, 0)],
            &[Weights::default()],
            SweepOptions::default(),
            no_persist,
        );

        assert!(matches!(result, Err(NavError::TooFewWaypoints(1))));
    }

    #[test]
    fn test_dir_name() {
        assert_eq!(
            dir_name("data/bh_FB17_3764.tif", &waypoints()),
            "bh_FB17_3764_1-1_20-4_10-14"
        );
        assert_eq!(dir_name("", &[GridPoint::new(3, 4)]), "sweep_3-4");
    }

    #[test]
    fn test_write_csv() {
        let report = SweepReport {
            records: vec![SweepRecord::new(0, &Weights::default())],
            heatmap: None,
        };
        let path = std::env::temp_dir()
            .join(format!("breadcrumbs_summary_{}.csv", std::process::id()));

        report.write_csv(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let mut lines = contents.lines();
        assert_eq!(
            lines.next(),
            Some(
                "index,grade_base,grade_radius,movement_cost_xy,movement_cost_z,heuristic_xy,\
                 heuristic_z,routed,marked_cells,persisted,error"
            )
        );
        assert_eq!(lines.next(), Some("0,10.0,4,1.0,1.0,1.0,1.0,false,,,"));
    }
}
